// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{common::error::AppError, middleware::tenancy::TenantPermissions};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião). Depende do `tenant_guard` ter rodado antes.
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let permissions = parts
            .extensions
            .get::<TenantPermissions>()
            .ok_or_else(|| AppError::Forbidden("Contexto da loja não encontrado.".into()))?;

        let required_perm = T::slug();
        if !permissions.allows(required_perm) {
            return Err(AppError::Forbidden(format!(
                "Você precisa da permissão '{}' para realizar esta ação.",
                required_perm
            )));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermTenantWrite;
impl PermissionDef for PermTenantWrite {
    fn slug() -> &'static str { "tenant:write" }
}

pub struct PermMemberRead;
impl PermissionDef for PermMemberRead {
    fn slug() -> &'static str { "member:read" }
}

pub struct PermMemberWrite;
impl PermissionDef for PermMemberWrite {
    fn slug() -> &'static str { "member:write" }
}

pub struct PermRoleRead;
impl PermissionDef for PermRoleRead {
    fn slug() -> &'static str { "role:read" }
}

pub struct PermRoleWrite;
impl PermissionDef for PermRoleWrite {
    fn slug() -> &'static str { "role:write" }
}

pub struct PermProductWrite;
impl PermissionDef for PermProductWrite {
    fn slug() -> &'static str { "product:write" }
}

pub struct PermCategoryWrite;
impl PermissionDef for PermCategoryWrite {
    fn slug() -> &'static str { "category:write" }
}

pub struct PermCouponRead;
impl PermissionDef for PermCouponRead {
    fn slug() -> &'static str { "coupon:read" }
}

pub struct PermCouponWrite;
impl PermissionDef for PermCouponWrite {
    fn slug() -> &'static str { "coupon:write" }
}

pub struct PermBannerRead;
impl PermissionDef for PermBannerRead {
    fn slug() -> &'static str { "banner:read" }
}

pub struct PermBannerWrite;
impl PermissionDef for PermBannerWrite {
    fn slug() -> &'static str { "banner:write" }
}

pub struct PermOrderRead;
impl PermissionDef for PermOrderRead {
    fn slug() -> &'static str { "order:read" }
}

pub struct PermOrderWrite;
impl PermissionDef for PermOrderWrite {
    fn slug() -> &'static str { "order:write" }
}

pub struct PermStaffWrite;
impl PermissionDef for PermStaffWrite {
    fn slug() -> &'static str { "staff:write" }
}

pub struct PermServiceWrite;
impl PermissionDef for PermServiceWrite {
    fn slug() -> &'static str { "service:write" }
}

pub struct PermAppointmentRead;
impl PermissionDef for PermAppointmentRead {
    fn slug() -> &'static str { "appointment:read" }
}

pub struct PermAppointmentWrite;
impl PermissionDef for PermAppointmentWrite {
    fn slug() -> &'static str { "appointment:write" }
}

pub struct PermWhatsAppRead;
impl PermissionDef for PermWhatsAppRead {
    fn slug() -> &'static str { "whatsapp:read" }
}

pub struct PermWhatsAppWrite;
impl PermissionDef for PermWhatsAppWrite {
    fn slug() -> &'static str { "whatsapp:write" }
}

pub struct PermNotificationSend;
impl PermissionDef for PermNotificationSend {
    fn slug() -> &'static str { "notification:send" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn check<T: PermissionDef>(perms: Option<TenantPermissions>) -> Result<(), AppError> {
        let (mut parts, _) = Request::new(()).into_parts();
        if let Some(p) = perms {
            parts.extensions.insert(p);
        }
        RequirePermission::<T>::from_request_parts(&mut parts, &()).await.map(|_| ())
    }

    #[tokio::test]
    async fn granted_permission_passes() {
        let perms = TenantPermissions::new(["order:write".to_string()]);
        assert!(check::<PermOrderWrite>(Some(perms)).await.is_ok());
    }

    #[tokio::test]
    async fn missing_permission_names_the_slug() {
        let perms = TenantPermissions::new(["order:read".to_string()]);
        let err = check::<PermOrderWrite>(Some(perms)).await.unwrap_err();
        assert!(matches!(&err, AppError::Forbidden(msg) if msg.contains("order:write")));
    }

    #[tokio::test]
    async fn without_tenant_context_is_forbidden() {
        assert!(matches!(check::<PermCouponRead>(None).await, Err(AppError::Forbidden(_))));
    }
}
