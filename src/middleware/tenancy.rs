// src/middleware/tenancy.rs

use std::collections::HashSet;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::authenticate,
    services::rbac_service::WILDCARD_PERMISSION,
};

// O nome do nosso cabeçalho HTTP customizado
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

// A loja que o usuário quer acessar (cabeçalho X-Tenant-ID).
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

// Permissões efetivas do usuário na loja da requisição.
#[derive(Debug, Clone)]
pub struct TenantPermissions(HashSet<String>);

impl TenantPermissions {
    pub fn new(slugs: impl IntoIterator<Item = String>) -> Self {
        Self(slugs.into_iter().collect())
    }

    pub fn wildcard() -> Self {
        Self::new([WILDCARD_PERMISSION.to_string()])
    }

    pub fn allows(&self, slug: &str) -> bool {
        self.0.contains(WILDCARD_PERMISSION) || self.0.contains(slug)
    }
}

pub fn tenant_from_headers(headers: &HeaderMap) -> Result<Uuid, AppError> {
    headers
        .get(TENANT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or(AppError::TenantRequired)
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<TenantContext>() {
            return Ok(*ctx);
        }
        tenant_from_headers(&parts.headers).map(TenantContext)
    }
}

/// Painel da loja: token + cabeçalho + ser membro ativo. As permissões
/// vêm do cache (ou do banco) e ficam nas extensions para o `RequirePermission`.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&app_state, request.headers())?;
    let tenant_id = tenant_from_headers(request.headers())?;

    let permissions = if user.is_super_admin() {
        TenantPermissions::wildcard()
    } else {
        let slugs = app_state
            .permission_service
            .permissions_for(user.id, tenant_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("Você não tem acesso a esta loja.".into()))?;
        TenantPermissions::new(slugs)
    };

    let extensions = request.extensions_mut();
    extensions.insert(user);
    extensions.insert(TenantContext(tenant_id));
    extensions.insert(permissions);

    Ok(next.run(request).await)
}

/// Vitrine autenticada (carrinho, pedidos, agendamentos do cliente):
/// qualquer usuário logado numa loja existente e ativa.
pub async fn store_guard(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&app_state, request.headers())?;
    let tenant_id = tenant_from_headers(request.headers())?;

    let tenant = app_state.tenant_service.get_tenant(tenant_id).await?;
    if !tenant.is_active {
        return Err(AppError::NotFound("Loja"));
    }

    let extensions = request.extensions_mut();
    extensions.insert(user);
    extensions.insert(TenantContext(tenant_id));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_allows_everything() {
        let perms = TenantPermissions::wildcard();
        assert!(perms.allows("order:write"));
        assert!(perms.allows("qualquer:coisa"));
    }

    #[test]
    fn explicit_permissions_only() {
        let perms = TenantPermissions::new(["order:read".to_string()]);
        assert!(perms.allows("order:read"));
        assert!(!perms.allows("order:write"));
    }

    #[test]
    fn tenant_header_must_be_a_uuid() {
        let mut headers = HeaderMap::new();
        assert!(matches!(tenant_from_headers(&headers), Err(AppError::TenantRequired)));

        headers.insert(TENANT_ID_HEADER, "loja-1".parse().unwrap());
        assert!(matches!(tenant_from_headers(&headers), Err(AppError::TenantRequired)));

        let id = Uuid::new_v4();
        headers.insert(TENANT_ID_HEADER, id.to_string().parse().unwrap());
        assert_eq!(tenant_from_headers(&headers).unwrap(), id);
    }
}
