// src/services/rbac_service.rs

use std::{collections::HashSet, sync::Arc};

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::foreign_key_violation, error::AppError},
    db::RbacRepository,
    models::rbac::{CreateRolePayload, Permission, Role, RoleResponse, UpdateRolePayload},
    services::permission_cache::PermissionCache,
};

/// Permissão "coringa" do SUPER_ADMIN.
pub const WILDCARD_PERMISSION: &str = "*";

// ---
// Permissões efetivas (cache + banco)
// ---

#[derive(Clone)]
pub struct PermissionService {
    repo: RbacRepository,
    cache: Arc<dyn PermissionCache>,
}

impl PermissionService {
    pub fn new(repo: RbacRepository, cache: Arc<dyn PermissionCache>) -> Self {
        Self { repo, cache }
    }

    /// Slugs do usuário na loja. `None` = não é membro ativo.
    /// Falha do cache nunca bloqueia a requisição: cai para o banco.
    pub async fn permissions_for(&self, user_id: Uuid, tenant_id: Uuid) -> Result<Option<Vec<String>>, AppError> {
        match self.cache.get(user_id, tenant_id).await {
            Ok(Some(cached)) => return Ok(Some(cached)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Cache de permissões indisponível"),
        }

        let permissions = self.repo.permissions_for_member(user_id, tenant_id).await?;

        if let Some(perms) = &permissions {
            if let Err(e) = self.cache.set(user_id, tenant_id, perms).await {
                tracing::warn!(error = %e, "Falha ao gravar permissões no cache");
            }
        }
        Ok(permissions)
    }

    pub async fn invalidate(&self, user_id: Uuid, tenant_id: Uuid) {
        if let Err(e) = self.cache.invalidate(user_id, tenant_id).await {
            tracing::warn!(%user_id, %tenant_id, error = %e, "Falha ao invalidar permissões em cache");
        }
    }

    pub async fn invalidate_many(&self, user_ids: &[Uuid], tenant_id: Uuid) {
        for user_id in user_ids {
            self.invalidate(*user_id, tenant_id).await;
        }
    }
}

// ---
// Cargos
// ---

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    permissions: PermissionService,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, permissions: PermissionService, pool: PgPool) -> Self {
        Self { repo, permissions, pool }
    }

    pub async fn create_role_with_permissions(
        &self,
        tenant_id: Uuid,
        payload: &CreateRolePayload,
    ) -> Result<RoleResponse, AppError> {
        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o Cargo
        let role = self
            .repo
            .create_role(&mut *tx, tenant_id, payload.name.trim(), payload.description.as_deref())
            .await?;

        // 3. Resolve Slugs ("order:read") para IDs, recusando slugs desconhecidos
        let permissions = self.repo.find_permissions_by_slugs(&mut *tx, &payload.permissions).await?;
        ensure_all_known(&payload.permissions, &permissions)?;

        // 4. Salva o Vínculo
        let permission_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
        if !permission_ids.is_empty() {
            self.repo.assign_permissions(&mut *tx, role.id, &permission_ids).await?;
        }

        // 5. Commit
        tx.commit().await?;

        tracing::info!(%tenant_id, role_id = %role.id, "🛡️ Cargo criado");
        Ok(RoleResponse { role, permissions: sorted_slugs(permissions) })
    }

    pub async fn list_roles(&self, tenant_id: Uuid) -> Result<Vec<Role>, AppError> {
        self.repo.list_roles(tenant_id).await
    }

    pub async fn get_role(&self, tenant_id: Uuid, role_id: Uuid) -> Result<RoleResponse, AppError> {
        let role = self
            .repo
            .find_role(tenant_id, role_id)
            .await?
            .ok_or(AppError::NotFound("Cargo"))?;
        let permissions = self.repo.permission_slugs_for_role(role.id).await?;
        Ok(RoleResponse { role, permissions })
    }

    pub async fn update_role(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        payload: &UpdateRolePayload,
    ) -> Result<RoleResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let role = self
            .repo
            .update_role(
                &mut *tx,
                tenant_id,
                role_id,
                payload.name.as_deref().map(str::trim),
                payload.description.as_deref(),
            )
            .await?;

        if let Some(slugs) = &payload.permissions {
            let permissions = self.repo.find_permissions_by_slugs(&mut *tx, slugs).await?;
            ensure_all_known(slugs, &permissions)?;

            let permission_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
            self.repo.clear_permissions(&mut *tx, role.id).await?;
            if !permission_ids.is_empty() {
                self.repo.assign_permissions(&mut *tx, role.id, &permission_ids).await?;
            }
        }

        tx.commit().await?;

        // Quem tem esse cargo precisa recarregar as permissões.
        let holders = self.repo.users_with_role(tenant_id, role.id).await?;
        self.permissions.invalidate_many(&holders, tenant_id).await;

        let permissions = self.repo.permission_slugs_for_role(role.id).await?;
        Ok(RoleResponse { role, permissions })
    }

    pub async fn delete_role(&self, tenant_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        let holders = self.repo.users_with_role(tenant_id, role_id).await?;
        if !holders.is_empty() {
            return Err(AppError::Conflict(format!(
                "O cargo está atribuído a {} membro(s); troque o cargo deles antes de excluir.",
                holders.len()
            )));
        }

        let deleted = self
            .repo
            .delete_role(self.repo.pool(), tenant_id, role_id)
            .await
            .map_err(|e| match e {
                // Corrida: alguém recebeu o cargo entre a checagem e o DELETE.
                AppError::DatabaseError(db) => foreign_key_violation(db, || {
                    AppError::Conflict("O cargo ainda está em uso.".into())
                }),
                other => other,
            })?;

        if deleted == 0 {
            return Err(AppError::NotFound("Cargo"));
        }
        tracing::info!(%tenant_id, %role_id, "Cargo excluído");
        Ok(())
    }

    pub async fn list_system_permissions(&self) -> Result<Vec<Permission>, AppError> {
        self.repo.list_all_permissions(self.repo.pool()).await
    }
}

fn ensure_all_known(requested: &[String], found: &[Permission]) -> Result<(), AppError> {
    let known: HashSet<&str> = found.iter().map(|p| p.slug.as_str()).collect();
    let unknown: Vec<&str> = requested
        .iter()
        .map(String::as_str)
        .filter(|slug| !known.contains(slug))
        .collect();

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Permissões desconhecidas: {}", unknown.join(", "))))
    }
}

fn sorted_slugs(permissions: Vec<Permission>) -> Vec<String> {
    let mut slugs: Vec<String> = permissions.into_iter().map(|p| p.slug).collect();
    slugs.sort();
    slugs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::permission_cache::InMemoryPermissionCache;
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;

    fn permission(slug: &str) -> Permission {
        Permission {
            id: Uuid::new_v4(),
            slug: slug.into(),
            description: String::new(),
            module: "TEST".into(),
        }
    }

    #[test]
    fn unknown_slugs_are_reported() {
        let found = vec![permission("order:read")];
        let err = ensure_all_known(&["order:read".into(), "rocket:launch".into()], &found).unwrap_err();
        assert!(err.to_string().contains("rocket:launch"));
        assert!(ensure_all_known(&["order:read".into()], &found).is_ok());
    }

    #[tokio::test]
    async fn invalidate_many_clears_every_listed_user() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let cache = Arc::new(InMemoryPermissionCache::new(Duration::from_secs(60)));
        let service = PermissionService::new(RbacRepository::new(pool), cache.clone());

        let tenant = Uuid::new_v4();
        let (a, b, untouched) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        for user in [a, b, untouched] {
            cache.set(user, tenant, &["order:read".into()]).await.unwrap();
        }

        service.invalidate_many(&[a, b], tenant).await;

        assert_eq!(cache.get(a, tenant).await.unwrap(), None);
        assert_eq!(cache.get(b, tenant).await.unwrap(), None);
        assert!(cache.get(untouched, tenant).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn cached_permissions_skip_the_database() {
        // O pool nunca conecta: se o serviço fosse ao banco, o teste falharia.
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(50))
            .connect_lazy("postgres://localhost:1/unused")
            .unwrap();
        let cache = Arc::new(InMemoryPermissionCache::new(Duration::from_secs(60)));
        let service = PermissionService::new(RbacRepository::new(pool), cache.clone());

        let (user, tenant) = (Uuid::new_v4(), Uuid::new_v4());
        cache.set(user, tenant, &["coupon:read".into()]).await.unwrap();

        let perms = service.permissions_for(user, tenant).await.unwrap();
        assert_eq!(perms, Some(vec!["coupon:read".to_string()]));
    }
}
