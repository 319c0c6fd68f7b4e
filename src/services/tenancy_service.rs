// src/services/tenancy_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RbacRepository, TenantRepository, UserRepository},
    models::tenancy::{CreateTenantPayload, Tenant, TenantMember, UpdateTenantPayload},
    services::rbac_service::PermissionService,
};

// Cargo criado junto com a loja, com todas as permissões.
const OWNER_ROLE_NAME: &str = "Owner";

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    rbac_repo: RbacRepository,
    user_repo: UserRepository,
    permissions: PermissionService,
    pool: PgPool,
}

impl TenantService {
    pub fn new(
        tenant_repo: TenantRepository,
        rbac_repo: RbacRepository,
        user_repo: UserRepository,
        permissions: PermissionService,
        pool: PgPool,
    ) -> Self {
        Self { tenant_repo, rbac_repo, user_repo, permissions, pool }
    }

    /// Cria a loja, o cargo de dono e vincula o criador, tudo na mesma transação.
    pub async fn create_tenant(&self, owner_id: Uuid, payload: &CreateTenantPayload) -> Result<Tenant, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Loja
        let tenant = self
            .tenant_repo
            .create_tenant(&mut *tx, payload.name.trim(), payload.slug.trim(), payload.description.as_deref())
            .await?;

        // 2. Cargo "Owner" com todas as permissões do sistema
        let owner_role = self
            .rbac_repo
            .create_role(&mut *tx, tenant.id, OWNER_ROLE_NAME, Some("Acesso total à loja"))
            .await?;
        let all_permissions = self.rbac_repo.list_all_permissions(&mut *tx).await?;
        let permission_ids: Vec<Uuid> = all_permissions.iter().map(|p| p.id).collect();
        self.rbac_repo
            .assign_permissions(&mut *tx, owner_role.id, &permission_ids)
            .await?;

        // 3. Criador vira membro com o cargo de dono
        self.tenant_repo
            .add_member_to_tenant(&mut *tx, tenant.id, owner_id, owner_role.id)
            .await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant.id, %owner_id, "🏪 Nova loja criada");
        Ok(tenant)
    }

    pub async fn get_tenant(&self, tenant_id: Uuid) -> Result<Tenant, AppError> {
        self.tenant_repo
            .find_by_id(tenant_id)
            .await?
            .ok_or(AppError::NotFound("Loja"))
    }

    pub async fn update_tenant(&self, tenant_id: Uuid, payload: &UpdateTenantPayload) -> Result<Tenant, AppError> {
        self.tenant_repo.update_tenant(tenant_id, payload).await
    }

    pub async fn list_members(&self, tenant_id: Uuid) -> Result<Vec<TenantMember>, AppError> {
        self.tenant_repo.list_members(tenant_id).await
    }

    pub async fn add_member(&self, tenant_id: Uuid, email: &str, role_id: Uuid) -> Result<Vec<TenantMember>, AppError> {
        self.ensure_role_in_tenant(tenant_id, role_id).await?;

        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        self.tenant_repo
            .add_member_to_tenant(&self.pool, tenant_id, user.id, role_id)
            .await?;
        self.permissions.invalidate(user.id, tenant_id).await;

        tracing::info!(%tenant_id, user_id = %user.id, "Membro adicionado");
        self.tenant_repo.list_members(tenant_id).await
    }

    pub async fn change_member_role(&self, tenant_id: Uuid, user_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        self.ensure_role_in_tenant(tenant_id, role_id).await?;
        self.tenant_repo.change_member_role(tenant_id, user_id, role_id).await?;
        self.permissions.invalidate(user_id, tenant_id).await;
        Ok(())
    }

    pub async fn remove_member(&self, tenant_id: Uuid, acting_user: Uuid, user_id: Uuid) -> Result<(), AppError> {
        if acting_user == user_id {
            return Err(AppError::BadRequest("Você não pode remover a si mesmo da loja.".into()));
        }
        self.tenant_repo.remove_member(tenant_id, user_id).await?;
        self.permissions.invalidate(user_id, tenant_id).await;
        Ok(())
    }

    // Cargo de outra loja é tratado como inexistente.
    async fn ensure_role_in_tenant(&self, tenant_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        self.rbac_repo
            .find_role(tenant_id, role_id)
            .await?
            .map(|_| ())
            .ok_or(AppError::NotFound("Cargo"))
    }
}
