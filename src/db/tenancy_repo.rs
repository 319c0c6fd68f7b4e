// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{ensure_affected, unique_violation},
        error::AppError,
    },
    models::tenancy::{Tenant, TenantMember, UpdateTenantPayload, UserTenant},
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cria um novo tenant (Loja) na base de dados.
    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, slug, description)
            VALUES ($1, lower($2), $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| unique_violation(e, || AppError::Conflict(format!("O slug '{}' já está em uso.", slug))))
    }

    pub async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    pub async fn update_tenant(
        &self,
        tenant_id: Uuid,
        input: &UpdateTenantPayload,
    ) -> Result<Tenant, AppError> {
        sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(input.name.as_deref())
        .bind(input.description.as_deref())
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Loja"))
    }

    /// Lojas das quais o usuário é membro ativo, com o nome do cargo.
    pub async fn get_tenants_for_user(&self, user_id: Uuid) -> Result<Vec<UserTenant>, AppError> {
        let tenants = sqlx::query_as::<_, UserTenant>(
            r#"
            SELECT t.id AS tenant_id, t.name, t.slug, r.id AS role_id, r.name AS role_name
            FROM tenant_members tm
            JOIN tenants t ON t.id = tm.tenant_id
            JOIN roles r ON r.id = tm.role_id
            WHERE tm.user_id = $1 AND tm.is_active = true AND t.is_active = true
            ORDER BY t.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tenants)
    }

    /// Atribui um utilizador a um tenant com um cargo (na tabela-ponte).
    pub async fn add_member_to_tenant<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO tenant_members (tenant_id, user_id, role_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(role_id)
        .execute(executor)
        .await
        .map_err(|e| unique_violation(e, || AppError::Conflict("Este usuário já é membro da loja.".into())))?;
        Ok(())
    }

    pub async fn list_members(&self, tenant_id: Uuid) -> Result<Vec<TenantMember>, AppError> {
        let members = sqlx::query_as::<_, TenantMember>(
            r#"
            SELECT tm.tenant_id, tm.user_id, u.email, u.full_name,
                   tm.role_id, r.name AS role_name, tm.is_active, tm.created_at
            FROM tenant_members tm
            JOIN users u ON u.id = tm.user_id
            JOIN roles r ON r.id = tm.role_id
            WHERE tm.tenant_id = $1
            ORDER BY u.full_name ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    pub async fn change_member_role(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE tenant_members SET role_id = $3 WHERE tenant_id = $1 AND user_id = $2",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await?;
        ensure_affected(result.rows_affected(), "Membro")
    }

    pub async fn remove_member(&self, tenant_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tenant_members WHERE tenant_id = $1 AND user_id = $2")
            .bind(tenant_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected(), "Membro")
    }

    /// Resolve a loja pelo phone_number_id da WhatsApp Business API (webhooks).
    pub async fn find_by_whatsapp_phone_id(&self, phone_number_id: &str) -> Result<Option<Uuid>, AppError> {
        let tenant_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT c.tenant_id
            FROM whatsapp_configs c
            JOIN tenants t ON t.id = c.tenant_id
            WHERE c.phone_number_id = $1 AND c.is_active = true AND t.is_active = true
            "#,
        )
        .bind(phone_number_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant_id)
    }
}
