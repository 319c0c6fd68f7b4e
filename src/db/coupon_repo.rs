// src/db/coupon_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{ensure_affected, unique_violation},
        error::AppError,
    },
    models::coupon::{Coupon, CreateCouponPayload, UpdateCouponPayload},
};

#[derive(Clone)]
pub struct CouponRepository {
    pool: PgPool,
}

impl CouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // O código é gravado em maiúsculas; a busca também normaliza.
    pub async fn create(&self, tenant_id: Uuid, payload: &CreateCouponPayload) -> Result<Coupon, AppError> {
        let code = payload.code.trim().to_uppercase();
        sqlx::query_as::<_, Coupon>(
            r#"
            INSERT INTO coupons
                (tenant_id, code, description, discount_type, value, min_purchase,
                 max_uses, starts_at, expires_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&code)
        .bind(payload.description.as_deref())
        .bind(payload.discount_type)
        .bind(payload.value)
        .bind(payload.min_purchase)
        .bind(payload.max_uses)
        .bind(payload.starts_at)
        .bind(payload.expires_at)
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, || AppError::Conflict(format!("O cupom '{}' já existe.", code))))
    }

    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<Coupon>, AppError> {
        let coupons = sqlx::query_as::<_, Coupon>(
            "SELECT * FROM coupons WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(coupons)
    }

    pub async fn find_by_id(&self, tenant_id: Uuid, coupon_id: Uuid) -> Result<Option<Coupon>, AppError> {
        let coupon = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(coupon_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(coupon)
    }

    /// Busca pelo código. No checkout é chamado dentro da transação com
    /// `FOR UPDATE` para que dois pedidos não estourem o `max_uses`.
    pub async fn find_by_code<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        code: &str,
        lock: bool,
    ) -> Result<Option<Coupon>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = if lock {
            "SELECT * FROM coupons WHERE tenant_id = $1 AND code = upper($2) FOR UPDATE"
        } else {
            "SELECT * FROM coupons WHERE tenant_id = $1 AND code = upper($2)"
        };
        let coupon = sqlx::query_as::<_, Coupon>(sql)
            .bind(tenant_id)
            .bind(code.trim())
            .fetch_optional(executor)
            .await?;
        Ok(coupon)
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        coupon_id: Uuid,
        payload: &UpdateCouponPayload,
    ) -> Result<Coupon, AppError> {
        sqlx::query_as::<_, Coupon>(
            r#"
            UPDATE coupons SET
                description = COALESCE($3, description),
                value = COALESCE($4, value),
                min_purchase = COALESCE($5, min_purchase),
                max_uses = COALESCE($6, max_uses),
                starts_at = COALESCE($7, starts_at),
                expires_at = COALESCE($8, expires_at),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(coupon_id)
        .bind(payload.description.as_deref())
        .bind(payload.value)
        .bind(payload.min_purchase)
        .bind(payload.max_uses)
        .bind(payload.starts_at)
        .bind(payload.expires_at)
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Cupom"))
    }

    pub async fn delete(&self, tenant_id: Uuid, coupon_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM coupons WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(coupon_id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected(), "Cupom")
    }

    pub async fn increment_usage<'e, E>(&self, executor: E, coupon_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE coupons SET used_count = used_count + 1, updated_at = NOW() WHERE id = $1")
            .bind(coupon_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
