// src/db/banner_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::ensure_affected, error::AppError},
    models::banner::{Banner, CreateBannerPayload, CreateSlidePayload, Slide, UpdateBannerPayload},
};

#[derive(Clone)]
pub struct BannerRepository {
    pool: PgPool,
}

impl BannerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, tenant_id: Uuid, payload: &CreateBannerPayload) -> Result<Banner, AppError> {
        let banner = sqlx::query_as::<_, Banner>(
            r#"
            INSERT INTO banners
                (tenant_id, title, subtitle, image_url, link_url, position, is_active, starts_at, ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&payload.title)
        .bind(payload.subtitle.as_deref())
        .bind(&payload.image_url)
        .bind(payload.link_url.as_deref())
        .bind(payload.position)
        .bind(payload.is_active)
        .bind(payload.starts_at)
        .bind(payload.ends_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(banner)
    }

    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<Banner>, AppError> {
        let banners = sqlx::query_as::<_, Banner>(
            "SELECT * FROM banners WHERE tenant_id = $1 ORDER BY position ASC, created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(banners)
    }

    /// Banners no ar agora (vitrine), mesma regra de `Banner::is_live`.
    pub async fn list_live(&self, tenant_id: Uuid) -> Result<Vec<Banner>, AppError> {
        let banners = sqlx::query_as::<_, Banner>(
            r#"
            SELECT * FROM banners
            WHERE tenant_id = $1
              AND is_active = true
              AND (starts_at IS NULL OR starts_at <= NOW())
              AND (ends_at IS NULL OR NOW() < ends_at)
            ORDER BY position ASC, created_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(banners)
    }

    pub async fn find(&self, tenant_id: Uuid, banner_id: Uuid) -> Result<Option<Banner>, AppError> {
        let banner = sqlx::query_as::<_, Banner>("SELECT * FROM banners WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(banner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(banner)
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        banner_id: Uuid,
        payload: &UpdateBannerPayload,
    ) -> Result<Banner, AppError> {
        sqlx::query_as::<_, Banner>(
            r#"
            UPDATE banners SET
                title = COALESCE($3, title),
                subtitle = COALESCE($4, subtitle),
                image_url = COALESCE($5, image_url),
                link_url = COALESCE($6, link_url),
                position = COALESCE($7, position),
                is_active = COALESCE($8, is_active),
                starts_at = COALESCE($9, starts_at),
                ends_at = COALESCE($10, ends_at),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(banner_id)
        .bind(payload.title.as_deref())
        .bind(payload.subtitle.as_deref())
        .bind(payload.image_url.as_deref())
        .bind(payload.link_url.as_deref())
        .bind(payload.position)
        .bind(payload.is_active)
        .bind(payload.starts_at)
        .bind(payload.ends_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Banner"))
    }

    pub async fn delete(&self, tenant_id: Uuid, banner_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM banners WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(banner_id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected(), "Banner")
    }

    // Contadores de métricas. `column` vem de código, nunca do usuário.
    async fn bump(&self, tenant_id: Uuid, banner_id: Uuid, column: &'static str) -> Result<(), AppError> {
        let sql = format!(
            "UPDATE banners SET {column} = {column} + 1 WHERE tenant_id = $1 AND id = $2"
        );
        let result = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(banner_id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected(), "Banner")
    }

    pub async fn record_impression(&self, tenant_id: Uuid, banner_id: Uuid) -> Result<(), AppError> {
        self.bump(tenant_id, banner_id, "impressions").await
    }

    pub async fn record_click(&self, tenant_id: Uuid, banner_id: Uuid) -> Result<(), AppError> {
        self.bump(tenant_id, banner_id, "clicks").await
    }

    // --- Slides ---

    pub async fn add_slide(
        &self,
        tenant_id: Uuid,
        banner_id: Uuid,
        payload: &CreateSlidePayload,
    ) -> Result<Slide, AppError> {
        let slide = sqlx::query_as::<_, Slide>(
            r#"
            INSERT INTO banner_slides (tenant_id, banner_id, image_url, caption, link_url, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(banner_id)
        .bind(&payload.image_url)
        .bind(payload.caption.as_deref())
        .bind(payload.link_url.as_deref())
        .bind(payload.position)
        .fetch_one(&self.pool)
        .await?;
        Ok(slide)
    }

    /// Slides de vários banners de uma vez (evita N+1 na vitrine).
    pub async fn slides_for(&self, tenant_id: Uuid, banner_ids: &[Uuid]) -> Result<Vec<Slide>, AppError> {
        let slides = sqlx::query_as::<_, Slide>(
            r#"
            SELECT * FROM banner_slides
            WHERE tenant_id = $1 AND banner_id = ANY($2)
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(banner_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(slides)
    }

    pub async fn delete_slide(&self, tenant_id: Uuid, banner_id: Uuid, slide_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM banner_slides WHERE tenant_id = $1 AND banner_id = $2 AND id = $3",
        )
        .bind(tenant_id)
        .bind(banner_id)
        .bind(slide_id)
        .execute(&self.pool)
        .await?;
        ensure_affected(result.rows_affected(), "Slide")
    }
}
