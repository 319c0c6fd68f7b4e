// src/models/banner.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::catalog::default_true;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Promoção de Verão")]
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub impressions: i64,
    pub clicks: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Banner {
    /// Ativo e dentro da janela [starts_at, ends_at).
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.starts_at.is_none_or(|s| s <= now)
            && self.ends_at.is_none_or(|e| now < e)
    }
}

// Slides: imagens de um carrossel que pertencem a um banner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub banner_id: Uuid,
    pub image_url: String,
    pub caption: Option<String>,
    pub link_url: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BannerWithSlides {
    #[serde(flatten)]
    pub banner: Banner,
    pub slides: Vec<Slide>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBannerPayload {
    #[validate(length(min = 1, message = "O título é obrigatório."))]
    pub title: String,
    pub subtitle: Option<String>,
    #[validate(url(message = "A URL da imagem é inválida."))]
    pub image_url: String,
    pub link_url: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBannerPayload {
    #[validate(length(min = 1, message = "O título não pode ser vazio."))]
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[validate(url(message = "A URL da imagem é inválida."))]
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlidePayload {
    #[validate(url(message = "A URL da imagem é inválida."))]
    pub image_url: String,
    pub caption: Option<String>,
    pub link_url: Option<String>,
    #[serde(default)]
    pub position: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn banner() -> Banner {
        let now = Utc::now();
        Banner {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            title: "Black Friday".into(),
            subtitle: None,
            image_url: "https://cdn.exemplo.com/bf.png".into(),
            link_url: None,
            position: 0,
            is_active: true,
            starts_at: None,
            ends_at: None,
            impressions: 0,
            clicks: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn live_window_is_half_open() {
        let now = Utc::now();
        let mut b = banner();
        assert!(b.is_live(now));

        b.starts_at = Some(now);
        b.ends_at = Some(now + Duration::hours(1));
        assert!(b.is_live(now));
        assert!(!b.is_live(now + Duration::hours(1)));
        assert!(!b.is_live(now - Duration::seconds(1)));
    }

    #[test]
    fn inactive_banner_is_never_live() {
        let mut b = banner();
        b.is_active = false;
        assert!(!b.is_live(Utc::now()));
    }
}
