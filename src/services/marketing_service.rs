// src/services/marketing_service.rs

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BannerRepository, CouponRepository},
    models::{
        banner::{Banner, BannerWithSlides, CreateBannerPayload, CreateSlidePayload, Slide, UpdateBannerPayload},
        coupon::{
            check_coupon_value, Coupon, CouponValidation, CreateCouponPayload, UpdateCouponPayload,
            ValidateCouponPayload,
        },
    },
};

// Cupons e banners: o "marketing" da loja.
#[derive(Clone)]
pub struct MarketingService {
    coupons: CouponRepository,
    banners: BannerRepository,
}

impl MarketingService {
    pub fn new(coupons: CouponRepository, banners: BannerRepository) -> Self {
        Self { coupons, banners }
    }

    // =========================================================================
    //  CUPONS
    // =========================================================================

    pub async fn create_coupon(&self, tenant_id: Uuid, payload: &CreateCouponPayload) -> Result<Coupon, AppError> {
        check_coupon_value(payload.discount_type, payload.value)?;
        check_window(payload.starts_at, payload.expires_at)?;
        self.coupons.create(tenant_id, payload).await
    }

    pub async fn list_coupons(&self, tenant_id: Uuid) -> Result<Vec<Coupon>, AppError> {
        self.coupons.list(tenant_id).await
    }

    pub async fn get_coupon(&self, tenant_id: Uuid, coupon_id: Uuid) -> Result<Coupon, AppError> {
        self.coupons
            .find_by_id(tenant_id, coupon_id)
            .await?
            .ok_or(AppError::NotFound("Cupom"))
    }

    pub async fn update_coupon(
        &self,
        tenant_id: Uuid,
        coupon_id: Uuid,
        payload: &UpdateCouponPayload,
    ) -> Result<Coupon, AppError> {
        let current = self.get_coupon(tenant_id, coupon_id).await?;
        if let Some(value) = payload.value {
            check_coupon_value(current.discount_type, value)?;
        }
        check_window(
            payload.starts_at.or(current.starts_at),
            payload.expires_at.or(current.expires_at),
        )?;
        self.coupons.update(tenant_id, coupon_id, payload).await
    }

    pub async fn delete_coupon(&self, tenant_id: Uuid, coupon_id: Uuid) -> Result<(), AppError> {
        self.coupons.delete(tenant_id, coupon_id).await
    }

    /// Simula o desconto (vitrine/carrinho). Não consome uso do cupom.
    pub async fn validate_coupon(
        &self,
        tenant_id: Uuid,
        payload: &ValidateCouponPayload,
    ) -> Result<CouponValidation, AppError> {
        let coupon = self
            .coupons
            .find_by_code(self.coupons.pool(), tenant_id, &payload.code, false)
            .await?
            .ok_or_else(|| AppError::InvalidCoupon("cupom não encontrado.".into()))?;

        let discount = coupon.discount_for(payload.subtotal, Utc::now())?;
        Ok(CouponValidation {
            code: coupon.code,
            discount,
            total: payload.subtotal - discount,
        })
    }

    // =========================================================================
    //  BANNERS
    // =========================================================================

    pub async fn create_banner(&self, tenant_id: Uuid, payload: &CreateBannerPayload) -> Result<Banner, AppError> {
        check_window(payload.starts_at, payload.ends_at)?;
        self.banners.create(tenant_id, payload).await
    }

    pub async fn list_banners(&self, tenant_id: Uuid) -> Result<Vec<BannerWithSlides>, AppError> {
        let banners = self.banners.list(tenant_id).await?;
        self.attach_slides(tenant_id, banners).await
    }

    /// Vitrine: só os banners no ar, ordenados por posição.
    pub async fn list_live_banners(&self, tenant_id: Uuid) -> Result<Vec<BannerWithSlides>, AppError> {
        let banners = self.banners.list_live(tenant_id).await?;
        self.attach_slides(tenant_id, banners).await
    }

    pub async fn get_banner(&self, tenant_id: Uuid, banner_id: Uuid) -> Result<BannerWithSlides, AppError> {
        let banner = self
            .banners
            .find(tenant_id, banner_id)
            .await?
            .ok_or(AppError::NotFound("Banner"))?;
        let mut with_slides = self.attach_slides(tenant_id, vec![banner]).await?;
        with_slides.pop().ok_or(AppError::NotFound("Banner"))
    }

    pub async fn update_banner(
        &self,
        tenant_id: Uuid,
        banner_id: Uuid,
        payload: &UpdateBannerPayload,
    ) -> Result<Banner, AppError> {
        let current = self
            .banners
            .find(tenant_id, banner_id)
            .await?
            .ok_or(AppError::NotFound("Banner"))?;
        check_window(
            payload.starts_at.or(current.starts_at),
            payload.ends_at.or(current.ends_at),
        )?;
        self.banners.update(tenant_id, banner_id, payload).await
    }

    pub async fn delete_banner(&self, tenant_id: Uuid, banner_id: Uuid) -> Result<(), AppError> {
        self.banners.delete(tenant_id, banner_id).await
    }

    pub async fn record_impression(&self, tenant_id: Uuid, banner_id: Uuid) -> Result<(), AppError> {
        self.banners.record_impression(tenant_id, banner_id).await
    }

    pub async fn record_click(&self, tenant_id: Uuid, banner_id: Uuid) -> Result<(), AppError> {
        self.banners.record_click(tenant_id, banner_id).await
    }

    pub async fn add_slide(
        &self,
        tenant_id: Uuid,
        banner_id: Uuid,
        payload: &CreateSlidePayload,
    ) -> Result<Slide, AppError> {
        // Garante que o banner é desta loja antes de pendurar o slide.
        self.banners
            .find(tenant_id, banner_id)
            .await?
            .ok_or(AppError::NotFound("Banner"))?;
        self.banners.add_slide(tenant_id, banner_id, payload).await
    }

    pub async fn delete_slide(&self, tenant_id: Uuid, banner_id: Uuid, slide_id: Uuid) -> Result<(), AppError> {
        self.banners.delete_slide(tenant_id, banner_id, slide_id).await
    }

    async fn attach_slides(&self, tenant_id: Uuid, banners: Vec<Banner>) -> Result<Vec<BannerWithSlides>, AppError> {
        let ids: Vec<Uuid> = banners.iter().map(|b| b.id).collect();
        let mut by_banner: HashMap<Uuid, Vec<Slide>> = HashMap::new();
        for slide in self.banners.slides_for(tenant_id, &ids).await? {
            by_banner.entry(slide.banner_id).or_default().push(slide);
        }

        Ok(banners
            .into_iter()
            .map(|banner| {
                let slides = by_banner.remove(&banner.id).unwrap_or_default();
                BannerWithSlides { banner, slides }
            })
            .collect())
    }
}

fn check_window(
    starts_at: Option<chrono::DateTime<Utc>>,
    ends_at: Option<chrono::DateTime<Utc>>,
) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (starts_at, ends_at) {
        if end <= start {
            return Err(AppError::BadRequest("O fim do período deve ser depois do início.".into()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn window_must_end_after_start() {
        let now = Utc::now();
        assert!(check_window(Some(now), Some(now + Duration::days(1))).is_ok());
        assert!(check_window(Some(now), Some(now)).is_err());
        assert!(check_window(None, Some(now)).is_ok());
        assert!(check_window(Some(now), None).is_ok());
    }
}
