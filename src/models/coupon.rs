// src/models/coupon.rs

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::models::catalog::default_true;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "coupon_discount_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage, // "PERCENTAGE": value é 0-100
    Fixed,      // "FIXED": value é abatido do subtotal
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "BEMVINDO10")]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    #[schema(example = "10.00")]
    pub value: Decimal,
    pub min_purchase: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Teto do subtotal aceito na validação de cupom (NUMERIC(12,2) no banco).
pub fn max_subtotal() -> Decimal {
    Decimal::new(9_999_999_999_99, 2)
}

impl Coupon {
    /// Verifica se o cupom pode ser usado agora para este subtotal e devolve o desconto.
    /// O desconto nunca passa do subtotal e é arredondado para 2 casas.
    pub fn discount_for(&self, subtotal: Decimal, now: DateTime<Utc>) -> Result<Decimal, AppError> {
        if subtotal < Decimal::ZERO || subtotal > max_subtotal() {
            return Err(AppError::BadRequest("Subtotal fora do intervalo aceito.".into()));
        }
        if !self.is_active {
            return Err(AppError::InvalidCoupon("cupom inativo.".into()));
        }
        if let Some(starts_at) = self.starts_at {
            if now < starts_at {
                return Err(AppError::InvalidCoupon("cupom ainda não está válido.".into()));
            }
        }
        if let Some(expires_at) = self.expires_at {
            if now >= expires_at {
                return Err(AppError::InvalidCoupon("cupom expirado.".into()));
            }
        }
        if let Some(max_uses) = self.max_uses {
            if self.used_count >= max_uses {
                return Err(AppError::InvalidCoupon("limite de usos atingido.".into()));
            }
        }
        if let Some(min_purchase) = self.min_purchase {
            if subtotal < min_purchase {
                return Err(AppError::InvalidCoupon(format!(
                    "compra mínima de {} não atingida.",
                    min_purchase
                )));
            }
        }

        let raw = match self.discount_type {
            DiscountType::Percentage => subtotal
                .checked_mul(self.value)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
                .ok_or_else(|| AppError::BadRequest("Subtotal fora do intervalo aceito.".into()))?,
            DiscountType::Fixed => self.value,
        };

        Ok(raw
            .min(subtotal)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponPayload {
    #[validate(length(min = 3, max = 40, message = "O código deve ter entre 3 e 40 caracteres."))]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub min_purchase: Option<Decimal>,
    #[validate(range(min = 1, message = "O limite de usos deve ser positivo."))]
    pub max_uses: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCouponPayload {
    pub description: Option<String>,
    pub value: Option<Decimal>,
    pub min_purchase: Option<Decimal>,
    #[validate(range(min = 1, message = "O limite de usos deve ser positivo."))]
    pub max_uses: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponPayload {
    #[validate(length(min = 1, message = "O código é obrigatório."))]
    pub code: String,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidation {
    pub code: String,
    pub discount: Decimal,
    pub total: Decimal,
}

/// Regras de valor que o `validator` não expressa bem (depende do tipo).
pub(crate) fn check_coupon_value(discount_type: DiscountType, value: Decimal) -> Result<(), AppError> {
    if value <= Decimal::ZERO {
        return Err(AppError::BadRequest("O valor do desconto deve ser positivo.".into()));
    }
    if discount_type == DiscountType::Percentage && value > Decimal::ONE_HUNDRED {
        return Err(AppError::BadRequest("Percentual de desconto não pode passar de 100.".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(discount_type: DiscountType, value: Decimal) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            code: "TESTE".into(),
            description: None,
            discount_type,
            value,
            min_purchase: None,
            max_uses: None,
            used_count: 0,
            starts_at: None,
            expires_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn percentage_discount_is_rounded() {
        let c = coupon(DiscountType::Percentage, Decimal::new(15, 0));
        let discount = c.discount_for(Decimal::new(3333, 2), Utc::now()).unwrap();
        // 33.33 * 15% = 4.9995 -> 5.00
        assert_eq!(discount, Decimal::new(500, 2));
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() {
        let c = coupon(DiscountType::Fixed, Decimal::new(50, 0));
        let discount = c.discount_for(Decimal::new(20, 0), Utc::now()).unwrap();
        assert_eq!(discount, Decimal::new(20, 0));
    }

    #[test]
    fn expired_coupon_is_rejected() {
        let mut c = coupon(DiscountType::Fixed, Decimal::new(5, 0));
        c.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(matches!(
            c.discount_for(Decimal::new(100, 0), Utc::now()),
            Err(AppError::InvalidCoupon(_))
        ));
    }

    #[test]
    fn not_yet_started_coupon_is_rejected() {
        let mut c = coupon(DiscountType::Fixed, Decimal::new(5, 0));
        c.starts_at = Some(Utc::now() + Duration::days(1));
        assert!(c.discount_for(Decimal::new(100, 0), Utc::now()).is_err());
    }

    #[test]
    fn usage_cap_and_min_purchase_are_enforced() {
        let mut c = coupon(DiscountType::Percentage, Decimal::new(10, 0));
        c.max_uses = Some(2);
        c.used_count = 2;
        assert!(c.discount_for(Decimal::new(100, 0), Utc::now()).is_err());

        c.used_count = 1;
        c.min_purchase = Some(Decimal::new(200, 0));
        assert!(c.discount_for(Decimal::new(100, 0), Utc::now()).is_err());
        assert_eq!(
            c.discount_for(Decimal::new(200, 0), Utc::now()).unwrap(),
            Decimal::new(20, 0)
        );
    }

    #[test]
    fn inactive_coupon_is_rejected() {
        let mut c = coupon(DiscountType::Fixed, Decimal::new(5, 0));
        c.is_active = false;
        assert!(c.discount_for(Decimal::new(100, 0), Utc::now()).is_err());
    }

    #[test]
    fn huge_subtotal_is_rejected_instead_of_overflowing() {
        let c = coupon(DiscountType::Percentage, Decimal::new(50, 0));
        let huge = Decimal::from_i128_with_scale(5 * 10i128.pow(28), 0);
        assert!(matches!(c.discount_for(huge, Utc::now()), Err(AppError::BadRequest(_))));
        assert!(matches!(c.discount_for(Decimal::MAX, Utc::now()), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn negative_subtotal_is_rejected() {
        let c = coupon(DiscountType::Fixed, Decimal::new(5, 0));
        assert!(matches!(
            c.discount_for(Decimal::new(-100, 0), Utc::now()),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn largest_accepted_subtotal_still_computes() {
        let c = coupon(DiscountType::Percentage, Decimal::ONE_HUNDRED);
        assert_eq!(c.discount_for(max_subtotal(), Utc::now()).unwrap(), max_subtotal());
    }

    #[test]
    fn percentage_over_hundred_is_invalid() {
        assert!(check_coupon_value(DiscountType::Percentage, Decimal::new(101, 0)).is_err());
        assert!(check_coupon_value(DiscountType::Fixed, Decimal::new(101, 0)).is_ok());
        assert!(check_coupon_value(DiscountType::Fixed, Decimal::ZERO).is_err());
    }
}
