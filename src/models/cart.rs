// src/models/cart.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// No máximo um carrinho por (tenant, usuário).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha do carrinho já com os dados atuais do produto (JOIN).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub stock: i32,
    pub is_active: bool,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart_id: Uuid,
    pub items: Vec<CartLineView>,
    pub total_items: i32,
    pub total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Decimal,
}

impl CartView {
    pub fn build(cart_id: Uuid, lines: Vec<CartLine>) -> Self {
        let total = lines.iter().map(CartLine::line_total).sum();
        let total_items = lines.iter().map(|l| l.quantity).sum();
        let items = lines
            .into_iter()
            .map(|line| CartLineView { line_total: line.line_total(), line })
            .collect();
        Self { cart_id, items, total_items, total }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartPayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "A quantidade deve ser pelo menos 1."))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCartItemPayload {
    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub quantity: i32,
}

/// A quantidade final no carrinho (o que já está reservado + o pedido agora)
/// não pode passar do estoque do produto.
pub fn ensure_stock(
    product_name: &str,
    stock: i32,
    already_held: i32,
    requested: i32,
) -> Result<(), AppError> {
    let available = (stock - already_held).max(0);
    if requested > available {
        return Err(AppError::InsufficientStock {
            product: product_name.to_string(),
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, quantity: i32) -> CartLine {
        CartLine {
            product_id: Uuid::new_v4(),
            name: "Produto".into(),
            sku: "SKU".into(),
            unit_price: Decimal::new(price, 2),
            quantity,
            stock: 100,
            is_active: true,
        }
    }

    #[test]
    fn stock_check_counts_quantity_already_in_cart() {
        assert!(ensure_stock("Café", 10, 7, 3).is_ok());

        let err = ensure_stock("Café", 10, 7, 4).unwrap_err();
        match err {
            AppError::InsufficientStock { product, available } => {
                assert_eq!(product, "Café");
                assert_eq!(available, 3);
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn stock_check_never_reports_negative_availability() {
        let err = ensure_stock("Chá", 2, 5, 1).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available: 0, .. }));
    }

    #[test]
    fn cart_view_sums_lines() {
        let view = CartView::build(Uuid::new_v4(), vec![line(1050, 2), line(399, 3)]);

        assert_eq!(view.total_items, 5);
        assert_eq!(view.total, Decimal::new(3297, 2));
        assert_eq!(view.items[0].line_total, Decimal::new(2100, 2));
    }
}
