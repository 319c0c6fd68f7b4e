// src/models/order.rs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// Status do pedido. Qualquer valor do conjunto é aceito como destino;
// não existe máquina de estados além disso.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pendiente,
    Pagado,
    Enviado,
    Entregado,
    Cancelado,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pendiente,
        OrderStatus::Pagado,
        OrderStatus::Enviado,
        OrderStatus::Entregado,
        OrderStatus::Cancelado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendiente => "PENDIENTE",
            OrderStatus::Pagado => "PAGADO",
            OrderStatus::Enviado => "ENVIADO",
            OrderStatus::Entregado => "ENTREGADO",
            OrderStatus::Cancelado => "CANCELADO",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| AppError::InvalidStatus {
                given: s.to_string(),
                allowed: OrderStatus::ALL.map(|st| st.as_str()).join(", "),
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    #[schema(example = "150.50")]
    pub subtotal: Decimal,
    #[schema(example = "10.00")]
    pub discount: Decimal,
    #[schema(example = "140.50")]
    pub total: Decimal,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    #[schema(example = "50.00")]
    pub unit_price: Decimal,
    #[schema(example = 2)]
    pub quantity: i32,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub header: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    #[validate(length(min = 1, message = "O código do cupom não pode ser vazio."))]
    pub coupon_code: Option<String>,
    #[validate(length(max = 500, message = "As observações são muito longas."))]
    pub notes: Option<String>,
}

// Recebe o status como texto para devolver INVALID_STATUS no envelope
// em vez da rejeição padrão do extrator Json.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusPayload {
    #[schema(example = "PAGADO")]
    pub status: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_valid_status() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(" pagado ".parse::<OrderStatus>().unwrap(), OrderStatus::Pagado);
    }

    #[test]
    fn rejects_status_outside_the_set() {
        let err = "DEVUELTO".parse::<OrderStatus>().unwrap_err();
        match err {
            AppError::InvalidStatus { given, allowed } => {
                assert_eq!(given, "DEVUELTO");
                assert!(allowed.contains("ENTREGADO"));
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_string(&OrderStatus::Entregado).unwrap();
        assert_eq!(json, "\"ENTREGADO\"");
    }
}
