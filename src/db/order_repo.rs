// src/db/order_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        cart::CartLine,
        order::{Order, OrderItem, OrderStatus},
    },
};

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

// Totais já calculados pelo service, gravados no cabeçalho do pedido.
pub struct NewOrder<'a> {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub coupon_code: Option<&'a str>,
    pub notes: Option<&'a str>,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_order<'e, E>(&self, executor: E, order: &NewOrder<'_>) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (tenant_id, user_id, subtotal, discount, total, coupon_code, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(order.tenant_id)
        .bind(order.user_id)
        .bind(order.subtotal)
        .bind(order.discount)
        .bind(order.total)
        .bind(order.coupon_code)
        .bind(order.notes)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    /// Grava o item com o preço do momento (snapshot).
    pub async fn add_item<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        line: &CartLine,
    ) -> Result<OrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items
                (tenant_id, order_id, product_id, product_name, unit_price, quantity, line_total)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(line.product_id)
        .bind(&line.name)
        .bind(line.unit_price)
        .bind(line.quantity)
        .bind(line.line_total())
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    /// `user_id = None` lista todos os pedidos da loja (painel).
    pub async fn list(
        &self,
        tenant_id: Uuid,
        user_id: Option<Uuid>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR user_id = $2)
              AND ($3::order_status IS NULL OR status = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    pub async fn find(&self, tenant_id: Uuid, order_id: Uuid) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    pub async fn items(&self, tenant_id: Uuid, order_id: Uuid) -> Result<Vec<OrderItem>, AppError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE tenant_id = $1 AND order_id = $2 ORDER BY created_at ASC",
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn update_status(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders SET status = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Pedido"))
    }
}
