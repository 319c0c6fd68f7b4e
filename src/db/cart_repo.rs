// src/db/cart_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::ensure_affected, error::AppError},
    models::cart::{Cart, CartLine},
};

#[derive(Clone)]
pub struct CartRepository {
    pool: PgPool,
}

impl CartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Devolve o carrinho do usuário na loja, criando-o na primeira vez.
    pub async fn get_or_create(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Cart, AppError> {
        // O DO UPDATE "vazio" faz o RETURNING devolver a linha existente.
        let cart = sqlx::query_as::<_, Cart>(
            r#"
            INSERT INTO carts (tenant_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (tenant_id, user_id) DO UPDATE SET updated_at = carts.updated_at
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(cart)
    }

    /// Trava o carrinho para o checkout. `None` = usuário nunca teve carrinho.
    pub async fn lock_cart<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Cart>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cart = sqlx::query_as::<_, Cart>(
            "SELECT * FROM carts WHERE tenant_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
        Ok(cart)
    }

    /// Linhas do carrinho com preço/estoque atuais do produto.
    /// `lock_products` trava as linhas de produto (checkout).
    pub async fn lines<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        cart_id: Uuid,
        lock_products: bool,
    ) -> Result<Vec<CartLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT ci.product_id, p.name, p.sku, p.price AS unit_price, ci.quantity, p.stock, p.is_active
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id AND p.tenant_id = ci.tenant_id
            WHERE ci.tenant_id = $1 AND ci.cart_id = $2
            ORDER BY ci.created_at ASC
            {}
            "#,
            if lock_products { "FOR UPDATE OF p" } else { "" }
        );
        let lines = sqlx::query_as::<_, CartLine>(&sql)
            .bind(tenant_id)
            .bind(cart_id)
            .fetch_all(executor)
            .await?;
        Ok(lines)
    }

    pub async fn quantity_in_cart(&self, cart_id: Uuid, product_id: Uuid) -> Result<i32, AppError> {
        let quantity = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM cart_items WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quantity.unwrap_or(0))
    }

    /// Soma `quantity` ao item (ou cria a linha).
    pub async fn add_item(
        &self,
        tenant_id: Uuid,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (tenant_id, cart_id, product_id, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW()
            "#,
        )
        .bind(tenant_id)
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;
        self.touch(cart_id).await
    }

    pub async fn set_quantity(&self, cart_id: Uuid, product_id: Uuid, quantity: i32) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3, updated_at = NOW() WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;
        ensure_affected(result.rows_affected(), "Item do carrinho")?;
        self.touch(cart_id).await
    }

    pub async fn remove_item(&self, cart_id: Uuid, product_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected(), "Item do carrinho")?;
        self.touch(cart_id).await
    }

    pub async fn clear<'e, E>(&self, executor: E, cart_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    async fn touch(&self, cart_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
            .bind(cart_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
