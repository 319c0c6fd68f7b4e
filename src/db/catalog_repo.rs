// src/db/catalog_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{ensure_affected, foreign_key_violation},
        error::AppError,
    },
    models::catalog::{
        Category, CreateCategoryPayload, CreateProductPayload, Product, ProductFilter,
        UpdateCategoryPayload, UpdateProductPayload,
    },
};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PRODUTOS
    // =========================================================================

    pub async fn create_product(
        &self,
        tenant_id: Uuid,
        payload: &CreateProductPayload,
    ) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products
                (tenant_id, category_id, sku, name, description, price, stock, image_url, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(payload.category_id)
        .bind(&payload.sku)
        .bind(&payload.name)
        .bind(payload.description.as_deref())
        .bind(payload.price)
        .bind(payload.stock)
        .bind(payload.image_url.as_deref())
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_product_error(e, &payload.sku))
    }

    /// Listagem com filtros opcionais. `only_active` é usado pela vitrine.
    pub async fn list_products(
        &self,
        tenant_id: Uuid,
        filter: &ProductFilter,
        only_active: bool,
    ) -> Result<Vec<Product>, AppError> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR category_id = $2)
              AND ($3::text IS NULL OR name ILIKE $3 OR sku ILIKE $3)
              AND (NOT $4 OR is_active = true)
            ORDER BY name ASC
            "#,
        )
        .bind(tenant_id)
        .bind(filter.category_id)
        .bind(search)
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn find_product(&self, tenant_id: Uuid, product_id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn update_product(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        payload: &UpdateProductPayload,
    ) -> Result<Product, AppError> {
        let sku = payload.sku.clone().unwrap_or_default();
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                category_id = COALESCE($3, category_id),
                sku = COALESCE($4, sku),
                name = COALESCE($5, name),
                description = COALESCE($6, description),
                price = COALESCE($7, price),
                stock = COALESCE($8, stock),
                image_url = COALESCE($9, image_url),
                is_active = COALESCE($10, is_active),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(payload.category_id)
        .bind(payload.sku.as_deref())
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.price)
        .bind(payload.stock)
        .bind(payload.image_url.as_deref())
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_product_error(e, &sku))?
        .ok_or(AppError::NotFound("Produto"))
    }

    pub async fn delete_product(&self, tenant_id: Uuid, product_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM products WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(product_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                foreign_key_violation(e, || {
                    AppError::Conflict("Produto já vendido não pode ser excluído; desative-o.".into())
                })
            })?;
        ensure_affected(result.rows_affected(), "Produto")
    }

    /// Baixa de estoque condicionada: só decrementa se ainda houver saldo.
    /// Retorna false quando o saldo não é suficiente (corrida com outra compra).
    pub async fn decrement_stock<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND stock >= $3
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(quantity)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    //  CATEGORIAS
    // =========================================================================

    pub async fn create_category(
        &self,
        tenant_id: Uuid,
        payload: &CreateCategoryPayload,
    ) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (tenant_id, name, description, parent_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&payload.name)
        .bind(payload.description.as_deref())
        .bind(payload.parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_category_error(e, &payload.name))
    }

    pub async fn list_categories(&self, tenant_id: Uuid) -> Result<Vec<Category>, AppError> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE tenant_id = $1 ORDER BY name ASC")
                .bind(tenant_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    pub async fn find_category(&self, tenant_id: Uuid, category_id: Uuid) -> Result<Option<Category>, AppError> {
        let category =
            sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE tenant_id = $1 AND id = $2")
                .bind(tenant_id)
                .bind(category_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(category)
    }

    pub async fn update_category(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
        payload: &UpdateCategoryPayload,
    ) -> Result<Category, AppError> {
        let name = payload.name.clone().unwrap_or_default();
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                parent_id = COALESCE($5, parent_id),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(category_id)
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.parent_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_category_error(e, &name))?
        .ok_or(AppError::NotFound("Categoria"))
    }

    pub async fn delete_category(&self, tenant_id: Uuid, category_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                foreign_key_violation(e, || {
                    AppError::Conflict("A categoria possui produtos ou subcategorias.".into())
                })
            })?;
        ensure_affected(result.rows_affected(), "Categoria")
    }
}

fn map_product_error(e: sqlx::Error, sku: &str) -> AppError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("O SKU '{}' já existe nesta loja.", sku))
        }
        Some(db) if db.is_foreign_key_violation() => AppError::BadRequest("Categoria inexistente.".into()),
        _ => e.into(),
    }
}

fn map_category_error(e: sqlx::Error, name: &str) -> AppError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("A categoria '{}' já existe.", name))
        }
        Some(db) if db.is_foreign_key_violation() => AppError::BadRequest("Categoria pai inexistente.".into()),
        _ => e.into(),
    }
}
