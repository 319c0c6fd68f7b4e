// src/services/catalog_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogRepository,
    models::catalog::{
        Category, CreateCategoryPayload, CreateProductPayload, Product, ProductFilter, UpdateCategoryPayload,
        UpdateProductPayload,
    },
};

#[derive(Clone)]
pub struct CatalogService {
    repo: CatalogRepository,
}

impl CatalogService {
    pub fn new(repo: CatalogRepository) -> Self {
        Self { repo }
    }

    // --- Produtos ---

    pub async fn create_product(&self, tenant_id: Uuid, payload: &CreateProductPayload) -> Result<Product, AppError> {
        if let Some(category_id) = payload.category_id {
            self.get_category(tenant_id, category_id).await?;
        }
        let product = self.repo.create_product(tenant_id, payload).await?;
        tracing::info!(%tenant_id, product_id = %product.id, sku = %product.sku, "📦 Produto criado");
        Ok(product)
    }

    pub async fn list_products(
        &self,
        tenant_id: Uuid,
        filter: &ProductFilter,
        only_active: bool,
    ) -> Result<Vec<Product>, AppError> {
        self.repo.list_products(tenant_id, filter, only_active).await
    }

    /// `only_active` esconde produtos desativados da vitrine.
    pub async fn get_product(&self, tenant_id: Uuid, product_id: Uuid, only_active: bool) -> Result<Product, AppError> {
        self.repo
            .find_product(tenant_id, product_id)
            .await?
            .filter(|p| !only_active || p.is_active)
            .ok_or(AppError::NotFound("Produto"))
    }

    pub async fn update_product(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        payload: &UpdateProductPayload,
    ) -> Result<Product, AppError> {
        if let Some(category_id) = payload.category_id {
            self.get_category(tenant_id, category_id).await?;
        }
        self.repo.update_product(tenant_id, product_id, payload).await
    }

    pub async fn delete_product(&self, tenant_id: Uuid, product_id: Uuid) -> Result<(), AppError> {
        self.repo.delete_product(tenant_id, product_id).await
    }

    // --- Categorias ---

    pub async fn create_category(&self, tenant_id: Uuid, payload: &CreateCategoryPayload) -> Result<Category, AppError> {
        if let Some(parent_id) = payload.parent_id {
            self.get_category(tenant_id, parent_id).await?;
        }
        self.repo.create_category(tenant_id, payload).await
    }

    pub async fn list_categories(&self, tenant_id: Uuid) -> Result<Vec<Category>, AppError> {
        self.repo.list_categories(tenant_id).await
    }

    pub async fn get_category(&self, tenant_id: Uuid, category_id: Uuid) -> Result<Category, AppError> {
        self.repo
            .find_category(tenant_id, category_id)
            .await?
            .ok_or(AppError::NotFound("Categoria"))
    }

    pub async fn update_category(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
        payload: &UpdateCategoryPayload,
    ) -> Result<Category, AppError> {
        if let Some(parent_id) = payload.parent_id {
            if parent_id == category_id {
                return Err(AppError::BadRequest("A categoria não pode ser pai de si mesma.".into()));
            }
            self.get_category(tenant_id, parent_id).await?;
        }
        self.repo.update_category(tenant_id, category_id, payload).await
    }

    pub async fn delete_category(&self, tenant_id: Uuid, category_id: Uuid) -> Result<(), AppError> {
        self.repo.delete_category(tenant_id, category_id).await
    }
}
