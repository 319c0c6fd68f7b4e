// src/services/cart_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CartRepository, CatalogRepository},
    models::{
        cart::{ensure_stock, CartView},
        catalog::Product,
    },
};

#[derive(Clone)]
pub struct CartService {
    cart_repo: CartRepository,
    catalog_repo: CatalogRepository,
}

impl CartService {
    pub fn new(cart_repo: CartRepository, catalog_repo: CatalogRepository) -> Self {
        Self { cart_repo, catalog_repo }
    }

    pub async fn get_cart(&self, tenant_id: Uuid, user_id: Uuid) -> Result<CartView, AppError> {
        let cart = self.cart_repo.get_or_create(tenant_id, user_id).await?;
        self.view(tenant_id, cart.id).await
    }

    pub async fn add_item(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, AppError> {
        let product = self.sellable_product(tenant_id, product_id).await?;

        let cart = self.cart_repo.get_or_create(tenant_id, user_id).await?;
        let held = self.cart_repo.quantity_in_cart(cart.id, product.id).await?;
        ensure_stock(&product.name, product.stock, held, quantity)?;

        self.cart_repo.add_item(tenant_id, cart.id, product.id, quantity).await?;
        self.view(tenant_id, cart.id).await
    }

    /// Quantidade 0 remove a linha.
    pub async fn update_item(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, AppError> {
        let cart = self.cart_repo.get_or_create(tenant_id, user_id).await?;

        if quantity == 0 {
            self.cart_repo.remove_item(cart.id, product_id).await?;
            return self.view(tenant_id, cart.id).await;
        }

        let product = self.sellable_product(tenant_id, product_id).await?;
        // Aqui a quantidade substitui a anterior, então nada está "reservado".
        ensure_stock(&product.name, product.stock, 0, quantity)?;

        self.cart_repo.set_quantity(cart.id, product_id, quantity).await?;
        self.view(tenant_id, cart.id).await
    }

    pub async fn remove_item(&self, tenant_id: Uuid, user_id: Uuid, product_id: Uuid) -> Result<CartView, AppError> {
        let cart = self.cart_repo.get_or_create(tenant_id, user_id).await?;
        self.cart_repo.remove_item(cart.id, product_id).await?;
        self.view(tenant_id, cart.id).await
    }

    pub async fn clear(&self, tenant_id: Uuid, user_id: Uuid) -> Result<CartView, AppError> {
        let cart = self.cart_repo.get_or_create(tenant_id, user_id).await?;
        self.cart_repo.clear(self.cart_repo.pool(), cart.id).await?;
        Ok(CartView::build(cart.id, Vec::new()))
    }

    // Produto desativado some da vitrine e não entra mais no carrinho.
    async fn sellable_product(&self, tenant_id: Uuid, product_id: Uuid) -> Result<Product, AppError> {
        self.catalog_repo
            .find_product(tenant_id, product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(AppError::NotFound("Produto"))
    }

    async fn view(&self, tenant_id: Uuid, cart_id: Uuid) -> Result<CartView, AppError> {
        let lines = self
            .cart_repo
            .lines(self.cart_repo.pool(), tenant_id, cart_id, false)
            .await?;
        Ok(CartView::build(cart_id, lines))
    }
}
