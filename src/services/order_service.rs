// src/services/order_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{order_repo::NewOrder, CartRepository, CatalogRepository, CouponRepository, OrderRepository, UserRepository},
    models::{
        cart::{ensure_stock, CartLine},
        notification::Job,
        order::{CheckoutPayload, Order, OrderDetail, OrderStatus},
    },
    services::jobs::{enqueue, JobQueue},
};

#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
    cart_repo: CartRepository,
    catalog_repo: CatalogRepository,
    coupon_repo: CouponRepository,
    user_repo: UserRepository,
    jobs: Arc<dyn JobQueue>,
    pool: PgPool,
}

impl OrderService {
    pub fn new(
        order_repo: OrderRepository,
        cart_repo: CartRepository,
        catalog_repo: CatalogRepository,
        coupon_repo: CouponRepository,
        user_repo: UserRepository,
        jobs: Arc<dyn JobQueue>,
        pool: PgPool,
    ) -> Self {
        Self { order_repo, cart_repo, catalog_repo, coupon_repo, user_repo, jobs, pool }
    }

    /// Fecha o carrinho em um pedido. Tudo ou nada: qualquer falha desfaz
    /// estoque, uso do cupom e limpeza do carrinho.
    pub async fn checkout(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        payload: &CheckoutPayload,
    ) -> Result<OrderDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Trava o carrinho e as linhas de produto
        let cart = self
            .cart_repo
            .lock_cart(&mut *tx, tenant_id, user_id)
            .await?
            .ok_or(AppError::EmptyCart)?;
        let lines = self.cart_repo.lines(&mut *tx, tenant_id, cart.id, true).await?;

        // 2. Revalida com os dados atuais (preço e estoque podem ter mudado)
        let subtotal = checkout_subtotal(&lines)?;

        // 3. Cupom (travado para não estourar max_uses em paralelo)
        let mut discount = Decimal::ZERO;
        let mut applied_coupon = None;
        if let Some(code) = payload.coupon_code.as_deref() {
            let coupon = self
                .coupon_repo
                .find_by_code(&mut *tx, tenant_id, code, true)
                .await?
                .ok_or_else(|| AppError::InvalidCoupon("cupom não encontrado.".into()))?;
            discount = coupon.discount_for(subtotal, Utc::now())?;
            applied_coupon = Some(coupon);
        }

        // 4. Cabeçalho + itens
        let order = self
            .order_repo
            .create_order(
                &mut *tx,
                &NewOrder {
                    tenant_id,
                    user_id,
                    subtotal,
                    discount,
                    total: subtotal - discount,
                    coupon_code: applied_coupon.as_ref().map(|c| c.code.as_str()),
                    notes: payload.notes.as_deref(),
                },
            )
            .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            items.push(self.order_repo.add_item(&mut *tx, tenant_id, order.id, line).await?);

            // 5. Baixa de estoque condicional (stock >= qty)
            let decremented = self
                .catalog_repo
                .decrement_stock(&mut *tx, tenant_id, line.product_id, line.quantity)
                .await?;
            if !decremented {
                return Err(AppError::InsufficientStock {
                    product: line.name.clone(),
                    available: line.stock,
                });
            }
        }

        // 6. Uso do cupom e limpeza do carrinho
        if let Some(coupon) = &applied_coupon {
            self.coupon_repo.increment_usage(&mut *tx, coupon.id).await?;
        }
        self.cart_repo.clear(&mut *tx, cart.id).await?;

        tx.commit().await?;

        tracing::info!(
            %tenant_id,
            order_id = %order.id,
            total = %order.total,
            "🛒 Pedido criado"
        );

        self.notify_order_received(&order).await;
        Ok(OrderDetail { header: order, items })
    }

    pub async fn list_my_orders(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Vec<Order>, AppError> {
        self.order_repo.list(tenant_id, Some(user_id), None).await
    }

    /// Pedido de outro cliente é tratado como inexistente.
    pub async fn get_my_order(&self, tenant_id: Uuid, user_id: Uuid, order_id: Uuid) -> Result<OrderDetail, AppError> {
        let detail = self.get_order(tenant_id, order_id).await?;
        if detail.header.user_id != user_id {
            return Err(AppError::NotFound("Pedido"));
        }
        Ok(detail)
    }

    pub async fn list_orders(&self, tenant_id: Uuid, status: Option<&str>) -> Result<Vec<Order>, AppError> {
        let status = status.map(str::parse::<OrderStatus>).transpose()?;
        self.order_repo.list(tenant_id, None, status).await
    }

    pub async fn get_order(&self, tenant_id: Uuid, order_id: Uuid) -> Result<OrderDetail, AppError> {
        let header = self
            .order_repo
            .find(tenant_id, order_id)
            .await?
            .ok_or(AppError::NotFound("Pedido"))?;
        let items = self.order_repo.items(tenant_id, order_id).await?;
        Ok(OrderDetail { header, items })
    }

    pub async fn update_status(&self, tenant_id: Uuid, order_id: Uuid, status: &str) -> Result<Order, AppError> {
        let status: OrderStatus = status.parse()?;
        let order = self.order_repo.update_status(tenant_id, order_id, status).await?;
        tracing::info!(%tenant_id, %order_id, status = status.as_str(), "Status do pedido alterado");
        Ok(order)
    }

    async fn notify_order_received(&self, order: &Order) {
        let user = match self.user_repo.find_by_id(order.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Cliente do pedido não carregado para notificação");
                return;
            }
        };

        enqueue(
            self.jobs.as_ref(),
            Job::Email {
                to: user.email,
                subject: "Recebemos seu pedido".into(),
                body: format!(
                    "Olá, {}!\n\nSeu pedido {} foi registrado. Total: {}.",
                    user.full_name, order.id, order.total
                ),
            },
        )
        .await;
    }
}

/// Subtotal do carrinho com as regras do checkout: carrinho vazio,
/// produto desativado e falta de estoque interrompem o pedido.
fn checkout_subtotal(lines: &[CartLine]) -> Result<Decimal, AppError> {
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }
    for line in lines {
        if !line.is_active {
            return Err(AppError::BadRequest(format!(
                "O produto '{}' não está mais disponível.",
                line.name
            )));
        }
        ensure_stock(&line.name, line.stock, 0, line.quantity)?;
    }
    Ok(lines.iter().map(CartLine::line_total).sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, price: i64, quantity: i32, stock: i32) -> CartLine {
        CartLine {
            product_id: Uuid::new_v4(),
            name: name.into(),
            sku: name.to_uppercase(),
            unit_price: Decimal::new(price, 2),
            quantity,
            stock,
            is_active: true,
        }
    }

    #[test]
    fn empty_cart_cannot_be_checked_out() {
        assert!(matches!(checkout_subtotal(&[]), Err(AppError::EmptyCart)));
    }

    #[test]
    fn subtotal_uses_current_prices() {
        let lines = vec![line("camisa", 5000, 2, 10), line("meia", 1250, 1, 3)];
        assert_eq!(checkout_subtotal(&lines).unwrap(), Decimal::new(11250, 2));
    }

    #[test]
    fn stock_shortage_blocks_checkout() {
        let lines = vec![line("camisa", 5000, 4, 3)];
        assert!(matches!(
            checkout_subtotal(&lines),
            Err(AppError::InsufficientStock { available: 3, .. })
        ));
    }

    #[test]
    fn inactive_product_blocks_checkout() {
        let mut inactive = line("boné", 3000, 1, 5);
        inactive.is_active = false;
        let err = checkout_subtotal(&[inactive]).unwrap_err();
        assert!(err.to_string().contains("boné"));
    }
}
