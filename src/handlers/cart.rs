// src/handlers/cart.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        response::{created, ok},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{
        cart::{AddToCartPayload, CartView, UpdateCartItemPayload},
        order::{CheckoutPayload, OrderDetail},
    },
};

// GET /api/shop/cart
#[utoipa::path(
    get,
    path = "/api/shop/cart",
    tag = "Shop",
    responses((status = 200, description = "Carrinho do cliente nesta loja", body = CartView)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn get_cart(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let cart = app_state.cart_service.get_cart(tenant.0, user.id).await?;
    Ok(ok(cart))
}

// POST /api/shop/cart/items
#[utoipa::path(
    post,
    path = "/api/shop/cart/items",
    tag = "Shop",
    request_body = AddToCartPayload,
    responses(
        (status = 200, description = "Item somado ao carrinho", body = CartView),
        (status = 404, description = "Produto não encontrado ou inativo"),
        (status = 409, description = "Estoque insuficiente")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn add_item(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<AddToCartPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let cart = app_state
        .cart_service
        .add_item(tenant.0, user.id, payload.product_id, payload.quantity)
        .await?;
    Ok(ok(cart))
}

// PUT /api/shop/cart/items/{product_id}
#[utoipa::path(
    put,
    path = "/api/shop/cart/items/{product_id}",
    tag = "Shop",
    request_body = UpdateCartItemPayload,
    responses((status = 200, description = "Quantidade alterada (0 remove)", body = CartView)),
    params(
        ("product_id" = Uuid, Path, description = "ID do Produto"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let cart = app_state
        .cart_service
        .update_item(tenant.0, user.id, product_id, payload.quantity)
        .await?;
    Ok(ok(cart))
}

// DELETE /api/shop/cart/items/{product_id}
#[utoipa::path(
    delete,
    path = "/api/shop/cart/items/{product_id}",
    tag = "Shop",
    responses((status = 200, description = "Item removido", body = CartView)),
    params(
        ("product_id" = Uuid, Path, description = "ID do Produto"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_item(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let cart = app_state.cart_service.remove_item(tenant.0, user.id, product_id).await?;
    Ok(ok(cart))
}

// DELETE /api/shop/cart
#[utoipa::path(
    delete,
    path = "/api/shop/cart",
    tag = "Shop",
    responses((status = 200, description = "Carrinho esvaziado", body = CartView)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn clear_cart(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let cart = app_state.cart_service.clear(tenant.0, user.id).await?;
    Ok(ok(cart))
}

// POST /api/shop/checkout
#[utoipa::path(
    post,
    path = "/api/shop/checkout",
    tag = "Shop",
    request_body = CheckoutPayload,
    responses(
        (status = 201, description = "Pedido criado a partir do carrinho", body = OrderDetail),
        (status = 400, description = "Carrinho vazio ou cupom inválido"),
        (status = 409, description = "Estoque insuficiente")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn checkout(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let order = app_state.order_service.checkout(tenant.0, user.id, &payload).await?;
    Ok(created(order))
}
