// src/handlers/orders.rs

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::AppError, response::ok},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermOrderRead, PermOrderWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::order::{Order, OrderDetail, OrderFilter, UpdateOrderStatusPayload},
};

// --- Cliente ---

// GET /api/shop/orders
#[utoipa::path(
    get,
    path = "/api/shop/orders",
    tag = "Shop",
    responses((status = 200, description = "Pedidos do cliente nesta loja", body = Vec<Order>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_my_orders(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let orders = app_state.order_service.list_my_orders(tenant.0, user.id).await?;
    Ok(ok(orders))
}

// GET /api/shop/orders/{id}
#[utoipa::path(
    get,
    path = "/api/shop/orders/{id}",
    tag = "Shop",
    responses(
        (status = 200, description = "Pedido com itens", body = OrderDetail),
        (status = 404, description = "Pedido não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Pedido"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.order_service.get_my_order(tenant.0, user.id, id).await?;
    Ok(ok(order))
}

// --- Painel ---

// GET /api/admin/orders
#[utoipa::path(
    get,
    path = "/api/admin/orders",
    tag = "Orders",
    responses(
        (status = 200, description = "Pedidos da loja (mais recentes primeiro)", body = Vec<Order>),
        (status = 400, description = "Filtro de status inválido")
    ),
    params(OrderFilter, ("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermOrderRead>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, AppError> {
    let orders = app_state
        .order_service
        .list_orders(tenant.0, filter.status.as_deref())
        .await?;
    Ok(ok(orders))
}

// GET /api/admin/orders/{id}
#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    tag = "Orders",
    responses((status = 200, description = "Pedido com itens", body = OrderDetail)),
    params(
        ("id" = Uuid, Path, description = "ID do Pedido"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermOrderRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.order_service.get_order(tenant.0, id).await?;
    Ok(ok(order))
}

// PATCH /api/admin/orders/{id}/status
#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    tag = "Orders",
    request_body = UpdateOrderStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Order),
        (status = 400, description = "Status fora do conjunto permitido")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Pedido"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order_status(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermOrderWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .order_service
        .update_status(tenant.0, id, &payload.status)
        .await?;
    Ok(ok(order))
}
