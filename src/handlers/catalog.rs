// src/handlers/catalog.rs

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        response::{created, message, ok},
    },
    config::AppState,
    middleware::{
        rbac::{PermCategoryWrite, PermProductWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::catalog::{
        Category, CreateCategoryPayload, CreateProductPayload, Product, ProductFilter, UpdateCategoryPayload,
        UpdateProductPayload,
    },
};

// =============================================================================
//  VITRINE (pública, só precisa do X-Tenant-ID)
// =============================================================================

// GET /api/store/products
#[utoipa::path(
    get,
    path = "/api/store/products",
    tag = "Storefront",
    responses((status = 200, description = "Produtos ativos da loja", body = Vec<Product>)),
    params(ProductFilter, ("x-tenant-id" = Uuid, Header, description = "ID da Loja"))
)]
pub async fn list_store_products(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state.catalog_service.list_products(tenant.0, &filter, true).await?;
    Ok(ok(products))
}

// GET /api/store/products/{id}
#[utoipa::path(
    get,
    path = "/api/store/products/{id}",
    tag = "Storefront",
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado ou inativo")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Produto"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn get_store_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.catalog_service.get_product(tenant.0, id, true).await?;
    Ok(ok(product))
}

// GET /api/store/categories
#[utoipa::path(
    get,
    path = "/api/store/categories",
    tag = "Storefront",
    responses((status = 200, description = "Árvore de categorias (lista plana com parentId)", body = Vec<Category>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja"))
)]
pub async fn list_store_categories(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.catalog_service.list_categories(tenant.0).await?;
    Ok(ok(categories))
}

// =============================================================================
//  ADMIN: PRODUTOS
// =============================================================================

// POST /api/admin/products
#[utoipa::path(
    post,
    path = "/api/admin/products",
    tag = "Catalog",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 409, description = "SKU já usado nesta loja")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermProductWrite>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let product = app_state.catalog_service.create_product(tenant.0, &payload).await?;
    Ok(created(product))
}

// GET /api/admin/products (inclui inativos)
#[utoipa::path(
    get,
    path = "/api/admin/products",
    tag = "Catalog",
    responses((status = 200, description = "Todos os produtos da loja", body = Vec<Product>)),
    params(ProductFilter, ("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermProductWrite>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state.catalog_service.list_products(tenant.0, &filter, false).await?;
    Ok(ok(products))
}

// GET /api/admin/products/{id}
#[utoipa::path(
    get,
    path = "/api/admin/products/{id}",
    tag = "Catalog",
    responses((status = 200, description = "Produto", body = Product)),
    params(
        ("id" = Uuid, Path, description = "ID do Produto"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermProductWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.catalog_service.get_product(tenant.0, id, false).await?;
    Ok(ok(product))
}

// PUT /api/admin/products/{id}
#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    tag = "Catalog",
    request_body = UpdateProductPayload,
    responses((status = 200, description = "Produto atualizado", body = Product)),
    params(
        ("id" = Uuid, Path, description = "ID do Produto"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermProductWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let product = app_state.catalog_service.update_product(tenant.0, id, &payload).await?;
    Ok(ok(product))
}

// DELETE /api/admin/products/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    tag = "Catalog",
    responses((status = 200, description = "Produto excluído")),
    params(
        ("id" = Uuid, Path, description = "ID do Produto"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermProductWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.catalog_service.delete_product(tenant.0, id).await?;
    Ok(message("Produto excluído."))
}

// =============================================================================
//  ADMIN: CATEGORIAS
// =============================================================================

// POST /api/admin/categories
#[utoipa::path(
    post,
    path = "/api/admin/categories",
    tag = "Catalog",
    request_body = CreateCategoryPayload,
    responses((status = 201, description = "Categoria criada", body = Category)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermCategoryWrite>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let category = app_state.catalog_service.create_category(tenant.0, &payload).await?;
    Ok(created(category))
}

// GET /api/admin/categories
#[utoipa::path(
    get,
    path = "/api/admin/categories",
    tag = "Catalog",
    responses((status = 200, description = "Categorias da loja", body = Vec<Category>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermCategoryWrite>,
) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.catalog_service.list_categories(tenant.0).await?;
    Ok(ok(categories))
}

// GET /api/admin/categories/{id}
#[utoipa::path(
    get,
    path = "/api/admin/categories/{id}",
    tag = "Catalog",
    responses((status = 200, description = "Categoria", body = Category)),
    params(
        ("id" = Uuid, Path, description = "ID da Categoria"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_category(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermCategoryWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let category = app_state.catalog_service.get_category(tenant.0, id).await?;
    Ok(ok(category))
}

// PUT /api/admin/categories/{id}
#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}",
    tag = "Catalog",
    request_body = UpdateCategoryPayload,
    responses((status = 200, description = "Categoria atualizada", body = Category)),
    params(
        ("id" = Uuid, Path, description = "ID da Categoria"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermCategoryWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let category = app_state.catalog_service.update_category(tenant.0, id, &payload).await?;
    Ok(ok(category))
}

// DELETE /api/admin/categories/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    tag = "Catalog",
    responses((status = 200, description = "Categoria excluída")),
    params(
        ("id" = Uuid, Path, description = "ID da Categoria"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermCategoryWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.catalog_service.delete_category(tenant.0, id).await?;
    Ok(message("Categoria excluída."))
}
