// src/handlers/marketing.rs

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
        response::{created, message, ok},
    },
    config::AppState,
    middleware::{
        rbac::{PermBannerRead, PermBannerWrite, PermCouponRead, PermCouponWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        banner::{Banner, BannerWithSlides, CreateBannerPayload, CreateSlidePayload, Slide, UpdateBannerPayload},
        coupon::{Coupon, CouponValidation, CreateCouponPayload, UpdateCouponPayload, ValidateCouponPayload},
    },
};

// =============================================================================
//  CUPONS
// =============================================================================

// POST /api/admin/coupons
#[utoipa::path(
    post,
    path = "/api/admin/coupons",
    tag = "Marketing",
    request_body = CreateCouponPayload,
    responses(
        (status = 201, description = "Cupom criado", body = Coupon),
        (status = 409, description = "Código já existe nesta loja")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_coupon(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermCouponWrite>,
    Json(payload): Json<CreateCouponPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let coupon = app_state.marketing_service.create_coupon(tenant.0, &payload).await?;
    Ok(created(coupon))
}

// GET /api/admin/coupons
#[utoipa::path(
    get,
    path = "/api/admin/coupons",
    tag = "Marketing",
    responses((status = 200, description = "Cupons da loja", body = Vec<Coupon>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_coupons(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermCouponRead>,
) -> Result<impl IntoResponse, AppError> {
    let coupons = app_state.marketing_service.list_coupons(tenant.0).await?;
    Ok(ok(coupons))
}

// GET /api/admin/coupons/{id}
#[utoipa::path(
    get,
    path = "/api/admin/coupons/{id}",
    tag = "Marketing",
    responses((status = 200, description = "Cupom", body = Coupon)),
    params(
        ("id" = Uuid, Path, description = "ID do Cupom"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_coupon(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermCouponRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let coupon = app_state.marketing_service.get_coupon(tenant.0, id).await?;
    Ok(ok(coupon))
}

// PUT /api/admin/coupons/{id}
#[utoipa::path(
    put,
    path = "/api/admin/coupons/{id}",
    tag = "Marketing",
    request_body = UpdateCouponPayload,
    responses((status = 200, description = "Cupom atualizado", body = Coupon)),
    params(
        ("id" = Uuid, Path, description = "ID do Cupom"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_coupon(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermCouponWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCouponPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let coupon = app_state.marketing_service.update_coupon(tenant.0, id, &payload).await?;
    Ok(ok(coupon))
}

// DELETE /api/admin/coupons/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/coupons/{id}",
    tag = "Marketing",
    responses((status = 200, description = "Cupom excluído")),
    params(
        ("id" = Uuid, Path, description = "ID do Cupom"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_coupon(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermCouponWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.marketing_service.delete_coupon(tenant.0, id).await?;
    Ok(message("Cupom excluído."))
}

// POST /api/shop/coupons/validate
#[utoipa::path(
    post,
    path = "/api/shop/coupons/validate",
    tag = "Shop",
    request_body = ValidateCouponPayload,
    responses(
        (status = 200, description = "Desconto simulado (não consome o cupom)", body = CouponValidation),
        (status = 400, description = "Cupom inválido, expirado ou esgotado")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn validate_coupon(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<ValidateCouponPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let validation = app_state.marketing_service.validate_coupon(tenant.0, &payload).await?;
    Ok(ok(validation))
}

// =============================================================================
//  BANNERS
// =============================================================================

// POST /api/admin/banners
#[utoipa::path(
    post,
    path = "/api/admin/banners",
    tag = "Marketing",
    request_body = CreateBannerPayload,
    responses((status = 201, description = "Banner criado", body = Banner)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_banner(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermBannerWrite>,
    Json(payload): Json<CreateBannerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let banner = app_state.marketing_service.create_banner(tenant.0, &payload).await?;
    Ok(created(banner))
}

// GET /api/admin/banners
#[utoipa::path(
    get,
    path = "/api/admin/banners",
    tag = "Marketing",
    responses((status = 200, description = "Banners com slides e métricas", body = Vec<BannerWithSlides>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_banners(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermBannerRead>,
) -> Result<impl IntoResponse, AppError> {
    let banners = app_state.marketing_service.list_banners(tenant.0).await?;
    Ok(ok(banners))
}

// GET /api/admin/banners/{id}
#[utoipa::path(
    get,
    path = "/api/admin/banners/{id}",
    tag = "Marketing",
    responses((status = 200, description = "Banner com slides", body = BannerWithSlides)),
    params(
        ("id" = Uuid, Path, description = "ID do Banner"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_banner(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermBannerRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let banner = app_state.marketing_service.get_banner(tenant.0, id).await?;
    Ok(ok(banner))
}

// PUT /api/admin/banners/{id}
#[utoipa::path(
    put,
    path = "/api/admin/banners/{id}",
    tag = "Marketing",
    request_body = UpdateBannerPayload,
    responses((status = 200, description = "Banner atualizado", body = Banner)),
    params(
        ("id" = Uuid, Path, description = "ID do Banner"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_banner(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermBannerWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBannerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let banner = app_state.marketing_service.update_banner(tenant.0, id, &payload).await?;
    Ok(ok(banner))
}

// DELETE /api/admin/banners/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/banners/{id}",
    tag = "Marketing",
    responses((status = 200, description = "Banner e slides excluídos")),
    params(
        ("id" = Uuid, Path, description = "ID do Banner"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_banner(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermBannerWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.marketing_service.delete_banner(tenant.0, id).await?;
    Ok(message("Banner excluído."))
}

// POST /api/admin/banners/{id}/slides
#[utoipa::path(
    post,
    path = "/api/admin/banners/{id}/slides",
    tag = "Marketing",
    request_body = CreateSlidePayload,
    responses((status = 201, description = "Slide adicionado", body = Slide)),
    params(
        ("id" = Uuid, Path, description = "ID do Banner"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_slide(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermBannerWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateSlidePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let slide = app_state.marketing_service.add_slide(tenant.0, id, &payload).await?;
    Ok(created(slide))
}

// DELETE /api/admin/banners/{id}/slides/{slide_id}
#[utoipa::path(
    delete,
    path = "/api/admin/banners/{id}/slides/{slide_id}",
    tag = "Marketing",
    responses((status = 200, description = "Slide removido")),
    params(
        ("id" = Uuid, Path, description = "ID do Banner"),
        ("slide_id" = Uuid, Path, description = "ID do Slide"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_slide(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermBannerWrite>,
    Path((id, slide_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    app_state.marketing_service.delete_slide(tenant.0, id, slide_id).await?;
    Ok(message("Slide removido."))
}

// --- Vitrine ---

// GET /api/store/banners
#[utoipa::path(
    get,
    path = "/api/store/banners",
    tag = "Storefront",
    responses((status = 200, description = "Banners ativos dentro da janela de exibição", body = Vec<BannerWithSlides>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja"))
)]
pub async fn list_live_banners(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let banners = app_state.marketing_service.list_live_banners(tenant.0).await?;
    Ok(ok(banners))
}

// POST /api/store/banners/{id}/impression
#[utoipa::path(
    post,
    path = "/api/store/banners/{id}/impression",
    tag = "Storefront",
    responses((status = 200, description = "Impressão registrada")),
    params(
        ("id" = Uuid, Path, description = "ID do Banner"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn record_impression(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.marketing_service.record_impression(tenant.0, id).await?;
    Ok(message("Impressão registrada."))
}

// POST /api/store/banners/{id}/click
#[utoipa::path(
    post,
    path = "/api/store/banners/{id}/click",
    tag = "Storefront",
    responses((status = 200, description = "Clique registrado")),
    params(
        ("id" = Uuid, Path, description = "ID do Banner"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn record_click(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.marketing_service.record_click(tenant.0, id).await?;
    Ok(message("Clique registrado."))
}
