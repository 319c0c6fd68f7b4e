// src/handlers/rbac.rs

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
        rbac::{PermRoleRead, PermRoleWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::rbac::{CreateRolePayload, Permission, Role, RoleResponse, UpdateRolePayload},
};

// GET /api/permissions (Para o frontend saber o que mostrar na tela de criação)
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "RBAC",
    responses((status = 200, description = "Catálogo de permissões do sistema", body = Vec<Permission>)),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let permissions = app_state.rbac_service.list_system_permissions().await?;
    Ok(ok(permissions))
}

// POST /api/roles
#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "RBAC",
    request_body = CreateRolePayload,
    responses(
        (status = 201, description = "Cargo criado", body = RoleResponse),
        (status = 400, description = "Permissão desconhecida"),
        (status = 409, description = "Já existe um cargo com esse nome")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermRoleWrite>,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let response = app_state
        .rbac_service
        .create_role_with_permissions(tenant.0, &payload)
        .await?;
    Ok(created(response))
}

// GET /api/roles
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "RBAC",
    responses((status = 200, description = "Cargos da loja", body = Vec<Role>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermRoleRead>,
) -> Result<impl IntoResponse, AppError> {
    let roles = app_state.rbac_service.list_roles(tenant.0).await?;
    Ok(ok(roles))
}

// GET /api/roles/{id}
#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    tag = "RBAC",
    responses(
        (status = 200, description = "Cargo com suas permissões", body = RoleResponse),
        (status = 404, description = "Cargo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Cargo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_role(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermRoleRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let role = app_state.rbac_service.get_role(tenant.0, id).await?;
    Ok(ok(role))
}

// PUT /api/roles/{id}
#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    tag = "RBAC",
    request_body = UpdateRolePayload,
    responses((status = 200, description = "Cargo atualizado", body = RoleResponse)),
    params(
        ("id" = Uuid, Path, description = "ID do Cargo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_role(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermRoleWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let role = app_state.rbac_service.update_role(tenant.0, id, &payload).await?;
    Ok(ok(role))
}

// DELETE /api/roles/{id}
#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    tag = "RBAC",
    responses(
        (status = 200, description = "Cargo excluído"),
        (status = 409, description = "Cargo ainda atribuído a membros")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Cargo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_role(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermRoleWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.rbac_service.delete_role(tenant.0, id).await?;
    Ok(message("Cargo excluído."))
}
