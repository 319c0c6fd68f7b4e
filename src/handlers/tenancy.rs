// src/handlers/tenancy.rs

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
        auth::AuthenticatedUser,
        rbac::{PermMemberRead, PermMemberWrite, PermTenantWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::tenancy::{
        AddMemberPayload, ChangeMemberRolePayload, CreateTenantPayload, Tenant, TenantMember, UpdateTenantPayload,
        UserTenant,
    },
};

// POST /api/tenants
#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "Tenancy",
    request_body = CreateTenantPayload,
    responses(
        (status = 201, description = "Loja criada; o criador vira dono", body = Tenant),
        (status = 409, description = "Slug já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    // Precisamos do utilizador autenticado para o podermos tornar "dono"
    user: AuthenticatedUser,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let tenant = app_state.tenant_service.create_tenant(user.id, &payload).await?;
    Ok(created(tenant))
}

// GET /api/tenants
#[utoipa::path(
    get,
    path = "/api/tenants",
    tag = "Tenancy",
    responses((status = 200, description = "Lojas das quais o usuário é membro", body = Vec<UserTenant>)),
    security(("api_jwt" = []))
)]
pub async fn list_my_tenants(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let tenants = app_state.auth_service.get_user_tenants(user.id).await?;
    Ok(ok(tenants))
}

// GET /api/tenant
#[utoipa::path(
    get,
    path = "/api/tenant",
    tag = "Tenancy",
    responses((status = 200, description = "Dados da loja atual", body = Tenant)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn get_current_tenant(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let tenant = app_state.tenant_service.get_tenant(tenant.0).await?;
    Ok(ok(tenant))
}

// PUT /api/tenant
#[utoipa::path(
    put,
    path = "/api/tenant",
    tag = "Tenancy",
    request_body = UpdateTenantPayload,
    responses((status = 200, description = "Loja atualizada", body = Tenant)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn update_current_tenant(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermTenantWrite>,
    Json(payload): Json<UpdateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let tenant = app_state.tenant_service.update_tenant(tenant.0, &payload).await?;
    Ok(ok(tenant))
}

// GET /api/tenant/members
#[utoipa::path(
    get,
    path = "/api/tenant/members",
    tag = "Tenancy",
    responses((status = 200, description = "Equipe da loja", body = Vec<TenantMember>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermMemberRead>,
) -> Result<impl IntoResponse, AppError> {
    let members = app_state.tenant_service.list_members(tenant.0).await?;
    Ok(ok(members))
}

// POST /api/tenant/members
#[utoipa::path(
    post,
    path = "/api/tenant/members",
    tag = "Tenancy",
    request_body = AddMemberPayload,
    responses(
        (status = 201, description = "Membro adicionado; devolve a equipe atualizada", body = Vec<TenantMember>),
        (status = 404, description = "Usuário ou cargo não encontrado")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn add_member(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermMemberWrite>,
    Json(payload): Json<AddMemberPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let members = app_state
        .tenant_service
        .add_member(tenant.0, &payload.email, payload.role_id)
        .await?;
    Ok(created(members))
}

// PUT /api/tenant/members/{user_id}
#[utoipa::path(
    put,
    path = "/api/tenant/members/{user_id}",
    tag = "Tenancy",
    request_body = ChangeMemberRolePayload,
    responses((status = 200, description = "Cargo do membro alterado")),
    params(
        ("user_id" = Uuid, Path, description = "ID do Usuário"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_member_role(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermMemberWrite>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ChangeMemberRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .tenant_service
        .change_member_role(tenant.0, user_id, payload.role_id)
        .await?;
    Ok(message("Cargo do membro atualizado."))
}

// DELETE /api/tenant/members/{user_id}
#[utoipa::path(
    delete,
    path = "/api/tenant/members/{user_id}",
    tag = "Tenancy",
    responses((status = 200, description = "Membro removido da loja")),
    params(
        ("user_id" = Uuid, Path, description = "ID do Usuário"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_member(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermMemberWrite>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .tenant_service
        .remove_member(tenant.0, user.id, user_id)
        .await?;
    Ok(message("Membro removido."))
}
