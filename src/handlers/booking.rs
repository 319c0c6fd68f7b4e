// src/handlers/booking.rs

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
        auth::AuthenticatedUser,
        rbac::{PermAppointmentRead, PermAppointmentWrite, PermServiceWrite, PermStaffWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::booking::{
        Appointment, AppointmentFilter, AvailabilityQuery, BookAppointmentPayload, BusySlot, CreateServicePayload,
        CreateStaffPayload, Service, Staff, UpdateAppointmentStatusPayload, UpdateServicePayload, UpdateStaffPayload,
    },
};

// =============================================================================
//  VITRINE
// =============================================================================

// GET /api/store/staff
#[utoipa::path(
    get,
    path = "/api/store/staff",
    tag = "Storefront",
    responses((status = 200, description = "Profissionais ativos", body = Vec<Staff>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja"))
)]
pub async fn list_store_staff(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let staff = app_state.booking_service.list_staff(tenant.0, true).await?;
    Ok(ok(staff))
}

// GET /api/store/services
#[utoipa::path(
    get,
    path = "/api/store/services",
    tag = "Storefront",
    responses((status = 200, description = "Serviços ativos", body = Vec<Service>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja"))
)]
pub async fn list_store_services(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let services = app_state.booking_service.list_services(tenant.0, true).await?;
    Ok(ok(services))
}

// GET /api/store/staff/{id}/availability?date=YYYY-MM-DD
#[utoipa::path(
    get,
    path = "/api/store/staff/{id}/availability",
    tag = "Storefront",
    responses((status = 200, description = "Intervalos já ocupados no dia (UTC)", body = Vec<BusySlot>)),
    params(
        ("id" = Uuid, Path, description = "ID do Profissional"),
        AvailabilityQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn staff_availability(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let busy = app_state.booking_service.availability(tenant.0, id, query.date).await?;
    Ok(ok(busy))
}

// =============================================================================
//  CLIENTE
// =============================================================================

// POST /api/shop/appointments
#[utoipa::path(
    post,
    path = "/api/shop/appointments",
    tag = "Shop",
    request_body = BookAppointmentPayload,
    responses(
        (status = 201, description = "Agendamento criado como PENDING", body = Appointment),
        (status = 409, description = "Horário já ocupado")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn book_appointment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<BookAppointmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let appointment = app_state.booking_service.book(tenant.0, user.id, &payload).await?;
    Ok(created(appointment))
}

// GET /api/shop/appointments
#[utoipa::path(
    get,
    path = "/api/shop/appointments",
    tag = "Shop",
    responses((status = 200, description = "Agendamentos do cliente", body = Vec<Appointment>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_my_appointments(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let appointments = app_state.booking_service.list_my_appointments(tenant.0, user.id).await?;
    Ok(ok(appointments))
}

// POST /api/shop/appointments/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/shop/appointments/{id}/cancel",
    tag = "Shop",
    responses(
        (status = 200, description = "Agendamento cancelado", body = Appointment),
        (status = 400, description = "Agendamento já finalizado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Agendamento"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_my_appointment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = app_state.booking_service.cancel_mine(tenant.0, user.id, id).await?;
    Ok(ok(appointment))
}

// =============================================================================
//  PAINEL: PROFISSIONAIS
// =============================================================================

// POST /api/admin/staff
#[utoipa::path(
    post,
    path = "/api/admin/staff",
    tag = "Booking",
    request_body = CreateStaffPayload,
    responses((status = 201, description = "Profissional cadastrado", body = Staff)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_staff(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermStaffWrite>,
    Json(payload): Json<CreateStaffPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let staff = app_state.booking_service.create_staff(tenant.0, &payload).await?;
    Ok(created(staff))
}

// GET /api/admin/staff (inclui inativos)
#[utoipa::path(
    get,
    path = "/api/admin/staff",
    tag = "Booking",
    responses((status = 200, description = "Todos os profissionais", body = Vec<Staff>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_staff(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermStaffWrite>,
) -> Result<impl IntoResponse, AppError> {
    let staff = app_state.booking_service.list_staff(tenant.0, false).await?;
    Ok(ok(staff))
}

// GET /api/admin/staff/{id}
#[utoipa::path(
    get,
    path = "/api/admin/staff/{id}",
    tag = "Booking",
    responses(
        (status = 200, description = "Profissional", body = Staff),
        (status = 404, description = "Profissional não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Profissional"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_staff(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermStaffWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let staff = app_state.booking_service.get_staff(tenant.0, id).await?;
    Ok(ok(staff))
}

// PUT /api/admin/staff/{id}
#[utoipa::path(
    put,
    path = "/api/admin/staff/{id}",
    tag = "Booking",
    request_body = UpdateStaffPayload,
    responses((status = 200, description = "Profissional atualizado", body = Staff)),
    params(
        ("id" = Uuid, Path, description = "ID do Profissional"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_staff(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermStaffWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStaffPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let staff = app_state.booking_service.update_staff(tenant.0, id, &payload).await?;
    Ok(ok(staff))
}

// DELETE /api/admin/staff/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/staff/{id}",
    tag = "Booking",
    responses(
        (status = 200, description = "Profissional excluído"),
        (status = 409, description = "Profissional com agendamentos")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Profissional"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_staff(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermStaffWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.booking_service.delete_staff(tenant.0, id).await?;
    Ok(message("Profissional excluído."))
}

// =============================================================================
//  PAINEL: SERVIÇOS
// =============================================================================

// POST /api/admin/services
#[utoipa::path(
    post,
    path = "/api/admin/services",
    tag = "Booking",
    request_body = CreateServicePayload,
    responses((status = 201, description = "Serviço cadastrado", body = Service)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_service(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermServiceWrite>,
    Json(payload): Json<CreateServicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let service = app_state.booking_service.create_service(tenant.0, &payload).await?;
    Ok(created(service))
}

// GET /api/admin/services (inclui inativos)
#[utoipa::path(
    get,
    path = "/api/admin/services",
    tag = "Booking",
    responses((status = 200, description = "Todos os serviços", body = Vec<Service>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_services(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermServiceWrite>,
) -> Result<impl IntoResponse, AppError> {
    let services = app_state.booking_service.list_services(tenant.0, false).await?;
    Ok(ok(services))
}

// GET /api/admin/services/{id}
#[utoipa::path(
    get,
    path = "/api/admin/services/{id}",
    tag = "Booking",
    responses(
        (status = 200, description = "Serviço", body = Service),
        (status = 404, description = "Serviço não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Serviço"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_service(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermServiceWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = app_state.booking_service.get_service(tenant.0, id).await?;
    Ok(ok(service))
}

// PUT /api/admin/services/{id}
#[utoipa::path(
    put,
    path = "/api/admin/services/{id}",
    tag = "Booking",
    request_body = UpdateServicePayload,
    responses((status = 200, description = "Serviço atualizado", body = Service)),
    params(
        ("id" = Uuid, Path, description = "ID do Serviço"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_service(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermServiceWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let service = app_state.booking_service.update_service(tenant.0, id, &payload).await?;
    Ok(ok(service))
}

// DELETE /api/admin/services/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/services/{id}",
    tag = "Booking",
    responses((status = 200, description = "Serviço excluído")),
    params(
        ("id" = Uuid, Path, description = "ID do Serviço"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_service(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermServiceWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.booking_service.delete_service(tenant.0, id).await?;
    Ok(message("Serviço excluído."))
}

// =============================================================================
//  PAINEL: AGENDAMENTOS
// =============================================================================

// GET /api/admin/appointments
#[utoipa::path(
    get,
    path = "/api/admin/appointments",
    tag = "Booking",
    responses((status = 200, description = "Agenda da loja", body = Vec<Appointment>)),
    params(AppointmentFilter, ("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_appointments(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermAppointmentRead>,
    Query(filter): Query<AppointmentFilter>,
) -> Result<impl IntoResponse, AppError> {
    let appointments = app_state.booking_service.list_appointments(tenant.0, &filter).await?;
    Ok(ok(appointments))
}

// PATCH /api/admin/appointments/{id}/status
#[utoipa::path(
    patch,
    path = "/api/admin/appointments/{id}/status",
    tag = "Booking",
    request_body = UpdateAppointmentStatusPayload,
    responses(
        (status = 200, description = "Status alterado; o cliente é avisado ao confirmar ou cancelar", body = Appointment),
        (status = 400, description = "Transição não permitida")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Agendamento"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_appointment_status(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermAppointmentWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAppointmentStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = app_state
        .booking_service
        .update_status(tenant.0, id, &payload.status)
        .await?;
    Ok(ok(appointment))
}
