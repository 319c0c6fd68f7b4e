// src/handlers/notifications.rs

use axum::{extract::State, response::IntoResponse, Json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, response::ok},
    config::AppState,
    middleware::{
        rbac::{PermNotificationSend, RequirePermission},
        tenancy::TenantContext,
    },
    models::notification::{DeliveryReport, NotifyPayload},
};

// POST /api/admin/notifications
#[utoipa::path(
    post,
    path = "/api/admin/notifications",
    tag = "Notifications",
    request_body = NotifyPayload,
    responses(
        (status = 200, description = "Um relatório por canal; falha num canal não derruba os outros", body = Vec<DeliveryReport>)
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn send_notification(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermNotificationSend>,
    Json(payload): Json<NotifyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let reports = app_state.notification_service.notify(tenant.0, &payload).await?;
    Ok(ok(reports))
}
