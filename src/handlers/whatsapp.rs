// src/handlers/whatsapp.rs

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
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
    middleware::{
        rbac::{PermWhatsAppRead, PermWhatsAppWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::whatsapp::{
        Conversation, Message, SendMessagePayload, UpsertWhatsAppConfigPayload, WebhookPayload, WebhookVerifyQuery,
        WhatsAppConfig,
    },
};

// =============================================================================
//  WEBHOOK DA META (público)
// =============================================================================

// GET /api/webhooks/whatsapp
#[utoipa::path(
    get,
    path = "/api/webhooks/whatsapp",
    tag = "WhatsApp",
    params(WebhookVerifyQuery),
    responses(
        (status = 200, description = "Devolve o hub.challenge em texto puro", body = String),
        (status = 403, description = "Token de verificação não confere")
    )
)]
pub async fn verify_webhook(
    State(app_state): State<AppState>,
    Query(query): Query<WebhookVerifyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let challenge = app_state
        .whatsapp_service
        .verify_webhook(
            query.mode.as_deref(),
            query.verify_token.as_deref(),
            query.challenge.as_deref(),
        )
        .await?;
    Ok(challenge)
}

// POST /api/webhooks/whatsapp
// Sempre 200: a Meta reenvia qualquer outra resposta.
#[utoipa::path(
    post,
    path = "/api/webhooks/whatsapp",
    tag = "WhatsApp",
    request_body(content = String, description = "Payload whatsapp_business_account da Meta", content_type = "application/json"),
    responses((status = 200, description = "Evento recebido"))
)]
pub async fn receive_webhook(State(app_state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match serde_json::from_slice::<WebhookPayload>(&body) {
        Ok(payload) => {
            let summary = app_state.whatsapp_service.process_webhook(&payload).await;
            tracing::info!(
                stored = summary.stored_messages,
                statuses = summary.applied_statuses,
                skipped = summary.skipped_changes,
                "📨 Webhook do WhatsApp processado"
            );
        }
        Err(e) => tracing::warn!(error = %e, "Webhook do WhatsApp com corpo inválido; ignorado"),
    }
    StatusCode::OK
}

// =============================================================================
//  PAINEL
// =============================================================================

// GET /api/admin/whatsapp/config
#[utoipa::path(
    get,
    path = "/api/admin/whatsapp/config",
    tag = "WhatsApp",
    responses(
        (status = 200, description = "Configuração (sem os tokens)", body = WhatsAppConfig),
        (status = 404, description = "Loja ainda não configurou o WhatsApp")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn get_config(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermWhatsAppRead>,
) -> Result<impl IntoResponse, AppError> {
    let config = app_state.whatsapp_service.get_config(tenant.0).await?;
    Ok(ok(config))
}

// PUT /api/admin/whatsapp/config
#[utoipa::path(
    put,
    path = "/api/admin/whatsapp/config",
    tag = "WhatsApp",
    request_body = UpsertWhatsAppConfigPayload,
    responses(
        (status = 200, description = "Configuração salva", body = WhatsAppConfig),
        (status = 409, description = "phoneNumberId já usado por outra loja")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn upsert_config(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermWhatsAppWrite>,
    Json(payload): Json<UpsertWhatsAppConfigPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let config = app_state.whatsapp_service.upsert_config(tenant.0, &payload).await?;
    Ok(ok(config))
}

// GET /api/admin/whatsapp/conversations
#[utoipa::path(
    get,
    path = "/api/admin/whatsapp/conversations",
    tag = "WhatsApp",
    responses((status = 200, description = "Conversas (mais recentes primeiro)", body = Vec<Conversation>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_conversations(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermWhatsAppRead>,
) -> Result<impl IntoResponse, AppError> {
    let conversations = app_state.whatsapp_service.list_conversations(tenant.0).await?;
    Ok(ok(conversations))
}

// GET /api/admin/whatsapp/conversations/{id}/messages
#[utoipa::path(
    get,
    path = "/api/admin/whatsapp/conversations/{id}/messages",
    tag = "WhatsApp",
    responses((status = 200, description = "Mensagens da conversa; zera o contador de não lidas", body = Vec<Message>)),
    params(
        ("id" = Uuid, Path, description = "ID da Conversa"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_messages(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermWhatsAppRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let messages = app_state.whatsapp_service.list_messages(tenant.0, id).await?;
    Ok(ok(messages))
}

// POST /api/admin/whatsapp/messages
#[utoipa::path(
    post,
    path = "/api/admin/whatsapp/messages",
    tag = "WhatsApp",
    request_body = SendMessagePayload,
    responses(
        (status = 201, description = "Mensagem enviada", body = Message),
        (status = 502, description = "Falha na API do WhatsApp")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn send_message(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermWhatsAppWrite>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let message = app_state.whatsapp_service.send_text(tenant.0, &payload).await?;
    Ok(created(message))
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use sqlx::postgres::PgPoolOptions;
    use tracing_test::traced_test;

    use super::*;
    use crate::{
        config::Config,
        services::{jobs::InMemoryJobQueue, permission_cache::InMemoryPermissionCache},
    };

    fn state() -> AppState {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost:1/unused".to_string()),
            "JWT_SECRET" => Some("segredo".to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(50))
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState::from_parts(
            config,
            pool,
            Arc::new(InMemoryPermissionCache::new(Duration::from_secs(60))),
            Arc::new(InMemoryJobQueue::new()),
        )
    }

    #[traced_test]
    #[tokio::test]
    async fn webhook_summary_is_logged_once() {
        let body = Bytes::from_static(br#"{"entry":[{"changes":[{"value":{}}]}]}"#);
        let response = receive_webhook(State(state()), body).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        logs_assert(|lines: &[&str]| {
            let count = lines
                .iter()
                .filter(|line| line.contains("Webhook do WhatsApp processado"))
                .count();
            match count {
                1 => Ok(()),
                n => Err(format!("resumo do webhook logado {n} vezes")),
            }
        });
    }
}
