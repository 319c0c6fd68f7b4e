// src/services/whatsapp_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{TenantRepository, WhatsAppRepository},
    models::whatsapp::{
        Conversation, Message, MessageDirection, SendMessagePayload, UpsertWhatsAppConfigPayload, WebhookPayload,
        WebhookValue, WhatsAppConfig,
    },
    services::whatsapp_api::WhatsAppApi,
};

#[derive(Clone)]
pub struct WhatsAppService {
    repo: WhatsAppRepository,
    tenant_repo: TenantRepository,
    api: WhatsAppApi,
    // Fallback global para a verificação do webhook.
    global_verify_token: Option<String>,
}

// Resumo do processamento de um POST do webhook (log).
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WebhookSummary {
    pub stored_messages: usize,
    pub applied_statuses: usize,
    pub skipped_changes: usize,
}

impl WhatsAppService {
    pub fn new(
        repo: WhatsAppRepository,
        tenant_repo: TenantRepository,
        api: WhatsAppApi,
        global_verify_token: Option<String>,
    ) -> Self {
        Self { repo, tenant_repo, api, global_verify_token }
    }

    // --- Configuração ---

    pub async fn get_config(&self, tenant_id: Uuid) -> Result<WhatsAppConfig, AppError> {
        self.repo
            .get_config(tenant_id)
            .await?
            .ok_or(AppError::NotFound("Configuração do WhatsApp"))
    }

    pub async fn upsert_config(
        &self,
        tenant_id: Uuid,
        payload: &UpsertWhatsAppConfigPayload,
    ) -> Result<WhatsAppConfig, AppError> {
        let config = self.repo.upsert_config(tenant_id, payload).await?;
        tracing::info!(%tenant_id, phone_number_id = %config.phone_number_id, "💬 WhatsApp configurado");
        Ok(config)
    }

    // --- Webhook ---

    /// Handshake do webhook. Devolve o `hub.challenge` quando o token confere.
    pub async fn verify_webhook(
        &self,
        mode: Option<&str>,
        token: Option<&str>,
        challenge: Option<&str>,
    ) -> Result<String, AppError> {
        let (Some("subscribe"), Some(token), Some(challenge)) = (mode, token, challenge) else {
            return Err(AppError::Forbidden("Verificação do webhook inválida.".into()));
        };

        let matches_global = self.global_verify_token.as_deref() == Some(token);
        if matches_global || self.repo.verify_token_exists(token).await? {
            Ok(challenge.to_string())
        } else {
            tracing::warn!("Tentativa de verificação de webhook com token desconhecido");
            Err(AppError::Forbidden("Verificação do webhook inválida.".into()))
        }
    }

    /// Processa o POST da Meta. Erros por mudança são logados e não
    /// interrompem as demais (a Meta reenviaria tudo em caso de erro).
    pub async fn process_webhook(&self, payload: &WebhookPayload) -> WebhookSummary {
        let mut summary = WebhookSummary::default();

        for value in payload.entry.iter().flat_map(|e| e.changes.iter()).map(|c| &c.value) {
            let Some(phone_number_id) = value.metadata.as_ref().map(|m| m.phone_number_id.as_str()) else {
                summary.skipped_changes += 1;
                continue;
            };

            let tenant_id = match self.tenant_repo.find_by_whatsapp_phone_id(phone_number_id).await {
                Ok(Some(id)) => id,
                Ok(None) => {
                    tracing::warn!(%phone_number_id, "Webhook para phone_number_id desconhecido; ignorado");
                    summary.skipped_changes += 1;
                    continue;
                }
                Err(e) => {
                    tracing::error!(%phone_number_id, error = %e, "Falha ao resolver loja do webhook");
                    summary.skipped_changes += 1;
                    continue;
                }
            };

            match self.apply_change(tenant_id, value).await {
                Ok((stored, applied)) => {
                    summary.stored_messages += stored;
                    summary.applied_statuses += applied;
                }
                Err(e) => {
                    tracing::error!(%tenant_id, error = %e, "Falha ao processar mudança do webhook");
                    summary.skipped_changes += 1;
                }
            }
        }

        summary
    }

    async fn apply_change(&self, tenant_id: Uuid, value: &WebhookValue) -> Result<(usize, usize), AppError> {
        let mut stored = 0;

        if !value.messages.is_empty() {
            let mut tx = self.repo.pool().begin().await?;
            for message in &value.messages {
                let conversation = self
                    .repo
                    .touch_conversation(&mut *tx, tenant_id, &message.from, value.contact_name(&message.from), true)
                    .await?;
                let inserted = self
                    .repo
                    .insert_message(
                        &mut *tx,
                        tenant_id,
                        conversation.id,
                        Some(&message.id),
                        MessageDirection::Inbound,
                        &message.message_type,
                        message.body(),
                        "received",
                    )
                    .await?;
                if inserted.is_some() {
                    stored += 1;
                }
            }
            tx.commit().await?;
        }

        let mut applied = 0;
        for status in &value.statuses {
            if self.repo.update_message_status(tenant_id, &status.id, &status.status).await? {
                applied += 1;
            }
        }

        Ok((stored, applied))
    }

    // --- Conversas ---

    pub async fn list_conversations(&self, tenant_id: Uuid) -> Result<Vec<Conversation>, AppError> {
        self.repo.list_conversations(tenant_id).await
    }

    /// Abrir a conversa zera as não lidas.
    pub async fn list_messages(&self, tenant_id: Uuid, conversation_id: Uuid) -> Result<Vec<Message>, AppError> {
        self.repo
            .find_conversation(tenant_id, conversation_id)
            .await?
            .ok_or(AppError::NotFound("Conversa"))?;
        let messages = self.repo.list_messages(tenant_id, conversation_id).await?;
        self.repo.mark_read(tenant_id, conversation_id).await?;
        Ok(messages)
    }

    pub async fn send_text(&self, tenant_id: Uuid, payload: &SendMessagePayload) -> Result<Message, AppError> {
        let config = self.active_config(tenant_id).await?;

        let wa_message_id = self
            .api
            .send_text(&config.phone_number_id, &config.access_token, &payload.to, &payload.text)
            .await?;

        let mut tx = self.repo.pool().begin().await?;
        let conversation = self
            .repo
            .touch_conversation(&mut *tx, tenant_id, &payload.to, None, false)
            .await?;
        let message = self
            .repo
            .insert_message(
                &mut *tx,
                tenant_id,
                conversation.id,
                Some(&wa_message_id),
                MessageDirection::Outbound,
                "text",
                Some(&payload.text),
                "sent",
            )
            .await?
            .ok_or_else(|| AppError::Conflict("Mensagem já registrada.".into()))?;
        tx.commit().await?;

        Ok(message)
    }

    pub async fn active_config(&self, tenant_id: Uuid) -> Result<WhatsAppConfig, AppError> {
        let config = self.get_config(tenant_id).await?;
        if !config.is_active {
            return Err(AppError::BadRequest("A integração com o WhatsApp está desativada.".into()));
        }
        Ok(config)
    }

    pub fn api(&self) -> &WhatsAppApi {
        &self.api
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service(global: Option<&str>) -> WhatsAppService {
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(50))
            .connect_lazy("postgres://localhost:1/unused")
            .unwrap();
        WhatsAppService::new(
            WhatsAppRepository::new(pool.clone()),
            TenantRepository::new(pool),
            WhatsAppApi::new(reqwest::Client::new(), "http://localhost:1"),
            global.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn global_token_answers_the_challenge_without_database() {
        let svc = service(Some("token-global"));
        let challenge = svc
            .verify_webhook(Some("subscribe"), Some("token-global"), Some("12345"))
            .await
            .unwrap();
        assert_eq!(challenge, "12345");
    }

    #[tokio::test]
    async fn wrong_mode_is_forbidden() {
        let svc = service(Some("token-global"));
        let err = svc
            .verify_webhook(Some("unsubscribe"), Some("token-global"), Some("12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn changes_without_metadata_are_skipped() {
        let svc = service(None);
        let payload: WebhookPayload =
            serde_json::from_str(r#"{"entry":[{"changes":[{"value":{}}, {"value":{}}]}]}"#).unwrap();
        let summary = svc.process_webhook(&payload).await;
        assert_eq!(summary, WebhookSummary { skipped_changes: 2, ..Default::default() });
    }
}
