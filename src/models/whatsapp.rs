// src/models/whatsapp.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Credenciais da WhatsApp Business API de cada loja.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppConfig {
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "109876543210987")]
    pub phone_number_id: String,
    pub business_account_id: Option<String>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub access_token: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub verify_token: String,
    #[schema(example = "pt_BR")]
    pub default_language: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertWhatsAppConfigPayload {
    #[validate(length(min = 1, message = "O phoneNumberId é obrigatório."))]
    pub phone_number_id: String,
    pub business_account_id: Option<String>,
    #[validate(length(min = 1, message = "O accessToken é obrigatório."))]
    pub access_token: String,
    #[validate(length(min = 8, message = "O verifyToken deve ter no mínimo 8 caracteres."))]
    pub verify_token: String,
    pub default_language: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "5511999998888")]
    pub wa_id: String,
    pub contact_name: Option<String>,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "message_direction", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub conversation_id: Uuid,
    pub wa_message_id: Option<String>,
    pub direction: MessageDirection,
    #[schema(example = "text")]
    pub message_type: String,
    pub body: Option<String>,
    #[schema(example = "delivered")]
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendMessagePayload {
    #[validate(length(min = 8, max = 20, message = "Número de telefone inválido."))]
    #[schema(example = "5511999998888")]
    pub to: String,
    #[validate(length(min = 1, max = 4096, message = "A mensagem deve ter entre 1 e 4096 caracteres."))]
    pub text: String,
}

// ---
// Webhook da Meta (formato "whatsapp_business_account")
// Só os campos que usamos; o resto é ignorado pelo serde.
// ---

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WebhookVerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookChange {
    pub value: WebhookValue,
}

#[derive(Debug, Deserialize)]
pub struct WebhookValue {
    pub metadata: Option<WebhookMetadata>,
    #[serde(default)]
    pub contacts: Vec<WebhookContact>,
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
    #[serde(default)]
    pub statuses: Vec<StatusUpdate>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMetadata {
    pub phone_number_id: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookContact {
    pub wa_id: String,
    pub profile: Option<ContactProfile>,
}

#[derive(Debug, Deserialize)]
pub struct ContactProfile {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    pub from: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub id: String,
    pub status: String,
}

impl WebhookValue {
    pub fn contact_name(&self, wa_id: &str) -> Option<&str> {
        self.contacts
            .iter()
            .find(|c| c.wa_id == wa_id)
            .and_then(|c| c.profile.as_ref())
            .and_then(|p| p.name.as_deref())
    }
}

impl InboundMessage {
    pub fn body(&self) -> Option<&str> {
        self.text.as_ref().map(|t| t.body.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "object": "whatsapp_business_account",
      "entry": [{
        "id": "WABA_ID",
        "changes": [{
          "field": "messages",
          "value": {
            "messaging_product": "whatsapp",
            "metadata": { "display_phone_number": "15550001111", "phone_number_id": "PHONE_ID_1" },
            "contacts": [{ "profile": { "name": "Ana" }, "wa_id": "5511988887777" }],
            "messages": [{
              "from": "5511988887777", "id": "wamid.ABC", "timestamp": "1700000000",
              "type": "text", "text": { "body": "Olá, tem horário amanhã?" }
            }],
            "statuses": [{ "id": "wamid.OUT1", "status": "read", "timestamp": "1700000001" }]
          }
        }]
      }]
    }"#;

    #[test]
    fn parses_meta_webhook_payload() {
        let payload: WebhookPayload = serde_json::from_str(SAMPLE).unwrap();
        let value = &payload.entry[0].changes[0].value;

        assert_eq!(value.metadata.as_ref().unwrap().phone_number_id, "PHONE_ID_1");
        assert_eq!(value.messages[0].id, "wamid.ABC");
        assert_eq!(value.messages[0].body(), Some("Olá, tem horário amanhã?"));
        assert_eq!(value.contact_name("5511988887777"), Some("Ana"));
        assert_eq!(value.statuses[0].status, "read");
    }

    #[test]
    fn tolerates_missing_arrays() {
        let payload: WebhookPayload =
            serde_json::from_str(r#"{"entry":[{"changes":[{"value":{}}]}]}"#).unwrap();
        let value = &payload.entry[0].changes[0].value;
        assert!(value.metadata.is_none());
        assert!(value.messages.is_empty());
        assert!(value.statuses.is_empty());
    }
}
