// src/models/notification.rs

use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Email,
    #[serde(rename = "WHATSAPP")]
    WhatsApp,
    Push,
}

// Para onde mandar em cada canal. Canal sem destinatário é ignorado.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recipients {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub push_token: Option<String>,
}

impl Recipients {
    pub fn address_for(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Email => self.email.as_deref(),
            Channel::WhatsApp => self.phone.as_deref(),
            Channel::Push => self.push_token.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppTemplate {
    #[schema(example = "appointment_confirmed")]
    pub name: String,
    #[schema(example = "pt_BR")]
    pub language: String,
    #[serde(default)]
    #[schema(example = json!(["Ana", "10/03 às 14:00"]))]
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    pub subject: String,
    pub body: String,
    // Se presente, o WhatsApp usa template (obrigatório fora da janela de 24h).
    pub template: Option<WhatsAppTemplate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Sent,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub channel: Channel,
    pub status: DeliveryStatus,
    pub detail: Option<String>,
}

impl DeliveryReport {
    pub fn sent(channel: Channel) -> Self {
        Self { channel, status: DeliveryStatus::Sent, detail: None }
    }

    pub fn skipped(channel: Channel, reason: &str) -> Self {
        Self { channel, status: DeliveryStatus::Skipped, detail: Some(reason.to_string()) }
    }

    pub fn failed(channel: Channel, error: String) -> Self {
        Self { channel, status: DeliveryStatus::Failed, detail: Some(error) }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotifyPayload {
    #[validate(length(min = 1, message = "Informe pelo menos um canal."))]
    pub channels: Vec<Channel>,
    pub recipients: Recipients,
    #[validate(length(min = 1, message = "O assunto é obrigatório."))]
    pub subject: String,
    #[validate(length(min = 1, message = "A mensagem é obrigatória."))]
    pub body: String,
    pub template: Option<WhatsAppTemplate>,
}

// ---
// Jobs da fila de notificações
// ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Job {
    Email {
        to: String,
        subject: String,
        body: String,
    },
    #[serde(rename = "whatsapp_template")]
    WhatsAppTemplate {
        tenant_id: Uuid,
        to: String,
        template: String,
        language: Option<String>,
        parameters: Vec<String>,
    },
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Job::Email { .. } => "email",
            Job::WhatsAppTemplate { .. } => "whatsapp_template",
        }
    }
}

// O que realmente vai para a fila: o job + quantas tentativas já falharam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub id: Uuid,
    pub attempts: u32,
    pub job: Job,
}

impl JobEnvelope {
    pub fn new(job: Job) -> Self {
        Self { id: Uuid::new_v4(), attempts: 0, job }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipients_map_to_channels() {
        let r = Recipients {
            email: Some("a@b.com".into()),
            phone: None,
            push_token: Some("tok".into()),
        };
        assert_eq!(r.address_for(Channel::Email), Some("a@b.com"));
        assert_eq!(r.address_for(Channel::WhatsApp), None);
        assert_eq!(r.address_for(Channel::Push), Some("tok"));
    }

    #[test]
    fn job_envelope_survives_json() {
        let env = JobEnvelope::new(Job::WhatsAppTemplate {
            tenant_id: Uuid::new_v4(),
            to: "5511999998888".into(),
            template: "appointment_confirmed".into(),
            language: None,
            parameters: vec!["Ana".into()],
        });
        let raw = serde_json::to_string(&env).unwrap();
        assert!(raw.contains("\"kind\":\"whatsapp_template\""));
        let back: JobEnvelope = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn delivery_report_uses_wire_names() {
        let report = DeliveryReport::failed(Channel::WhatsApp, "timeout".into());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["channel"], "WHATSAPP");
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["detail"], "timeout");
    }
}
