// src/services/whatsapp_api.rs

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::error::AppError;

// Cliente mínimo da WhatsApp Cloud API (Graph API da Meta).
// As credenciais são da loja, então vão em cada chamada.
#[derive(Clone)]
pub struct WhatsAppApi {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

impl WhatsAppApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn messages_url(&self, phone_number_id: &str) -> String {
        format!("{}/{}/messages", self.base_url, phone_number_id)
    }

    /// Texto livre. Só funciona dentro da janela de 24h aberta pelo cliente.
    pub async fn send_text(
        &self,
        phone_number_id: &str,
        access_token: &str,
        to: &str,
        text: &str,
    ) -> Result<String, AppError> {
        let body = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": { "preview_url": false, "body": text }
        });
        self.post(phone_number_id, access_token, body).await
    }

    /// Mensagem de template aprovado (avisos fora da janela de 24h).
    pub async fn send_template(
        &self,
        phone_number_id: &str,
        access_token: &str,
        to: &str,
        template: &str,
        language: &str,
        parameters: &[String],
    ) -> Result<String, AppError> {
        self.post(phone_number_id, access_token, template_body(to, template, language, parameters))
            .await
    }

    async fn post(&self, phone_number_id: &str, access_token: &str, body: Value) -> Result<String, AppError> {
        let response = self
            .client
            .post(self.messages_url(phone_number_id))
            .bearer_auth(access_token)
            .timeout(Duration::from_secs(15))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%status, %detail, "WhatsApp API recusou a mensagem");
            return Err(AppError::ExternalService(format!("WhatsApp respondeu {}", status)));
        }

        let parsed: SendResponse = response.json().await?;
        parsed
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| AppError::ExternalService("WhatsApp não devolveu o id da mensagem".into()))
    }
}

pub(crate) fn template_body(to: &str, template: &str, language: &str, parameters: &[String]) -> Value {
    let mut payload = json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "template",
        "template": {
            "name": template,
            "language": { "code": language }
        }
    });

    if !parameters.is_empty() {
        let params: Vec<Value> = parameters
            .iter()
            .map(|p| json!({ "type": "text", "text": p }))
            .collect();
        payload["template"]["components"] = json!([{ "type": "body", "parameters": params }]);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_messages_url_without_double_slash() {
        let api = WhatsAppApi::new(Client::new(), "https://graph.facebook.com/v19.0/");
        assert_eq!(
            api.messages_url("12345"),
            "https://graph.facebook.com/v19.0/12345/messages"
        );
    }

    #[test]
    fn template_body_carries_parameters() {
        let body = template_body("5511999998888", "appointment_confirmed", "pt_BR", &["Ana".into()]);
        assert_eq!(body["template"]["name"], "appointment_confirmed");
        assert_eq!(body["template"]["language"]["code"], "pt_BR");
        assert_eq!(body["template"]["components"][0]["parameters"][0]["text"], "Ana");
    }

    #[test]
    fn template_without_parameters_has_no_components() {
        let body = template_body("5511", "hello_world", "en_US", &[]);
        assert!(body["template"].get("components").is_none());
    }
}
