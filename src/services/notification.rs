// src/services/notification.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde_json::json;

use crate::{
    common::error::AppError,
    models::notification::{Channel, DeliveryReport, NotificationMessage, Recipients},
    services::whatsapp_api::WhatsAppApi,
};

/// Um canal de entrega (e-mail, WhatsApp, push).
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    fn channel(&self) -> Channel;
    async fn send(&self, to: &str, message: &NotificationMessage) -> Result<(), AppError>;
}

// ---
// E-mail (API HTTP transacional, ex: Resend/SendGrid)
// ---

pub struct EmailProvider {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl EmailProvider {
    pub fn new(client: Client, api_url: String, api_key: String, from: String) -> Self {
        Self { client, api_url, api_key, from }
    }
}

#[async_trait]
impl NotificationProvider for EmailProvider {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, to: &str, message: &NotificationMessage) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(15))
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": message.subject,
                "text": message.body,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "API de e-mail respondeu {}",
                response.status()
            )));
        }
        Ok(())
    }
}

// ---
// WhatsApp (credenciais da loja)
// ---

pub struct WhatsAppProvider {
    api: WhatsAppApi,
    phone_number_id: String,
    access_token: String,
    default_language: String,
}

impl WhatsAppProvider {
    pub fn new(api: WhatsAppApi, phone_number_id: String, access_token: String, default_language: String) -> Self {
        Self { api, phone_number_id, access_token, default_language }
    }
}

#[async_trait]
impl NotificationProvider for WhatsAppProvider {
    fn channel(&self) -> Channel {
        Channel::WhatsApp
    }

    async fn send(&self, to: &str, message: &NotificationMessage) -> Result<(), AppError> {
        match &message.template {
            Some(template) => {
                let language = if template.language.is_empty() {
                    &self.default_language
                } else {
                    &template.language
                };
                self.api
                    .send_template(
                        &self.phone_number_id,
                        &self.access_token,
                        to,
                        &template.name,
                        language,
                        &template.parameters,
                    )
                    .await?;
            }
            None => {
                self.api
                    .send_text(&self.phone_number_id, &self.access_token, to, &message.body)
                    .await?;
            }
        }
        Ok(())
    }
}

// ---
// Push (gateway HTTP, ex: FCM via proxy)
// ---

pub struct PushProvider {
    client: Client,
    api_url: String,
    api_key: String,
}

impl PushProvider {
    pub fn new(client: Client, api_url: String, api_key: String) -> Self {
        Self { client, api_url, api_key }
    }
}

#[async_trait]
impl NotificationProvider for PushProvider {
    fn channel(&self) -> Channel {
        Channel::Push
    }

    async fn send(&self, to: &str, message: &NotificationMessage) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(10))
            .json(&json!({
                "to": to,
                "notification": { "title": message.subject, "body": message.body }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Gateway de push respondeu {}",
                response.status()
            )));
        }
        Ok(())
    }
}

// ---
// Dispatcher
// ---

/// Envia a mesma mensagem por vários canais em paralelo.
/// Falha de um canal não derruba os outros; cada um vira um `DeliveryReport`.
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    providers: HashMap<Channel, Arc<dyn NotificationProvider>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn NotificationProvider>) -> Self {
        self.providers.insert(provider.channel(), provider);
        self
    }

    pub async fn notify(
        &self,
        channels: &[Channel],
        recipients: &Recipients,
        message: &NotificationMessage,
    ) -> Vec<DeliveryReport> {
        let mut requested: Vec<Channel> = Vec::with_capacity(channels.len());
        for channel in channels {
            if !requested.contains(channel) {
                requested.push(*channel);
            }
        }

        let sends = requested.into_iter().map(|channel| async move {
            let Some(provider) = self.providers.get(&channel) else {
                return DeliveryReport::skipped(channel, "canal não configurado");
            };
            let Some(to) = recipients.address_for(channel) else {
                return DeliveryReport::skipped(channel, "sem destinatário para o canal");
            };

            match provider.send(to, message).await {
                Ok(()) => {
                    tracing::info!(?channel, "📨 Notificação enviada");
                    DeliveryReport::sent(channel)
                }
                Err(e) => {
                    tracing::warn!(?channel, error = %e, "Falha ao enviar notificação");
                    DeliveryReport::failed(channel, e.to_string())
                }
            }
        });

        join_all(sends).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::DeliveryStatus;
    use std::sync::Mutex;

    struct Recording {
        channel: Channel,
        sent_to: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Recording {
        fn new(channel: Channel, fail: bool) -> Arc<Self> {
            Arc::new(Self { channel, sent_to: Mutex::new(Vec::new()), fail })
        }
    }

    #[async_trait]
    impl NotificationProvider for Recording {
        fn channel(&self) -> Channel {
            self.channel
        }

        async fn send(&self, to: &str, _message: &NotificationMessage) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::ExternalService("fora do ar".into()));
            }
            self.sent_to.lock().unwrap().push(to.to_string());
            Ok(())
        }
    }

    fn message() -> NotificationMessage {
        NotificationMessage { subject: "Oi".into(), body: "Seu pedido saiu".into(), template: None }
    }

    #[tokio::test]
    async fn skips_channels_without_provider_or_recipient() {
        let email = Recording::new(Channel::Email, false);
        let whatsapp = Recording::new(Channel::WhatsApp, false);
        let dispatcher = NotificationDispatcher::new()
            .with_provider(email.clone())
            .with_provider(whatsapp.clone());

        let recipients = Recipients { email: Some("ana@loja.com".into()), phone: None, push_token: Some("t".into()) };
        let reports = dispatcher
            .notify(&[Channel::Email, Channel::WhatsApp, Channel::Push], &recipients, &message())
            .await;

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].status, DeliveryStatus::Sent);
        // WhatsApp tem provider mas não tem telefone.
        assert_eq!(reports[1].status, DeliveryStatus::Skipped);
        // Push tem destinatário mas não tem provider.
        assert_eq!(reports[2].status, DeliveryStatus::Skipped);

        assert_eq!(*email.sent_to.lock().unwrap(), vec!["ana@loja.com".to_string()]);
        assert!(whatsapp.sent_to.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_failing_channel_does_not_block_the_others() {
        let dispatcher = NotificationDispatcher::new()
            .with_provider(Recording::new(Channel::Email, true))
            .with_provider(Recording::new(Channel::Push, false));

        let recipients = Recipients {
            email: Some("ana@loja.com".into()),
            phone: None,
            push_token: Some("device-1".into()),
        };
        let reports = dispatcher.notify(&[Channel::Email, Channel::Push], &recipients, &message()).await;

        assert_eq!(reports[0].status, DeliveryStatus::Failed);
        assert!(reports[0].detail.as_deref().unwrap().contains("fora do ar"));
        assert_eq!(reports[1].status, DeliveryStatus::Sent);
    }
}
