// src/services/notification_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::WhatsAppRepository,
    models::notification::{DeliveryReport, NotificationMessage, NotifyPayload},
    services::{
        notification::{NotificationDispatcher, NotificationProvider, WhatsAppProvider},
        whatsapp_api::WhatsAppApi,
    },
};

// Envio direto (síncrono) pelo painel. Os avisos automáticos vão pela fila.
#[derive(Clone)]
pub struct NotificationService {
    email: Option<Arc<dyn NotificationProvider>>,
    push: Option<Arc<dyn NotificationProvider>>,
    whatsapp_repo: WhatsAppRepository,
    whatsapp_api: WhatsAppApi,
}

impl NotificationService {
    pub fn new(
        email: Option<Arc<dyn NotificationProvider>>,
        push: Option<Arc<dyn NotificationProvider>>,
        whatsapp_repo: WhatsAppRepository,
        whatsapp_api: WhatsAppApi,
    ) -> Self {
        Self { email, push, whatsapp_repo, whatsapp_api }
    }

    pub async fn notify(&self, tenant_id: Uuid, payload: &NotifyPayload) -> Result<Vec<DeliveryReport>, AppError> {
        let dispatcher = self.dispatcher_for(tenant_id).await?;
        let message = NotificationMessage {
            subject: payload.subject.clone(),
            body: payload.body.clone(),
            template: payload.template.clone(),
        };

        let reports = dispatcher.notify(&payload.channels, &payload.recipients, &message).await;
        tracing::info!(%tenant_id, ?reports, "🔔 Notificação disparada");
        Ok(reports)
    }

    // Provedores globais + WhatsApp da própria loja (se ativo).
    async fn dispatcher_for(&self, tenant_id: Uuid) -> Result<NotificationDispatcher, AppError> {
        let mut dispatcher = NotificationDispatcher::new();
        for provider in [&self.email, &self.push].into_iter().flatten() {
            dispatcher = dispatcher.with_provider(provider.clone());
        }

        if let Some(config) = self.whatsapp_repo.get_config(tenant_id).await?.filter(|c| c.is_active) {
            dispatcher = dispatcher.with_provider(Arc::new(WhatsAppProvider::new(
                self.whatsapp_api.clone(),
                config.phone_number_id,
                config.access_token,
                config.default_language,
            )));
        }
        Ok(dispatcher)
    }
}
