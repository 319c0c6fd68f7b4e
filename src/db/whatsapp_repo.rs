// src/db/whatsapp_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::unique_violation, error::AppError},
    models::whatsapp::{Conversation, Message, MessageDirection, UpsertWhatsAppConfigPayload, WhatsAppConfig},
};

#[derive(Clone)]
pub struct WhatsAppRepository {
    pool: PgPool,
}

impl WhatsAppRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_config(&self, tenant_id: Uuid) -> Result<Option<WhatsAppConfig>, AppError> {
        let config = sqlx::query_as::<_, WhatsAppConfig>("SELECT * FROM whatsapp_configs WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(config)
    }

    pub async fn upsert_config(
        &self,
        tenant_id: Uuid,
        payload: &UpsertWhatsAppConfigPayload,
    ) -> Result<WhatsAppConfig, AppError> {
        sqlx::query_as::<_, WhatsAppConfig>(
            r#"
            INSERT INTO whatsapp_configs
                (tenant_id, phone_number_id, business_account_id, access_token, verify_token,
                 default_language, is_active)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'pt_BR'), COALESCE($7, true))
            ON CONFLICT (tenant_id) DO UPDATE SET
                phone_number_id = EXCLUDED.phone_number_id,
                business_account_id = EXCLUDED.business_account_id,
                access_token = EXCLUDED.access_token,
                verify_token = EXCLUDED.verify_token,
                default_language = COALESCE($6, whatsapp_configs.default_language),
                is_active = COALESCE($7, whatsapp_configs.is_active),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&payload.phone_number_id)
        .bind(payload.business_account_id.as_deref())
        .bind(&payload.access_token)
        .bind(&payload.verify_token)
        .bind(payload.default_language.as_deref())
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            unique_violation(e, || {
                AppError::Conflict("Este phoneNumberId já está vinculado a outra loja.".into())
            })
        })
    }

    /// Algum tenant ativo usa este verify token? (verificação do webhook)
    pub async fn verify_token_exists(&self, token: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM whatsapp_configs WHERE verify_token = $1 AND is_active = true)",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Cria (ou reaproveita) a conversa com o contato e marca a atividade.
    /// `inbound` incrementa o contador de não lidas.
    pub async fn touch_conversation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        wa_id: &str,
        contact_name: Option<&str>,
        inbound: bool,
    ) -> Result<Conversation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO whatsapp_conversations (tenant_id, wa_id, contact_name, unread_count)
            VALUES ($1, $2, $3, CASE WHEN $4 THEN 1 ELSE 0 END)
            ON CONFLICT (tenant_id, wa_id) DO UPDATE SET
                contact_name = COALESCE(EXCLUDED.contact_name, whatsapp_conversations.contact_name),
                last_message_at = NOW(),
                unread_count = whatsapp_conversations.unread_count + CASE WHEN $4 THEN 1 ELSE 0 END
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(wa_id)
        .bind(contact_name)
        .bind(inbound)
        .fetch_one(executor)
        .await?;
        Ok(conversation)
    }

    /// Grava a mensagem. Reentregas do webhook (mesmo wa_message_id) são ignoradas.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_message<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        conversation_id: Uuid,
        wa_message_id: Option<&str>,
        direction: MessageDirection,
        message_type: &str,
        body: Option<&str>,
        status: &str,
    ) -> Result<Option<Message>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO whatsapp_messages
                (tenant_id, conversation_id, wa_message_id, direction, message_type, body, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (wa_message_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(conversation_id)
        .bind(wa_message_id)
        .bind(direction)
        .bind(message_type)
        .bind(body)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(message)
    }

    /// Aplica um status (sent/delivered/read/failed) a uma mensagem enviada.
    pub async fn update_message_status(
        &self,
        tenant_id: Uuid,
        wa_message_id: &str,
        status: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE whatsapp_messages SET status = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND wa_message_id = $2 AND direction = 'OUTBOUND'
            "#,
        )
        .bind(tenant_id)
        .bind(wa_message_id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_conversations(&self, tenant_id: Uuid) -> Result<Vec<Conversation>, AppError> {
        let conversations = sqlx::query_as::<_, Conversation>(
            "SELECT * FROM whatsapp_conversations WHERE tenant_id = $1 ORDER BY last_message_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(conversations)
    }

    pub async fn find_conversation(&self, tenant_id: Uuid, conversation_id: Uuid) -> Result<Option<Conversation>, AppError> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT * FROM whatsapp_conversations WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(conversation)
    }

    pub async fn list_messages(&self, tenant_id: Uuid, conversation_id: Uuid) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM whatsapp_messages
            WHERE tenant_id = $1 AND conversation_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    pub async fn mark_read(&self, tenant_id: Uuid, conversation_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE whatsapp_conversations SET unread_count = 0 WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
