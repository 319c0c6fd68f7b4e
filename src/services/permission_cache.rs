// src/services/permission_cache.rs

use std::{
    collections::HashMap,
    sync::RwLock,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use uuid::Uuid;

use crate::common::error::AppError;

// Cache das permissões de um usuário numa loja.
// A chave é sempre (usuário, loja) e o valor a lista de slugs.
#[async_trait]
pub trait PermissionCache: Send + Sync {
    async fn get(&self, user_id: Uuid, tenant_id: Uuid) -> Result<Option<Vec<String>>, AppError>;
    async fn set(&self, user_id: Uuid, tenant_id: Uuid, permissions: &[String]) -> Result<(), AppError>;
    async fn invalidate(&self, user_id: Uuid, tenant_id: Uuid) -> Result<(), AppError>;
}

pub fn cache_key(user_id: Uuid, tenant_id: Uuid) -> String {
    format!("perms:{}:{}", user_id, tenant_id)
}

// ---
// Redis
// ---

pub struct RedisPermissionCache {
    conn: ConnectionManager,
    ttl: Duration,
}

impl RedisPermissionCache {
    // A conexão é aberta em AppState::new; a fila usa outra.
    pub fn new(conn: ConnectionManager, ttl: Duration) -> Self {
        Self { conn, ttl }
    }
}

#[async_trait]
impl PermissionCache for RedisPermissionCache {
    async fn get(&self, user_id: Uuid, tenant_id: Uuid) -> Result<Option<Vec<String>>, AppError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(cache_key(user_id, tenant_id)).await?;

        // Valor corrompido conta como "não está no cache".
        Ok(raw.and_then(|json| serde_json::from_str(&json).ok()))
    }

    async fn set(&self, user_id: Uuid, tenant_id: Uuid, permissions: &[String]) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(permissions).map_err(anyhow::Error::from)?;
        let _: () = conn
            .set_ex(cache_key(user_id, tenant_id), json, self.ttl.as_secs())
            .await?;
        Ok(())
    }

    async fn invalidate(&self, user_id: Uuid, tenant_id: Uuid) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(cache_key(user_id, tenant_id)).await?;
        Ok(())
    }
}

// ---
// Memória (dev sem Redis e testes)
// ---

#[derive(Default)]
pub struct InMemoryPermissionCache {
    entries: RwLock<HashMap<String, (Instant, Vec<String>)>>,
    ttl: Option<Duration>,
}

impl InMemoryPermissionCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: RwLock::default(), ttl: Some(ttl) }
    }

    fn expired(&self, stored_at: Instant) -> bool {
        self.ttl.is_some_and(|ttl| stored_at.elapsed() >= ttl)
    }
}

#[async_trait]
impl PermissionCache for InMemoryPermissionCache {
    async fn get(&self, user_id: Uuid, tenant_id: Uuid) -> Result<Option<Vec<String>>, AppError> {
        let entries = self.entries.read().map_err(|_| anyhow::anyhow!("lock do cache envenenado"))?;
        Ok(entries
            .get(&cache_key(user_id, tenant_id))
            .filter(|(stored_at, _)| !self.expired(*stored_at))
            .map(|(_, perms)| perms.clone()))
    }

    async fn set(&self, user_id: Uuid, tenant_id: Uuid, permissions: &[String]) -> Result<(), AppError> {
        let mut entries = self.entries.write().map_err(|_| anyhow::anyhow!("lock do cache envenenado"))?;
        entries.insert(cache_key(user_id, tenant_id), (Instant::now(), permissions.to_vec()));
        Ok(())
    }

    async fn invalidate(&self, user_id: Uuid, tenant_id: Uuid) -> Result<(), AppError> {
        let mut entries = self.entries.write().map_err(|_| anyhow::anyhow!("lock do cache envenenado"))?;
        entries.remove(&cache_key(user_id, tenant_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout() {
        let user = Uuid::nil();
        let tenant = Uuid::from_u128(1);
        assert_eq!(
            cache_key(user, tenant),
            "perms:00000000-0000-0000-0000-000000000000:00000000-0000-0000-0000-000000000001"
        );
    }

    #[tokio::test]
    async fn set_get_invalidate() {
        let cache = InMemoryPermissionCache::new(Duration::from_secs(60));
        let (user, tenant) = (Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(cache.get(user, tenant).await.unwrap(), None);

        cache.set(user, tenant, &["order:read".to_string()]).await.unwrap();
        assert_eq!(
            cache.get(user, tenant).await.unwrap(),
            Some(vec!["order:read".to_string()])
        );
        // Outra loja do mesmo usuário não é afetada.
        assert_eq!(cache.get(user, Uuid::new_v4()).await.unwrap(), None);

        cache.invalidate(user, tenant).await.unwrap();
        assert_eq!(cache.get(user, tenant).await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache = InMemoryPermissionCache::new(Duration::ZERO);
        let (user, tenant) = (Uuid::new_v4(), Uuid::new_v4());
        cache.set(user, tenant, &["x:y".to_string()]).await.unwrap();
        assert_eq!(cache.get(user, tenant).await.unwrap(), None);
    }
}
