// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        BannerRepository, BookingRepository, CartRepository, CatalogRepository, CouponRepository, OrderRepository,
        RbacRepository, TenantRepository, UserRepository, WhatsAppRepository,
    },
    services::{
        auth::AuthService,
        booking_service::BookingService,
        cart_service::CartService,
        catalog_service::CatalogService,
        jobs::{InMemoryJobQueue, JobQueue, JobWorker, NotificationJobHandler, RedisJobQueue},
        marketing_service::MarketingService,
        notification::{EmailProvider, NotificationProvider, PushProvider},
        notification_service::NotificationService,
        order_service::OrderService,
        permission_cache::{InMemoryPermissionCache, PermissionCache, RedisPermissionCache},
        rbac_service::{PermissionService, RbacService},
        tenancy_service::TenantService,
        whatsapp_api::WhatsAppApi,
        whatsapp_service::WhatsAppService,
    },
};

// Espera base do retry dos jobs (dobra a cada tentativa).
const JOB_RETRY_BASE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct PushSettings {
    pub api_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub redis_url: Option<String>,
    pub jwt_ttl_hours: i64,
    pub permission_cache_ttl: Duration,
    pub email: Option<EmailSettings>,
    pub push: Option<PushSettings>,
    pub whatsapp_api_base: String,
    pub whatsapp_verify_token: Option<String>,
    pub cookie_secure: bool,
    pub frontend_url: String,
}

impl Config {
    /// Lê o `.env` (se existir) e as variáveis de ambiente.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| var(key).with_context(|| format!("{} deve ser definida", key));

        let email = match (var("EMAIL_API_URL"), var("EMAIL_API_KEY"), var("EMAIL_FROM")) {
            (Some(api_url), Some(api_key), Some(from)) => Some(EmailSettings { api_url, api_key, from }),
            _ => None,
        };
        let push = match (var("PUSH_API_URL"), var("PUSH_API_KEY")) {
            (Some(api_url), Some(api_key)) => Some(PushSettings { api_url, api_key }),
            _ => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            redis_url: var("REDIS_URL"),
            jwt_ttl_hours: parse_or(var("JWT_TTL_HOURS"), "JWT_TTL_HOURS", 168)?,
            permission_cache_ttl: Duration::from_secs(parse_or(
                var("PERMISSION_CACHE_TTL_SECS"),
                "PERMISSION_CACHE_TTL_SECS",
                3600,
            )?),
            email,
            push,
            whatsapp_api_base: var("WHATSAPP_API_BASE").unwrap_or_else(|| "https://graph.facebook.com/v19.0".into()),
            whatsapp_verify_token: var("WHATSAPP_VERIFY_TOKEN"),
            cookie_secure: parse_or(var("COOKIE_SECURE"), "COOKIE_SECURE", false)?,
            frontend_url: var("FRONTEND_URL").unwrap_or_else(|| "http://localhost:5173".into()),
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value.parse().with_context(|| format!("{} inválida: '{}'", key, value)),
        None => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub jobs: Arc<dyn JobQueue>,
    pub permission_service: PermissionService,

    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub rbac_service: RbacService,
    pub catalog_service: CatalogService,
    pub marketing_service: MarketingService,
    pub cart_service: CartService,
    pub order_service: OrderService,
    pub booking_service: BookingService,
    pub whatsapp_service: WhatsAppService,
    pub notification_service: NotificationService,

    http: reqwest::Client,
}

impl AppState {
    /// Conecta banco e Redis (se configurado), monta os serviços e sobe o worker de jobs.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;
        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let (cache, jobs): (Arc<dyn PermissionCache>, Arc<dyn JobQueue>) = match &config.redis_url {
            Some(url) => {
                let client = redis::Client::open(url.as_str()).context("REDIS_URL inválida")?;
                let cache_conn = client.get_connection_manager().await.context("Falha ao conectar ao Redis")?;
                let queue = RedisJobQueue::connect(&client).await.context("Falha ao conectar ao Redis")?;
                tracing::info!("✅ Redis conectado (cache de permissões e fila de jobs)");
                (
                    Arc::new(RedisPermissionCache::new(cache_conn, config.permission_cache_ttl)),
                    Arc::new(queue),
                )
            }
            None => {
                tracing::warn!("REDIS_URL não definida; usando cache e fila em memória");
                (
                    Arc::new(InMemoryPermissionCache::new(config.permission_cache_ttl)),
                    Arc::new(InMemoryJobQueue::new()),
                )
            }
        };

        let state = Self::from_parts(config, db_pool, cache, jobs);
        state.job_worker().spawn();
        Ok(state)
    }

    /// Monta o grafo de dependências a partir da infraestrutura já criada.
    pub fn from_parts(
        config: Config,
        db_pool: PgPool,
        cache: Arc<dyn PermissionCache>,
        jobs: Arc<dyn JobQueue>,
    ) -> Self {
        let http = reqwest::Client::new();

        // --- Repositórios ---
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let coupon_repo = CouponRepository::new(db_pool.clone());
        let banner_repo = BannerRepository::new(db_pool.clone());
        let cart_repo = CartRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());
        let booking_repo = BookingRepository::new(db_pool.clone());
        let whatsapp_repo = WhatsAppRepository::new(db_pool.clone());

        let whatsapp_api = WhatsAppApi::new(http.clone(), config.whatsapp_api_base.clone());

        // --- Serviços ---
        let permission_service = PermissionService::new(rbac_repo.clone(), cache);
        let auth_service = AuthService::new(
            user_repo.clone(),
            tenant_repo.clone(),
            config.jwt_secret.clone(),
            chrono::Duration::hours(config.jwt_ttl_hours),
            config.frontend_url.clone(),
            jobs.clone(),
            db_pool.clone(),
        );
        let tenant_service = TenantService::new(
            tenant_repo.clone(),
            rbac_repo.clone(),
            user_repo.clone(),
            permission_service.clone(),
            db_pool.clone(),
        );
        let rbac_service = RbacService::new(rbac_repo, permission_service.clone(), db_pool.clone());
        let catalog_service = CatalogService::new(catalog_repo.clone());
        let marketing_service = MarketingService::new(coupon_repo.clone(), banner_repo);
        let cart_service = CartService::new(cart_repo.clone(), catalog_repo.clone());
        let order_service = OrderService::new(
            order_repo,
            cart_repo,
            catalog_repo,
            coupon_repo,
            user_repo.clone(),
            jobs.clone(),
            db_pool.clone(),
        );
        let booking_service = BookingService::new(booking_repo, user_repo, jobs.clone(), db_pool.clone());
        let whatsapp_service = WhatsAppService::new(
            whatsapp_repo.clone(),
            tenant_repo,
            whatsapp_api.clone(),
            config.whatsapp_verify_token.clone(),
        );
        let notification_service = NotificationService::new(
            email_provider(&config, &http),
            push_provider(&config, &http),
            whatsapp_repo,
            whatsapp_api,
        );

        Self {
            db_pool,
            config: Arc::new(config),
            jobs,
            permission_service,
            auth_service,
            tenant_service,
            rbac_service,
            catalog_service,
            marketing_service,
            cart_service,
            order_service,
            booking_service,
            whatsapp_service,
            notification_service,
            http,
        }
    }

    /// Worker que consome a fila de notificações.
    pub fn job_worker(&self) -> JobWorker {
        let handler = NotificationJobHandler::new(
            email_provider(&self.config, &self.http),
            WhatsAppRepository::new(self.db_pool.clone()),
            self.whatsapp_service.api().clone(),
        );
        JobWorker::new(self.jobs.clone(), Arc::new(handler), JOB_RETRY_BASE)
    }
}

fn email_provider(config: &Config, http: &reqwest::Client) -> Option<Arc<dyn NotificationProvider>> {
    config.email.as_ref().map(|email| {
        Arc::new(EmailProvider::new(
            http.clone(),
            email.api_url.clone(),
            email.api_key.clone(),
            email.from.clone(),
        )) as Arc<dyn NotificationProvider>
    })
}

fn push_provider(config: &Config, http: &reqwest::Client) -> Option<Arc<dyn NotificationProvider>> {
    config.push.as_ref().map(|push| {
        Arc::new(PushProvider::new(http.clone(), push.api_url.clone(), push.api_key.clone()))
            as Arc<dyn NotificationProvider>
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/loja"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.jwt_ttl_hours, 168);
        assert_eq!(config.permission_cache_ttl, Duration::from_secs(3600));
        assert!(config.redis_url.is_none());
        assert!(config.email.is_none());
        assert!(!config.cookie_secure);
        assert_eq!(config.whatsapp_api_base, "https://graph.facebook.com/v19.0");
    }

    #[test]
    fn missing_required_var_names_it() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/loja")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn email_needs_all_three_settings() {
        let partial = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "x"),
            ("JWT_SECRET", "y"),
            ("EMAIL_API_URL", "https://mail.local/send"),
            ("EMAIL_API_KEY", "k"),
        ]))
        .unwrap();
        assert!(partial.email.is_none());

        let full = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "x"),
            ("JWT_SECRET", "y"),
            ("EMAIL_API_URL", "https://mail.local/send"),
            ("EMAIL_API_KEY", "k"),
            ("EMAIL_FROM", "loja@local"),
        ]))
        .unwrap();
        assert_eq!(full.email.unwrap().from, "loja@local");
    }

    #[test]
    fn malformed_numbers_fail_boot() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "x"),
            ("JWT_SECRET", "y"),
            ("JWT_TTL_HOURS", "uma semana"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_TTL_HOURS"));
    }
}
