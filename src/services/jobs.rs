// src/services/jobs.rs

use std::{collections::VecDeque, sync::Arc, sync::Mutex, time::Duration};

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use tokio::{sync::Notify, task::JoinHandle, time::Instant};

use crate::{
    common::error::AppError,
    db::WhatsAppRepository,
    models::notification::{Job, JobEnvelope, NotificationMessage},
    services::{notification::NotificationProvider, whatsapp_api::WhatsAppApi},
};

/// Tentativas totais de um job (a primeira execução conta).
pub const MAX_ATTEMPTS: u32 = 3;

const QUEUE_KEY: &str = "jobs:notifications";
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Espera antes da próxima tentativa: `base * 2^attempt`.
pub fn backoff(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn push(&self, envelope: JobEnvelope) -> Result<(), AppError>;
    /// Espera até `timeout` por um job. `None` = fila vazia.
    async fn pop(&self, timeout: Duration) -> Result<Option<JobEnvelope>, AppError>;
}

/// Enfileira sem falhar a requisição: o job é um efeito colateral
/// de algo que já foi gravado.
pub async fn enqueue(queue: &dyn JobQueue, job: Job) {
    let kind = job.kind();
    let envelope = JobEnvelope::new(job);
    let job_id = envelope.id;
    match queue.push(envelope).await {
        Ok(()) => tracing::debug!(%job_id, kind, "Job enfileirado"),
        Err(e) => tracing::error!(%job_id, kind, error = %e, "🔥 Falha ao enfileirar job"),
    }
}

// ---
// Redis (LPUSH / BRPOP)
// ---

pub struct RedisJobQueue {
    push_conn: ConnectionManager,
    // O BRPOP segura a conexão até o timeout; o LPUSH não pode ficar atrás dele.
    pop_conn: ConnectionManager,
}

impl RedisJobQueue {
    pub fn new(push_conn: ConnectionManager, pop_conn: ConnectionManager) -> Self {
        Self { push_conn, pop_conn }
    }

    pub async fn connect(client: &redis::Client) -> Result<Self, AppError> {
        let push_conn = client.get_connection_manager().await?;
        let pop_conn = client.get_connection_manager().await?;
        Ok(Self::new(push_conn, pop_conn))
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn push(&self, envelope: JobEnvelope) -> Result<(), AppError> {
        let mut conn = self.push_conn.clone();
        let json = serde_json::to_string(&envelope).map_err(anyhow::Error::from)?;
        let _: () = conn.lpush(QUEUE_KEY, json).await?;
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<JobEnvelope>, AppError> {
        let mut conn = self.pop_conn.clone();
        let popped: Option<(String, String)> = conn.brpop(QUEUE_KEY, timeout.as_secs_f64()).await?;

        let Some((_, json)) = popped else {
            return Ok(None);
        };
        match serde_json::from_str(&json) {
            Ok(envelope) => Ok(Some(envelope)),
            Err(e) => {
                // Job ilegível nunca vai dar certo; descarta.
                tracing::error!(error = %e, payload = %json, "Job inválido descartado");
                Ok(None)
            }
        }
    }
}

// ---
// Memória
// ---

#[derive(Default)]
pub struct InMemoryJobQueue {
    items: Mutex<VecDeque<JobEnvelope>>,
    notify: Notify,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn push(&self, envelope: JobEnvelope) -> Result<(), AppError> {
        self.items
            .lock()
            .map_err(|_| anyhow::anyhow!("lock da fila envenenado"))?
            .push_back(envelope);
        self.notify.notify_one();
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<JobEnvelope>, AppError> {
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            let next = self
                .items
                .lock()
                .map_err(|_| anyhow::anyhow!("lock da fila envenenado"))?
                .pop_front();
            if next.is_some() {
                return Ok(next);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }
}

// ---
// Worker
// ---

#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Retrying { attempt: u32, delay: Duration },
    Dropped,
}

pub struct JobWorker {
    queue: Arc<dyn JobQueue>,
    handler: Arc<dyn JobHandler>,
    base_delay: Duration,
}

impl JobWorker {
    pub fn new(queue: Arc<dyn JobQueue>, handler: Arc<dyn JobHandler>, base_delay: Duration) -> Self {
        Self { queue, handler, base_delay }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        tracing::info!("👷 Worker de jobs iniciado");
        loop {
            match self.queue.pop(POLL_TIMEOUT).await {
                Ok(Some(envelope)) => {
                    self.process(envelope).await;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Falha ao ler a fila de jobs");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    /// Executa um job. Em caso de falha, reenfileira com backoff
    /// até `MAX_ATTEMPTS`; depois disso o job é descartado.
    pub async fn process(&self, mut envelope: JobEnvelope) -> JobOutcome {
        let job_id = envelope.id;
        let kind = envelope.job.kind();

        let error = match self.handler.handle(&envelope.job).await {
            Ok(()) => {
                tracing::info!(%job_id, kind, "✅ Job concluído");
                return JobOutcome::Completed;
            }
            Err(e) => e,
        };

        envelope.attempts += 1;
        if envelope.attempts >= MAX_ATTEMPTS {
            tracing::error!(%job_id, kind, attempts = envelope.attempts, error = %error, "🔥 Job descartado após esgotar as tentativas");
            return JobOutcome::Dropped;
        }

        let attempt = envelope.attempts;
        let delay = backoff(self.base_delay, attempt - 1);
        tracing::warn!(%job_id, kind, attempt, delay_ms = delay.as_millis() as u64, error = %error, "Job falhou; nova tentativa agendada");

        let queue = self.queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = queue.push(envelope).await {
                tracing::error!(%job_id, error = %e, "Falha ao reenfileirar job");
            }
        });

        JobOutcome::Retrying { attempt, delay }
    }
}

// ---
// Handler real: e-mails e templates de WhatsApp
// ---

pub struct NotificationJobHandler {
    email: Option<Arc<dyn NotificationProvider>>,
    whatsapp_repo: WhatsAppRepository,
    whatsapp_api: WhatsAppApi,
}

impl NotificationJobHandler {
    pub fn new(
        email: Option<Arc<dyn NotificationProvider>>,
        whatsapp_repo: WhatsAppRepository,
        whatsapp_api: WhatsAppApi,
    ) -> Self {
        Self { email, whatsapp_repo, whatsapp_api }
    }
}

#[async_trait]
impl JobHandler for NotificationJobHandler {
    async fn handle(&self, job: &Job) -> Result<(), AppError> {
        match job {
            Job::Email { to, subject, body } => {
                let Some(provider) = &self.email else {
                    tracing::warn!(%to, "E-mail não configurado; job ignorado");
                    return Ok(());
                };
                let message = NotificationMessage {
                    subject: subject.clone(),
                    body: body.clone(),
                    template: None,
                };
                provider.send(to, &message).await
            }
            Job::WhatsAppTemplate { tenant_id, to, template, language, parameters } => {
                let config = self
                    .whatsapp_repo
                    .get_config(*tenant_id)
                    .await?
                    .filter(|c| c.is_active);

                let Some(config) = config else {
                    tracing::info!(%tenant_id, "Loja sem WhatsApp ativo; template não enviado");
                    return Ok(());
                };

                let language = language.as_deref().unwrap_or(&config.default_language);
                self.whatsapp_api
                    .send_template(&config.phone_number_id, &config.access_token, to, template, language, parameters)
                    .await?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    // Falha as primeiras `failures` execuções.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl JobHandler for Flaky {
        async fn handle(&self, _job: &Job) -> Result<(), AppError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(AppError::ExternalService("indisponível".into()))
            } else {
                Ok(())
            }
        }
    }

    fn email_job() -> JobEnvelope {
        JobEnvelope::new(Job::Email {
            to: "ana@loja.com".into(),
            subject: "Oi".into(),
            body: "Teste".into(),
        })
    }

    #[test]
    fn backoff_doubles_each_attempt() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff(base, 0), Duration::from_millis(500));
        assert_eq!(backoff(base, 1), Duration::from_secs(1));
        assert_eq!(backoff(base, 2), Duration::from_secs(2));
        assert_eq!(backoff(base, 3), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn in_memory_queue_is_fifo_and_times_out() {
        let queue = InMemoryJobQueue::new();
        let first = email_job();
        let second = email_job();
        queue.push(first.clone()).await.unwrap();
        queue.push(second.clone()).await.unwrap();

        assert_eq!(queue.pop(Duration::from_millis(10)).await.unwrap(), Some(first));
        assert_eq!(queue.pop(Duration::from_millis(10)).await.unwrap(), Some(second));
        assert_eq!(queue.pop(Duration::from_millis(10)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn retries_until_max_attempts_then_drops() {
        let queue = Arc::new(InMemoryJobQueue::new());
        let handler = Arc::new(Flaky { failures: u32::MAX, calls: AtomicU32::new(0) });
        let worker = JobWorker::new(queue.clone(), handler.clone(), Duration::from_millis(1));

        let outcome = worker.process(email_job()).await;
        assert_eq!(outcome, JobOutcome::Retrying { attempt: 1, delay: Duration::from_millis(1) });

        let retried = queue.pop(Duration::from_secs(1)).await.unwrap().expect("job reenfileirado");
        assert_eq!(retried.attempts, 1);
        let outcome = worker.process(retried).await;
        assert_eq!(outcome, JobOutcome::Retrying { attempt: 2, delay: Duration::from_millis(2) });

        let retried = queue.pop(Duration::from_secs(1)).await.unwrap().expect("job reenfileirado");
        assert_eq!(worker.process(retried).await, JobOutcome::Dropped);

        assert_eq!(handler.calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
        assert_eq!(queue.pop(Duration::from_millis(20)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn succeeds_after_a_transient_failure() {
        let queue = Arc::new(InMemoryJobQueue::new());
        let handler = Arc::new(Flaky { failures: 1, calls: AtomicU32::new(0) });
        let worker = JobWorker::new(queue.clone(), handler.clone(), Duration::from_millis(1));

        assert!(matches!(worker.process(email_job()).await, JobOutcome::Retrying { .. }));
        let retried = queue.pop(Duration::from_secs(1)).await.unwrap().unwrap();
        assert_eq!(worker.process(retried).await, JobOutcome::Completed);
        assert!(queue.is_empty());
    }
}
