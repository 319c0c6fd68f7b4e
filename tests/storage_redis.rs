// tests/storage_redis.rs
//
// Cache de permissões e fila de jobs contra um Redis de verdade (testcontainers).
//
// Rodar com: cargo test --test storage_redis -- --ignored --nocapture

use std::{sync::Arc, time::Duration};

use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use uuid::Uuid;

use storefront::{
    models::notification::{Job, JobEnvelope},
    services::{
        jobs::{JobQueue, RedisJobQueue},
        permission_cache::{PermissionCache, RedisPermissionCache},
    },
};

async fn start_redis() -> (ContainerAsync<GenericImage>, redis::Client) {
    let container = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(6379.tcp())
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
        .with_startup_timeout(Duration::from_secs(60))
        .start()
        .await
        .expect("falha ao subir o redis");

    let host = container.get_host().await.expect("host do container");
    let port = container.get_host_port_ipv4(6379).await.expect("porta do container");
    let client = redis::Client::open(format!("redis://{host}:{port}")).expect("url do redis");
    (container, client)
}

fn email_job(to: &str) -> JobEnvelope {
    JobEnvelope::new(Job::Email {
        to: to.into(),
        subject: "Pedido recebido".into(),
        body: "Obrigado!".into(),
    })
}

#[tokio::test]
#[ignore = "requer Docker (testcontainers)"]
async fn permission_cache_round_trip() {
    let (_container, client) = start_redis().await;
    let conn = client.get_connection_manager().await.unwrap();
    let cache = RedisPermissionCache::new(conn, Duration::from_secs(60));
    let (user, tenant, other_tenant) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    assert_eq!(cache.get(user, tenant).await.unwrap(), None);

    let perms = vec!["order:read".to_string(), "order:write".to_string()];
    cache.set(user, tenant, &perms).await.unwrap();
    assert_eq!(cache.get(user, tenant).await.unwrap(), Some(perms));
    assert_eq!(cache.get(user, other_tenant).await.unwrap(), None);

    cache.invalidate(user, tenant).await.unwrap();
    assert_eq!(cache.get(user, tenant).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requer Docker (testcontainers)"]
async fn job_queue_is_fifo() {
    let (_container, client) = start_redis().await;
    let queue = RedisJobQueue::connect(&client).await.unwrap();

    let (first, second) = (email_job("a@teste.com"), email_job("b@teste.com"));
    queue.push(first.clone()).await.unwrap();
    queue.push(second.clone()).await.unwrap();

    let popped = queue.pop(Duration::from_secs(1)).await.unwrap().unwrap();
    assert_eq!(popped.id, first.id);
    let popped = queue.pop(Duration::from_secs(1)).await.unwrap().unwrap();
    assert_eq!(popped.id, second.id);
    assert!(queue.pop(Duration::from_secs(1)).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requer Docker (testcontainers)"]
async fn push_is_not_held_behind_a_waiting_pop() {
    let (_container, client) = start_redis().await;
    let queue = Arc::new(RedisJobQueue::connect(&client).await.unwrap());

    // Worker parado no BRPOP com a fila vazia.
    let worker = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.pop(Duration::from_secs(5)).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    let job = email_job("cliente@teste.com");
    tokio::time::timeout(Duration::from_secs(1), queue.push(job.clone()))
        .await
        .expect("push ficou esperando o BRPOP")
        .unwrap();

    let popped = tokio::time::timeout(Duration::from_secs(2), worker)
        .await
        .expect("worker não recebeu o job")
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(popped.id, job.id);
}
