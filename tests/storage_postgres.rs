// tests/storage_postgres.rs
//
// Fluxos que dependem do Postgres de verdade (transações, SQL de agenda,
// isolamento entre lojas). Sobe um container com testcontainers.
//
// Rodar com: cargo test --test storage_postgres -- --ignored --nocapture

use std::{sync::Arc, time::Duration};

use chrono::{Duration as ChronoDuration, Timelike, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::json;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use uuid::Uuid;

use storefront::{
    common::error::AppError,
    config::{AppState, Config},
    models::booking::AppointmentStatus,
    services::{jobs::InMemoryJobQueue, permission_cache::InMemoryPermissionCache},
};

async fn start_postgres() -> (ContainerAsync<GenericImage>, String) {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(5432.tcp())
        .with_wait_for(WaitFor::message_on_stdout(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_USER", "storefront")
        .with_env_var("POSTGRES_PASSWORD", "storefront")
        .with_env_var("POSTGRES_DB", "storefront")
        .with_startup_timeout(Duration::from_secs(60))
        .start()
        .await
        .expect("falha ao subir o postgres");

    // A mensagem aparece duas vezes (init + pronto de fato).
    tokio::time::sleep(Duration::from_secs(1)).await;

    let host = container.get_host().await.expect("host do container");
    let port = container.get_host_port_ipv4(5432).await.expect("porta do container");
    let url = format!("postgres://storefront:storefront@{host}:{port}/storefront");
    (container, url)
}

async fn app_state(url: &str) -> AppState {
    let pool = sqlx::PgPool::connect(url).await.expect("conexão com o postgres");
    sqlx::migrate!().run(&pool).await.expect("migrations");

    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some(url.to_string()),
        "JWT_SECRET" => Some("segredo-de-teste".to_string()),
        _ => None,
    })
    .unwrap();

    AppState::from_parts(
        config,
        pool,
        Arc::new(InMemoryPermissionCache::new(Duration::from_secs(60))),
        Arc::new(InMemoryJobQueue::new()),
    )
}

fn payload<T: DeserializeOwned>(value: serde_json::Value) -> T {
    serde_json::from_value(value).expect("payload de teste")
}

struct Shop {
    state: AppState,
    tenant_id: Uuid,
    customer_id: Uuid,
}

async fn shop(state: AppState, slug: &str) -> Shop {
    let owner = state
        .auth_service
        .register_user(&payload(json!({
            "email": format!("dono-{slug}@teste.com"),
            "password": "senha-forte",
            "fullName": "Dono"
        })))
        .await
        .unwrap();
    let tenant = state
        .tenant_service
        .create_tenant(owner.user.id, &payload(json!({ "name": "Loja", "slug": slug })))
        .await
        .unwrap();
    let customer = state
        .auth_service
        .register_user(&payload(json!({
            "email": format!("cliente-{slug}@teste.com"),
            "password": "senha-forte",
            "fullName": "Cliente",
            "phone": "5511999990000"
        })))
        .await
        .unwrap();

    Shop { state, tenant_id: tenant.id, customer_id: customer.user.id }
}

async fn product(shop: &Shop, sku: &str, price: i64, stock: i32) -> Uuid {
    shop.state
        .catalog_service
        .create_product(
            shop.tenant_id,
            &payload(json!({ "sku": sku, "name": sku, "price": Decimal::new(price, 2), "stock": stock })),
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
#[ignore = "requer Docker (testcontainers)"]
async fn checkout_and_catalog_against_postgres() {
    let (_container, url) = start_postgres().await;
    let state = app_state(&url).await;

    checkout_moves_cart_into_order_and_decrements_stock(&shop(state.clone(), "loja-checkout").await).await;
    checkout_with_stock_shortfall_changes_nothing(&shop(state.clone(), "loja-rollback").await).await;
    other_tenant_sees_products_as_missing(
        &shop(state.clone(), "loja-a").await,
        &shop(state.clone(), "loja-b").await,
    )
    .await;
    deactivated_product_cannot_have_quantity_raised(&shop(state.clone(), "loja-inativo").await).await;
    banner_window_is_checked_against_stored_dates(&shop(state, "loja-banner").await).await;
}

async fn checkout_moves_cart_into_order_and_decrements_stock(shop: &Shop) {
    let (tenant, customer) = (shop.tenant_id, shop.customer_id);
    let cafe = product(shop, "CAFE", 2990, 10).await;
    let cha = product(shop, "CHA", 1000, 5).await;

    shop.state.cart_service.add_item(tenant, customer, cafe, 2).await.unwrap();
    shop.state.cart_service.add_item(tenant, customer, cha, 1).await.unwrap();

    let order = shop
        .state
        .order_service
        .checkout(tenant, customer, &payload(json!({})))
        .await
        .unwrap();

    assert_eq!(order.header.subtotal, Decimal::new(6980, 2));
    assert_eq!(order.items.len(), 2);

    let cart = shop.state.cart_service.get_cart(tenant, customer).await.unwrap();
    assert!(cart.items.is_empty());

    let cafe = shop.state.catalog_service.get_product(tenant, cafe, false).await.unwrap();
    let cha = shop.state.catalog_service.get_product(tenant, cha, false).await.unwrap();
    assert_eq!((cafe.stock, cha.stock), (8, 4));

    // Carrinho já drenado
    let again = shop.state.order_service.checkout(tenant, customer, &payload(json!({}))).await;
    assert!(matches!(again, Err(AppError::EmptyCart)));
}

async fn checkout_with_stock_shortfall_changes_nothing(shop: &Shop) {
    let (tenant, customer) = (shop.tenant_id, shop.customer_id);
    let farto = product(shop, "FARTO", 500, 10).await;
    let escasso = product(shop, "ESCASSO", 500, 5).await;

    shop.state.cart_service.add_item(tenant, customer, farto, 4).await.unwrap();
    shop.state.cart_service.add_item(tenant, customer, escasso, 3).await.unwrap();

    // O estoque cai depois que o item já está no carrinho.
    shop.state
        .catalog_service
        .update_product(tenant, escasso, &payload(json!({ "stock": 2 })))
        .await
        .unwrap();

    let result = shop.state.order_service.checkout(tenant, customer, &payload(json!({}))).await;
    assert!(matches!(result, Err(AppError::InsufficientStock { .. })));

    let cart = shop.state.cart_service.get_cart(tenant, customer).await.unwrap();
    assert_eq!(cart.total_items, 7);
    let farto = shop.state.catalog_service.get_product(tenant, farto, false).await.unwrap();
    assert_eq!(farto.stock, 10);
    assert!(shop.state.order_service.list_my_orders(tenant, customer).await.unwrap().is_empty());
}

async fn other_tenant_sees_products_as_missing(a: &Shop, b: &Shop) {
    let produto_a = product(a, "SO-DA-A", 1000, 3).await;
    let catalog = &b.state.catalog_service;

    assert!(matches!(
        catalog.get_product(b.tenant_id, produto_a, false).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        catalog
            .update_product(b.tenant_id, produto_a, &payload(json!({ "stock": 0 })))
            .await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        catalog.delete_product(b.tenant_id, produto_a).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        b.state.cart_service.add_item(b.tenant_id, b.customer_id, produto_a, 1).await,
        Err(AppError::NotFound(_))
    ));

    // Nada mudou na loja dona do produto.
    let intacto = a.state.catalog_service.get_product(a.tenant_id, produto_a, false).await.unwrap();
    assert_eq!(intacto.stock, 3);
}

async fn deactivated_product_cannot_have_quantity_raised(shop: &Shop) {
    let (tenant, customer) = (shop.tenant_id, shop.customer_id);
    let item = product(shop, "SAZONAL", 1500, 10).await;
    shop.state.cart_service.add_item(tenant, customer, item, 1).await.unwrap();

    shop.state
        .catalog_service
        .update_product(tenant, item, &payload(json!({ "isActive": false })))
        .await
        .unwrap();

    let result = shop.state.cart_service.update_item(tenant, customer, item, 3).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    // Zerar continua permitido para limpar a linha.
    let cart = shop.state.cart_service.update_item(tenant, customer, item, 0).await.unwrap();
    assert!(cart.items.is_empty());
}

async fn banner_window_is_checked_against_stored_dates(shop: &Shop) {
    let marketing = &shop.state.marketing_service;
    let start = Utc::now() + ChronoDuration::days(10);
    let banner = marketing
        .create_banner(
            shop.tenant_id,
            &payload(json!({
                "title": "Verão",
                "imageUrl": "https://cdn.teste.com/verao.png",
                "startsAt": start,
                "endsAt": start + ChronoDuration::days(5)
            })),
        )
        .await
        .unwrap();

    let result = marketing
        .update_banner(
            shop.tenant_id,
            banner.id,
            &payload(json!({ "endsAt": start - ChronoDuration::days(1) })),
        )
        .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let ok = marketing
        .update_banner(
            shop.tenant_id,
            banner.id,
            &payload(json!({ "endsAt": start + ChronoDuration::days(1) })),
        )
        .await
        .unwrap();
    assert_eq!(ok.starts_at, banner.starts_at);
}

#[tokio::test]
#[ignore = "requer Docker (testcontainers)"]
async fn booking_against_postgres() {
    let (_container, url) = start_postgres().await;
    let state = app_state(&url).await;
    let shop = shop(state, "barbearia").await;
    let booking = &shop.state.booking_service;
    let tenant = shop.tenant_id;

    let staff = booking
        .create_staff(tenant, &payload(json!({ "name": "Zé" })))
        .await
        .unwrap();
    let corte = booking
        .create_service(
            tenant,
            &payload(json!({ "name": "Corte", "durationMinutes": 30, "price": Decimal::new(4000, 2) })),
        )
        .await
        .unwrap();

    let nine = (Utc::now() + ChronoDuration::days(2))
        .with_hour(9)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap();
    let book = |starts_at: chrono::DateTime<Utc>| {
        payload::<storefront::models::booking::BookAppointmentPayload>(json!({
            "staffId": staff.id,
            "serviceId": corte.id,
            "startsAt": starts_at
        }))
    };

    let first = booking.book(tenant, shop.customer_id, &book(nine)).await.unwrap();
    assert_eq!(first.ends_at, nine + ChronoDuration::minutes(30));
    assert_eq!(first.status, AppointmentStatus::Pending);

    // [9:00, 9:30) cruza com 9:15 e com 8:45; encostar às 9:30 não cruza.
    for clash in [nine + ChronoDuration::minutes(15), nine - ChronoDuration::minutes(15)] {
        assert!(matches!(
            booking.book(tenant, shop.customer_id, &book(clash)).await,
            Err(AppError::SlotUnavailable)
        ));
    }
    let adjacent = booking
        .book(tenant, shop.customer_id, &book(nine + ChronoDuration::minutes(30)))
        .await
        .unwrap();

    // Cancelado libera o horário.
    booking.update_status(tenant, first.id, "CANCELLED").await.unwrap();
    let rebooked = booking.book(tenant, shop.customer_id, &book(nine)).await.unwrap();

    // Estado final não volta atrás.
    let locked = booking.update_status(tenant, first.id, "CONFIRMED").await;
    assert!(matches!(locked, Err(AppError::StatusLocked(_))));

    let busy = booking.availability(tenant, staff.id, nine.date_naive()).await.unwrap();
    let starts: Vec<_> = busy.iter().map(|slot| slot.starts_at).collect();
    assert!(starts.contains(&rebooked.starts_at));
    assert!(starts.contains(&adjacent.starts_at));
    assert_eq!(busy.len(), 2);
}
