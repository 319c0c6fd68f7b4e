// src/routes.rs

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::{
        auth::auth_guard,
        context::{request_context, REQUEST_ID_HEADER},
        tenancy::{store_guard, tenant_guard, TENANT_ID_HEADER},
    },
};

/// Monta a API inteira. Cada grupo de rotas leva o seu guardião via `route_layer`,
/// então caminhos inexistentes continuam respondendo 404.
pub fn build_router(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/api/auth/reset-password", post(handlers::auth::reset_password));

    // Só exigem token (sem loja)
    let user_routes = Router::new()
        .route("/api/users/me", get(handlers::auth::get_me))
        .route(
            "/api/tenants",
            post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_my_tenants),
        )
        .route("/api/permissions", get(handlers::rbac::list_permissions))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Vitrine pública: só o X-Tenant-ID
    let store_routes = Router::new()
        .route("/api/store/products", get(handlers::catalog::list_store_products))
        .route("/api/store/products/{id}", get(handlers::catalog::get_store_product))
        .route("/api/store/categories", get(handlers::catalog::list_store_categories))
        .route("/api/store/banners", get(handlers::marketing::list_live_banners))
        .route("/api/store/banners/{id}/impression", post(handlers::marketing::record_impression))
        .route("/api/store/banners/{id}/click", post(handlers::marketing::record_click))
        .route("/api/store/services", get(handlers::booking::list_store_services))
        .route("/api/store/staff", get(handlers::booking::list_store_staff))
        .route("/api/store/staff/{id}/availability", get(handlers::booking::staff_availability));

    // Cliente logado comprando numa loja
    let shop_routes = Router::new()
        .route(
            "/api/shop/cart",
            get(handlers::cart::get_cart).delete(handlers::cart::clear_cart),
        )
        .route("/api/shop/cart/items", post(handlers::cart::add_item))
        .route(
            "/api/shop/cart/items/{product_id}",
            put(handlers::cart::update_item).delete(handlers::cart::remove_item),
        )
        .route("/api/shop/checkout", post(handlers::cart::checkout))
        .route("/api/shop/orders", get(handlers::orders::list_my_orders))
        .route("/api/shop/orders/{id}", get(handlers::orders::get_my_order))
        .route("/api/shop/coupons/validate", post(handlers::marketing::validate_coupon))
        .route(
            "/api/shop/appointments",
            post(handlers::booking::book_appointment).get(handlers::booking::list_my_appointments),
        )
        .route(
            "/api/shop/appointments/{id}/cancel",
            post(handlers::booking::cancel_my_appointment),
        )
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), store_guard));

    // Painel da loja: membro + permissões (checadas em cada handler)
    let admin_routes = Router::new()
        // --- Loja e equipe ---
        .route(
            "/api/tenant",
            get(handlers::tenancy::get_current_tenant).put(handlers::tenancy::update_current_tenant),
        )
        .route(
            "/api/tenant/members",
            get(handlers::tenancy::list_members).post(handlers::tenancy::add_member),
        )
        .route(
            "/api/tenant/members/{user_id}",
            put(handlers::tenancy::change_member_role).delete(handlers::tenancy::remove_member),
        )
        .route(
            "/api/roles",
            post(handlers::rbac::create_role).get(handlers::rbac::list_roles),
        )
        .route(
            "/api/roles/{id}",
            get(handlers::rbac::get_role)
                .put(handlers::rbac::update_role)
                .delete(handlers::rbac::delete_role),
        )
        // --- Catálogo ---
        .route(
            "/api/admin/products",
            post(handlers::catalog::create_product).get(handlers::catalog::list_products),
        )
        .route(
            "/api/admin/products/{id}",
            get(handlers::catalog::get_product)
                .put(handlers::catalog::update_product)
                .delete(handlers::catalog::delete_product),
        )
        .route(
            "/api/admin/categories",
            post(handlers::catalog::create_category).get(handlers::catalog::list_categories),
        )
        .route(
            "/api/admin/categories/{id}",
            get(handlers::catalog::get_category)
                .put(handlers::catalog::update_category)
                .delete(handlers::catalog::delete_category),
        )
        // --- Marketing ---
        .route(
            "/api/admin/coupons",
            post(handlers::marketing::create_coupon).get(handlers::marketing::list_coupons),
        )
        .route(
            "/api/admin/coupons/{id}",
            get(handlers::marketing::get_coupon)
                .put(handlers::marketing::update_coupon)
                .delete(handlers::marketing::delete_coupon),
        )
        .route(
            "/api/admin/banners",
            post(handlers::marketing::create_banner).get(handlers::marketing::list_banners),
        )
        .route(
            "/api/admin/banners/{id}",
            get(handlers::marketing::get_banner)
                .put(handlers::marketing::update_banner)
                .delete(handlers::marketing::delete_banner),
        )
        .route("/api/admin/banners/{id}/slides", post(handlers::marketing::add_slide))
        .route(
            "/api/admin/banners/{id}/slides/{slide_id}",
            axum::routing::delete(handlers::marketing::delete_slide),
        )
        // --- Pedidos ---
        .route("/api/admin/orders", get(handlers::orders::list_orders))
        .route("/api/admin/orders/{id}", get(handlers::orders::get_order))
        .route("/api/admin/orders/{id}/status", patch(handlers::orders::update_order_status))
        // --- Agenda ---
        .route(
            "/api/admin/staff",
            post(handlers::booking::create_staff).get(handlers::booking::list_staff),
        )
        .route(
            "/api/admin/staff/{id}",
            get(handlers::booking::get_staff)
                .put(handlers::booking::update_staff)
                .delete(handlers::booking::delete_staff),
        )
        .route(
            "/api/admin/services",
            post(handlers::booking::create_service).get(handlers::booking::list_services),
        )
        .route(
            "/api/admin/services/{id}",
            get(handlers::booking::get_service)
                .put(handlers::booking::update_service)
                .delete(handlers::booking::delete_service),
        )
        .route("/api/admin/appointments", get(handlers::booking::list_appointments))
        .route(
            "/api/admin/appointments/{id}/status",
            patch(handlers::booking::update_appointment_status),
        )
        // --- WhatsApp e notificações ---
        .route(
            "/api/admin/whatsapp/config",
            get(handlers::whatsapp::get_config).put(handlers::whatsapp::upsert_config),
        )
        .route("/api/admin/whatsapp/conversations", get(handlers::whatsapp::list_conversations))
        .route(
            "/api/admin/whatsapp/conversations/{id}/messages",
            get(handlers::whatsapp::list_messages),
        )
        .route("/api/admin/whatsapp/messages", post(handlers::whatsapp::send_message))
        .route("/api/admin/notifications", post(handlers::notifications::send_notification))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    // Webhook da Meta (público; o token é checado no handler)
    let webhook_routes = Router::new().route(
        "/api/webhooks/whatsapp",
        get(handlers::whatsapp::verify_webhook).post(handlers::whatsapp::receive_webhook),
    );

    let cors = cors_layer(&app_state.config.frontend_url);

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(auth_routes)
        .merge(user_routes)
        .merge(store_routes)
        .merge(shop_routes)
        .merge(admin_routes)
        .merge(webhook_routes)
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(request_context))
        .layer(cors)
}

// O front manda o cookie de sessão, então a origem precisa ser explícita.
fn cors_layer(frontend_url: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(TENANT_ID_HEADER),
            REQUEST_ID_HEADER,
        ])
        .expose_headers([REQUEST_ID_HEADER])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => base.allow_origin(origin),
        Err(_) => {
            tracing::warn!(%frontend_url, "FRONTEND_URL inválida; CORS desabilitado");
            CorsLayer::new()
        }
    }
}
