// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,

        // --- Users ---
        handlers::auth::get_me,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_my_tenants,
        handlers::tenancy::get_current_tenant,
        handlers::tenancy::update_current_tenant,
        handlers::tenancy::list_members,
        handlers::tenancy::add_member,
        handlers::tenancy::change_member_role,
        handlers::tenancy::remove_member,

        // --- RBAC ---
        handlers::rbac::list_permissions,
        handlers::rbac::create_role,
        handlers::rbac::list_roles,
        handlers::rbac::get_role,
        handlers::rbac::update_role,
        handlers::rbac::delete_role,

        // --- Storefront ---
        handlers::catalog::list_store_products,
        handlers::catalog::get_store_product,
        handlers::catalog::list_store_categories,
        handlers::marketing::list_live_banners,
        handlers::marketing::record_impression,
        handlers::marketing::record_click,
        handlers::booking::list_store_staff,
        handlers::booking::list_store_services,
        handlers::booking::staff_availability,

        // --- Shop ---
        handlers::cart::get_cart,
        handlers::cart::add_item,
        handlers::cart::update_item,
        handlers::cart::remove_item,
        handlers::cart::clear_cart,
        handlers::cart::checkout,
        handlers::orders::list_my_orders,
        handlers::orders::get_my_order,
        handlers::marketing::validate_coupon,
        handlers::booking::book_appointment,
        handlers::booking::list_my_appointments,
        handlers::booking::cancel_my_appointment,

        // --- Catalog ---
        handlers::catalog::create_product,
        handlers::catalog::list_products,
        handlers::catalog::get_product,
        handlers::catalog::update_product,
        handlers::catalog::delete_product,
        handlers::catalog::create_category,
        handlers::catalog::list_categories,
        handlers::catalog::get_category,
        handlers::catalog::update_category,
        handlers::catalog::delete_category,

        // --- Marketing ---
        handlers::marketing::create_coupon,
        handlers::marketing::list_coupons,
        handlers::marketing::get_coupon,
        handlers::marketing::update_coupon,
        handlers::marketing::delete_coupon,
        handlers::marketing::create_banner,
        handlers::marketing::list_banners,
        handlers::marketing::get_banner,
        handlers::marketing::update_banner,
        handlers::marketing::delete_banner,
        handlers::marketing::add_slide,
        handlers::marketing::delete_slide,

        // --- Orders ---
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_order_status,

        // --- Booking ---
        handlers::booking::create_staff,
        handlers::booking::list_staff,
        handlers::booking::get_staff,
        handlers::booking::update_staff,
        handlers::booking::delete_staff,
        handlers::booking::create_service,
        handlers::booking::list_services,
        handlers::booking::get_service,
        handlers::booking::update_service,
        handlers::booking::delete_service,
        handlers::booking::list_appointments,
        handlers::booking::update_appointment_status,

        // --- WhatsApp ---
        handlers::whatsapp::verify_webhook,
        handlers::whatsapp::receive_webhook,
        handlers::whatsapp::get_config,
        handlers::whatsapp::upsert_config,
        handlers::whatsapp::list_conversations,
        handlers::whatsapp::list_messages,
        handlers::whatsapp::send_message,

        // --- Notifications ---
        handlers::notifications::send_notification,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::ForgotPasswordPayload,
            models::auth::ResetPasswordPayload,
            models::auth::AuthResponse,

            // --- Tenancy ---
            models::tenancy::Tenant,
            models::tenancy::UserTenant,
            models::tenancy::TenantMember,
            models::tenancy::CreateTenantPayload,
            models::tenancy::UpdateTenantPayload,
            models::tenancy::AddMemberPayload,
            models::tenancy::ChangeMemberRolePayload,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::Permission,
            models::rbac::CreateRolePayload,
            models::rbac::UpdateRolePayload,
            models::rbac::RoleResponse,

            // --- Catalog ---
            models::catalog::Category,
            models::catalog::Product,
            models::catalog::CreateProductPayload,
            models::catalog::UpdateProductPayload,
            models::catalog::CreateCategoryPayload,
            models::catalog::UpdateCategoryPayload,

            // --- Marketing ---
            models::coupon::DiscountType,
            models::coupon::Coupon,
            models::coupon::CreateCouponPayload,
            models::coupon::UpdateCouponPayload,
            models::coupon::ValidateCouponPayload,
            models::coupon::CouponValidation,
            models::banner::Banner,
            models::banner::Slide,
            models::banner::BannerWithSlides,
            models::banner::CreateBannerPayload,
            models::banner::UpdateBannerPayload,
            models::banner::CreateSlidePayload,

            // --- Cart / Orders ---
            models::cart::CartView,
            models::cart::CartLineView,
            models::cart::AddToCartPayload,
            models::cart::UpdateCartItemPayload,
            models::order::OrderStatus,
            models::order::Order,
            models::order::OrderItem,
            models::order::OrderDetail,
            models::order::CheckoutPayload,
            models::order::UpdateOrderStatusPayload,

            // --- Booking ---
            models::booking::Staff,
            models::booking::Service,
            models::booking::AppointmentStatus,
            models::booking::Appointment,
            models::booking::BusySlot,
            models::booking::CreateStaffPayload,
            models::booking::UpdateStaffPayload,
            models::booking::CreateServicePayload,
            models::booking::UpdateServicePayload,
            models::booking::BookAppointmentPayload,
            models::booking::UpdateAppointmentStatusPayload,

            // --- WhatsApp ---
            models::whatsapp::WhatsAppConfig,
            models::whatsapp::UpsertWhatsAppConfigPayload,
            models::whatsapp::Conversation,
            models::whatsapp::MessageDirection,
            models::whatsapp::Message,
            models::whatsapp::SendMessagePayload,

            // --- Notifications ---
            models::notification::Channel,
            models::notification::Recipients,
            models::notification::WhatsAppTemplate,
            models::notification::DeliveryStatus,
            models::notification::DeliveryReport,
            models::notification::NotifyPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação, sessão e recuperação de senha"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Tenancy", description = "Gestão de Lojas e Equipe"),
        (name = "RBAC", description = "Controle de Acesso (Cargos e Permissões)"),
        (name = "Storefront", description = "Vitrine pública da loja"),
        (name = "Shop", description = "Carrinho, checkout e agendamentos do cliente"),
        (name = "Catalog", description = "Produtos e Categorias"),
        (name = "Marketing", description = "Cupons e Banners"),
        (name = "Orders", description = "Gestão de Pedidos"),
        (name = "Booking", description = "Profissionais, Serviços e Agenda"),
        (name = "WhatsApp", description = "WhatsApp Business: webhook e atendimento"),
        (name = "Notifications", description = "Envio de notificações multicanal")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_the_main_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/api/auth/login", "/api/shop/checkout", "/api/admin/orders/{id}/status", "/api/webhooks/whatsapp"] {
            assert!(doc.paths.paths.contains_key(path), "faltando {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
