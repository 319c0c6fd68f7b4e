pub mod auth;
pub mod booking_service;
pub mod cart_service;
pub mod catalog_service;
pub mod jobs;
pub mod marketing_service;
pub mod notification;
pub mod notification_service;
pub mod order_service;
pub mod permission_cache;
pub mod rbac_service;
pub mod tenancy_service;
pub mod whatsapp_api;
pub mod whatsapp_service;
