pub mod auth;
pub mod booking;
pub mod cart;
pub mod catalog;
pub mod marketing;
pub mod notifications;
pub mod orders;
pub mod rbac;
pub mod tenancy;
pub mod whatsapp;
