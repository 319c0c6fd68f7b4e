pub mod auth;
pub mod banner;
pub mod booking;
pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod notification;
pub mod order;
pub mod rbac;
pub mod tenancy;
pub mod whatsapp;
