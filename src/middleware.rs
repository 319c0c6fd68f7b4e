pub mod auth;
pub mod context;
pub mod rbac;
pub mod tenancy;
