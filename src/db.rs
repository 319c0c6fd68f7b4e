pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod coupon_repo;
pub use coupon_repo::CouponRepository;
pub mod banner_repo;
pub use banner_repo::BannerRepository;
pub mod cart_repo;
pub use cart_repo::CartRepository;
pub mod order_repo;
pub use order_repo::OrderRepository;
pub mod booking_repo;
pub use booking_repo::BookingRepository;
pub mod whatsapp_repo;
pub use whatsapp_repo::WhatsAppRepository;
