//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. Methods that must run inside a caller's
//! transaction take `&mut Transaction<'_, Postgres>` instead.

pub mod admin_notification_repo;
pub mod low_stock_alert_repo;
pub mod order_repo;
pub mod payment_repo;
pub mod product_repo;
pub mod reservation_repo;
pub mod sync_run_repo;
pub mod vendor_repo;
pub mod webhook_event_repo;
pub mod wedding_repo;

pub use admin_notification_repo::AdminNotificationRepo;
pub use low_stock_alert_repo::LowStockAlertRepo;
pub use order_repo::OrderRepo;
pub use payment_repo::PaymentRepo;
pub use product_repo::{ProductRepo, VariantRepo};
pub use reservation_repo::ReservationRepo;
pub use sync_run_repo::SyncRunRepo;
pub use vendor_repo::VendorRepo;
pub use webhook_event_repo::WebhookEventRepo;
pub use wedding_repo::{InvitationRepo, MeasurementRepo, OutfitRepo, PartyMemberRepo, WeddingRepo};
