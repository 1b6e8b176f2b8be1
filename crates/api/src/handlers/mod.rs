pub mod checkout;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod shipping;
pub mod vendor;
pub mod webhooks;
pub mod wedding;
