//! Domain types, constants and pure business rules for the KCT admin backend.
//!
//! Nothing in this crate touches the database or the network, so every rule
//! here is shared verbatim by the API server, the sync jobs and the worker.

pub mod checkout;
pub mod contact;
pub mod error;
pub mod notifications;
pub mod order_status;
pub mod pagination;
pub mod payments;
pub mod shipping;
pub mod signatures;
pub mod stock;
pub mod types;
pub mod vendor;
pub mod wedding;
