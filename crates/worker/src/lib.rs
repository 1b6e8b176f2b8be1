//! Scheduled background jobs: Shopify catalog and inventory syncs, the
//! low-stock scan and the expired-reservation sweep.

pub mod config;
pub mod jobs;
