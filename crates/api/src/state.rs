use std::sync::Arc;

use kct_integrations::Integrations;
use kct_sync::catalog::SyncOptions;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference counted and everything else is
/// behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: kct_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Third-party clients; each may be unconfigured.
    pub integrations: Integrations,
    /// Options for on-demand catalog syncs.
    pub sync_options: Arc<SyncOptions>,
}
