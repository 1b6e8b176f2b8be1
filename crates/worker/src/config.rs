use std::time::Duration;

pub const DEFAULT_CATALOG_SYNC_SECS: u64 = 3600;
pub const DEFAULT_INVENTORY_SYNC_SECS: u64 = 900;
pub const DEFAULT_LOW_STOCK_SCAN_SECS: u64 = 1800;
pub const DEFAULT_RESERVATION_SWEEP_SECS: u64 = 60;

/// Job periods. `None` disables a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub catalog_sync: Option<Duration>,
    pub inventory_sync: Option<Duration>,
    pub low_stock_scan: Option<Duration>,
    pub reservation_sweep: Option<Duration>,
}

impl WorkerConfig {
    /// Load job periods from environment variables.
    ///
    /// | Env Var                            | Default |
    /// |------------------------------------|---------|
    /// | `CATALOG_SYNC_INTERVAL_SECS`       | `3600`  |
    /// | `INVENTORY_SYNC_INTERVAL_SECS`     | `900`   |
    /// | `LOW_STOCK_SCAN_INTERVAL_SECS`     | `1800`  |
    /// | `RESERVATION_SWEEP_INTERVAL_SECS`  | `60`    |
    ///
    /// `0` disables the job. Panics on a value that is not a number.
    pub fn from_env() -> Self {
        let period = |key: &str, default: u64| {
            parse_period(std::env::var(key).ok().as_deref(), default)
                .unwrap_or_else(|| panic!("{key} must be a whole number of seconds"))
        };
        Self {
            catalog_sync: period("CATALOG_SYNC_INTERVAL_SECS", DEFAULT_CATALOG_SYNC_SECS),
            inventory_sync: period("INVENTORY_SYNC_INTERVAL_SECS", DEFAULT_INVENTORY_SYNC_SECS),
            low_stock_scan: period("LOW_STOCK_SCAN_INTERVAL_SECS", DEFAULT_LOW_STOCK_SCAN_SECS),
            reservation_sweep: period(
                "RESERVATION_SWEEP_INTERVAL_SECS",
                DEFAULT_RESERVATION_SWEEP_SECS,
            ),
        }
    }
}

/// `Some(None)` for a disabled job, `None` for an unparsable value.
fn parse_period(raw: Option<&str>, default_secs: u64) -> Option<Option<Duration>> {
    let secs = match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value.parse::<u64>().ok()?,
        None => default_secs,
    };
    Some((secs > 0).then(|| Duration::from_secs(secs)))
}
