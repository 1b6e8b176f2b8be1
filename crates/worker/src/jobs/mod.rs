//! Periodic jobs. Each job has a `tick` that does one pass and a `run` loop
//! that calls it until cancelled.

pub mod catalog_sync;
pub mod inventory_sync;
pub mod low_stock;
pub mod reservation_sweep;

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Call `tick` every `period` until `cancel` fires.
///
/// The first pass runs immediately. A pass that overruns the period delays
/// the next one instead of queueing a burst.
pub async fn run_periodic<F, Fut>(name: &'static str, period: Duration, cancel: CancellationToken, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    tracing::info!(job = name, interval_secs = period.as_secs(), "Job started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(job = name, "Job stopping");
                break;
            }
            _ = interval.tick() => tick().await,
        }
    }
}
