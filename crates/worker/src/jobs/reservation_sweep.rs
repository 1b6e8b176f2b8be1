use std::time::Duration;

use kct_sync::reservations::sweep_expired_reservations;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Delete expired checkout holds.
pub async fn tick(pool: &PgPool) {
    match sweep_expired_reservations(pool).await {
        Ok(0) => tracing::debug!("Reservation sweep: nothing expired"),
        Ok(removed) => tracing::info!(removed, "Reservation sweep: expired holds removed"),
        Err(e) => tracing::error!(error = %e, "Reservation sweep failed"),
    }
}

pub async fn run(pool: PgPool, period: Duration, cancel: CancellationToken) {
    super::run_periodic("reservation_sweep", period, cancel, || tick(&pool)).await;
}
