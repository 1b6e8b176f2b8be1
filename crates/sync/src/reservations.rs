use kct_db::repositories::ReservationRepo;
use sqlx::PgPool;

/// Delete expired inventory holds. Returns the number removed.
pub async fn sweep_expired_reservations(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let removed = ReservationRepo::sweep_expired(pool).await?;
    if removed > 0 {
        tracing::info!(removed, "Swept expired reservations");
    } else {
        tracing::debug!("No expired reservations");
    }
    Ok(removed)
}
