use std::future::Future;
use std::time::Duration;

use kct_integrations::IntegrationError;

/// Backoff between attempts of a vendor call.
pub const DEFAULT_RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// Run `op`, retrying retryable errors once per entry in `delays`.
///
/// A rate-limit error carrying `Retry-After` waits for that long instead of
/// the scheduled delay.
pub async fn with_retry<T, F, Fut>(delays: &[Duration], mut op: F) -> Result<T, IntegrationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, IntegrationError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < delays.len() => {
                let wait = err.retry_after().unwrap_or(delays[attempt]);
                attempt += 1;
                tracing::warn!(
                    error = %err,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    "Vendor call failed, retrying"
                );
                tokio::time::sleep(wait).await;
            }
            Err(err) => return Err(err),
        }
    }
}
