use std::future::Future;
use std::time::Duration;

use crate::constants::{RETRY_BASE_DELAY_MS, RETRY_MAX_ATTEMPTS};
use crate::errors::StoreError;

/// Runs a read-only store operation, retrying transient failures with exponential backoff.
///
/// Never wrap the pool claim or the match insert in this: a retried claim whose first
/// attempt actually landed would report the entry as lost.
pub async fn retry_transient<T, F, Fut>(operation: &'static str, mut f: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < RETRY_MAX_ATTEMPTS => {
                tracing::warn!(
                    operation,
                    attempt,
                    "transient store failure, retrying in {:?}: {}",
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
