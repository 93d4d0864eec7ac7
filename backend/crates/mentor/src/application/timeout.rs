use std::future::Future;
use std::time::Duration;

use crate::error::{StoreError, StoreResult};

/// Run a store call under `limit`; elapsing counts as a failed call
pub async fn bounded<T>(
    limit: Duration,
    operation: &'static str,
    call: impl Future<Output = StoreResult<T>>,
) -> StoreResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(operation, limit_ms = limit.as_millis() as u64, "Store call timed out");
            Err(StoreError::timed_out(operation, limit))
        }
    }
}
