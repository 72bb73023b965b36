//! Deadlines for provider calls.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::VoxError;

/// Bound a provider call by `duration`.
///
/// The future is dropped on expiry, which cancels the in-flight request;
/// nothing has been written to the cache at that point.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, VoxError>>,
) -> Result<T, VoxError> {
    tokio::time::timeout(duration, future).await.unwrap_or_else(|_| {
        let millis = deadline_millis(duration);
        debug!(timeout_ms = millis, "provider call exceeded its deadline");
        Err(VoxError::Timeout(millis))
    })
}

fn deadline_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
