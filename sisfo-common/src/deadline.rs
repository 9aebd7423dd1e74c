//! Per-call deadlines
//!
//! Every engine call runs under the configured timeout. Expiry drops the
//! in-flight future; an open `sqlx::Transaction` inside it rolls back on drop.

use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;

/// Default per-call timeout in seconds
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 5;

/// Run `fut` with a deadline, surfacing expiry as `Error::Timeout`
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "call deadline exceeded");
            Err(Error::Timeout(limit))
        }
    }
}
