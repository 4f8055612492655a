//! # Bounded Read Retry
//!
//! Data committed through one organization's peer reaches the other
//! organization's peer by gossip. A read issued right after the commit may
//! come back empty or stale; it is retried with a fixed backoff until it
//! converges or the policy runs out.
//!
//! Only stale reads (`ProtocolError::is_stale_read`) are retried. Transport
//! failures, rejections and malformed payloads are returned at once.

use crate::config::RetryPolicy;
use crate::domain::Step;
use crate::error::Result;
use std::future::Future;
use tracing::debug;

/// Run `read` until it succeeds, fails with a non-stale error, or
/// `policy.max_attempts` attempts have been made. The last error is returned
/// when attempts run out.
pub async fn read_with_retry<T, F, Fut>(policy: RetryPolicy, step: Step, mut read: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match read().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(%step, attempt, "Read converged");
                }
                return Ok(value);
            }
            Err(e) if e.is_stale_read() && attempt < max_attempts => {
                debug!(
                    %step,
                    attempt,
                    max_attempts,
                    error = %e,
                    "Read not converged, retrying"
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
