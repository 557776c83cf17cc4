//! Bounded exponential backoff for transient collaborator failures.

use std::time::Duration;

use tracing::warn;

/// Retry policy for transient probe and router failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts before the error escalates.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per attempt.
    pub base_delay: Duration,
    /// Cap on the per-attempt delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Run `op` until it succeeds or the attempt budget is spent.
///
/// The delay doubles per attempt up to `max_delay`. The final error is
/// returned unchanged for the caller to escalate.
pub async fn with_retry<T, E, Fut, F>(policy: &RetryPolicy, op: &str, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = policy.base_delay;
    let mut attempt = 1u32;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts => {
                warn!(op, attempt, error = %e, "transient failure, retrying");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
