//! Bounded retry with exponential backoff
//!
//! Every remote call in this crate goes through [`retry_request`].
//! Transient failures (sleeping vehicle, rate limiting, 5xx, transport
//! errors) are retried up to a configured attempt budget with a doubling
//! delay; permanent failures and exhaustion are returned to the caller
//! instead of looping.

use crate::config::RetryConfig;
use crate::error::{KeraunosError, Result};
use crate::logging::get_logger;
use std::time::Duration;
use tokio::time::sleep;

/// Retry policy for remote API calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            // An attempt budget of zero would never run the operation.
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// Execute an operation with bounded retry and exponential backoff.
///
/// Only errors classified as transient are retried; anything else is
/// returned on first occurrence. Once the attempt budget is spent the
/// last transient failure is wrapped in
/// [`KeraunosError::RetryExhausted`].
pub async fn retry_request<T, F, Fut>(policy: &RetryPolicy, operation_name: &str, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let logger = get_logger("retry");
    let mut delay = policy.initial_delay;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                if attempt >= policy.max_attempts {
                    return Err(KeraunosError::retry_exhausted(operation_name, attempt, &e));
                }
                logger.warn(&format!(
                    "{} attempt {}/{} failed ({}), retrying in {:?}",
                    operation_name, attempt, policy.max_attempts, e, delay
                ));
                sleep(delay).await;
                delay = delay.saturating_mul(2).min(policy.max_delay);
            }
            Err(e) => return Err(e),
        }
    }
}
