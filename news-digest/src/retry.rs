use backoff::backoff::{Backoff, Constant};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Fixed-delay retry: `max_attempts` tries with `delay` between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }
}

/// Returned when every attempt failed; carries the last error.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Run `op` until it succeeds or the policy's attempts are used up.
///
/// `op` receives the 1-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    mut op: F,
) -> Result<T, Exhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = Constant::new(policy.delay);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(last) if attempt >= max_attempts => {
                return Err(Exhausted {
                    attempts: attempt,
                    last,
                })
            }
            Err(e) => {
                let delay = backoff.next_backoff().unwrap_or(policy.delay);
                warn!(
                    attempt,
                    max = max_attempts,
                    ?delay,
                    error = %e,
                    "attempt failed; backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
