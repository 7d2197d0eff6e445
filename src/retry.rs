//! Bounded retry with exponential backoff
//!
//! Attempts run strictly one after another. Between attempts the task
//! suspends on a tokio timer, so the wait never blocks other work; callers
//! cancel by dropping the returned future.

use crate::classifier::is_retryable;
use crate::metrics::metrics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryOptions {
    /// Maximum number of attempts (including the first), at least 1
    pub max_attempts: u32,
    /// Delay before the second attempt
    #[serde(with = "duration_ms")]
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    #[serde(with = "duration_ms")]
    pub max_delay: Duration,
    /// Growth factor applied after every wait, greater than 1
    pub backoff_multiplier: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryOptions {
    /// Policy used when polling a signed transaction for finality
    pub fn finality() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
            backoff_multiplier: 2.0,
        }
    }

    /// Check the invariants the retrier relies on
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.backoff_multiplier.is_nan() || self.backoff_multiplier <= 1.0 {
            return Err(format!(
                "backoff_multiplier must be greater than 1 (got {})",
                self.backoff_multiplier
            ));
        }
        if self.initial_delay > self.max_delay {
            return Err("initial_delay must not exceed max_delay".to_string());
        }
        Ok(())
    }

    /// Delay that follows `current`, capped at `max_delay`
    fn next_delay(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` is used up.
///
/// Non-retryable failures (see [`is_retryable`]) are returned at once without
/// waiting. After the last attempt the final error is returned unchanged.
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, options: &RetryOptions) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let start_time = Instant::now();
    let max_attempts = options.max_attempts.max(1);
    let mut delay = options.initial_delay.min(options.max_delay);
    let mut attempt = 1;

    loop {
        debug!(attempt, max_attempts, "Attempting operation");
        metrics().retry_attempts.inc();

        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        attempts = attempt,
                        duration_ms = start_time.elapsed().as_millis() as u64,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if attempt >= max_attempts {
            warn!(attempts = attempt, error = %err, "All retry attempts exhausted");
            metrics().retry_exhausted.inc();
            return Err(err);
        }

        if !is_retryable(&err) {
            warn!(attempt, error = %err, "Permanent error, not retrying");
            metrics().retry_aborted.inc();
            return Err(err);
        }

        debug!(
            attempt,
            backoff_ms = delay.as_millis() as u64,
            error = %err,
            "Transient error, backing off before retry"
        );
        sleep(delay).await;

        delay = options.next_delay(delay);
        attempt += 1;
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_options(max_attempts: u32) -> RetryOptions {
        RetryOptions {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<&str, String> = retry_with_backoff(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok("done")
                }
            },
            &fast_options(3),
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<u32, String> = retry_with_backoff(
            || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err("Network timeout".to_string())
                    } else {
                        Ok(n)
                    }
                }
            },
            &fast_options(3),
        )
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let started = tokio::time::Instant::now();

        let result: Result<(), String> = retry_with_backoff(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("Insufficient balance".to_string())
                }
            },
            &fast_options(5),
        )
        .await;

        assert_eq!(result.unwrap_err(), "Insufficient balance");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // No backoff was taken
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error_unchanged() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), String> = retry_with_backoff(
            || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(format!("Network timeout #{}", n))
                }
            },
            &fast_options(2),
        )
        .await;

        assert_eq!(result.unwrap_err(), "Network timeout #2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_and_caps() {
        let options = RetryOptions {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(3000),
            backoff_multiplier: 2.0,
        };
        let started = tokio::time::Instant::now();

        let result: Result<(), String> =
            retry_with_backoff(|| async { Err("fetch failed".to_string()) }, &options).await;

        assert!(result.is_err());
        // 1000 + 2000 + 3000 + 3000
        assert_eq!(started.elapsed(), Duration::from_millis(9000));
    }

    #[test]
    fn test_next_delay_caps() {
        let options = RetryOptions::finality();
        assert_eq!(options.next_delay(Duration::from_millis(1000)), Duration::from_millis(2000));
        assert_eq!(options.next_delay(Duration::from_millis(4000)), Duration::from_millis(5000));
    }

    #[test]
    fn test_validate() {
        assert!(RetryOptions::default().validate().is_ok());
        assert!(RetryOptions::finality().validate().is_ok());

        let zero = RetryOptions { max_attempts: 0, ..RetryOptions::default() };
        assert!(zero.validate().is_err());

        let flat = RetryOptions { backoff_multiplier: 1.0, ..RetryOptions::default() };
        assert!(flat.validate().is_err());

        let inverted = RetryOptions {
            initial_delay: Duration::from_secs(20),
            ..RetryOptions::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_options_roundtrip_in_millis() {
        let json = serde_json::to_value(RetryOptions::finality()).unwrap();
        assert_eq!(json["initial_delay"], 1000);
        assert_eq!(json["max_delay"], 5000);
    }
}
