//! Retry logic for probe attempts.
//!
//! Each attempt produces an explicit result. The retry decision is a match on the
//! closed [`AttemptError`] enumeration: transient network and TLS failures are
//! retried up to the attempt budget, anything else ends the sequence at once.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::probe::AttemptError;

/// Configuration for retry behavior.
///
/// The default is three attempts with no delay between them. A non-zero
/// `initial_delay` enables exponential backoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: usize,
    /// Delay before the first retry. Zero disables backoff entirely.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth).
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (delay *= multiplier after each retry).
    pub multiplier: f64,
    /// Whether to add random jitter to delays.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::ZERO,
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default three attempts and no delay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of attempts. Always at least one.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the delay before the first retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier. Values below 1.0 are clamped to 1.0.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Calculates the delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        if attempt == 0 {
            return self.initial_delay;
        }

        // 2^20 is already far past any sane max_delay
        let safe_attempt = attempt.min(20) as i32;

        let base_delay = self.initial_delay.as_millis() as f64 * self.multiplier.powi(safe_attempt);
        let capped_delay = base_delay.min(self.max_delay.as_millis() as f64);

        let final_delay = if self.jitter {
            let mut rng = rand::thread_rng();
            capped_delay * rng.gen_range(0.5..1.0)
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay as u64)
    }
}

/// Retries timeouts, connection failures and TLS failures. Unexpected errors
/// end the sequence on the first occurrence.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkRetryClassifier;

impl NetworkRetryClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Whether a failed attempt is worth another try.
    pub fn is_retryable(&self, error: &AttemptError) -> bool {
        match error {
            AttemptError::Timeout => true,
            AttemptError::Connect(_) => true,
            AttemptError::Tls(_) => true,
            AttemptError::Unexpected(_) => false,
        }
    }
}

/// Result of a retried operation plus the number of attempts it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    pub result: Result<T, AttemptError>,
    pub attempts: usize,
}

/// Drives an attempt sequence under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    classifier: NetworkRetryClassifier,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            classifier: NetworkRetryClassifier::new(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error, or
    /// the attempt budget is spent. The operation receives the 1-based attempt
    /// number.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Retried<T>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match operation(attempt).await {
                Ok(value) => {
                    return Retried {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) => e,
            };

            if !self.classifier.is_retryable(&error) || attempt >= max_attempts {
                return Retried {
                    result: Err(error),
                    attempts: attempt,
                };
            }

            let delay = self.policy.delay_for_attempt(attempt - 1);
            debug!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying after transient error"
            );

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}
