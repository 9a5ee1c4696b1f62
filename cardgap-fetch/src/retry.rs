//! Retry policy for API requests.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::FetchError;

/// Default number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// How one attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The attempt succeeded.
    Success,
    /// The attempt failed and may succeed if repeated.
    Retryable,
    /// The attempt failed and repeating it will not help.
    Fatal,
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the default delays.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Calculates the delay before retry `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Classifies the result of one attempt.
    pub fn classify<T>(result: &Result<T, FetchError>) -> AttemptOutcome {
        let Err(error) = result else {
            return AttemptOutcome::Success;
        };

        match error {
            FetchError::Client { .. }
            | FetchError::MalformedResponse(_)
            | FetchError::Json(_)
            | FetchError::InvalidUrl(_)
            | FetchError::AlreadyInFlight(_)
            | FetchError::NotCached(_)
            | FetchError::Store(_) => AttemptOutcome::Fatal,
            FetchError::Http(e) => match e.status().map(|s| s.as_u16()) {
                Some(status) if (400..500).contains(&status) && status != 429 => {
                    AttemptOutcome::Fatal
                }
                _ => AttemptOutcome::Retryable,
            },
            FetchError::Timeout(_) | FetchError::RateLimited { .. } | FetchError::Server { .. } => {
                AttemptOutcome::Retryable
            }
        }
    }

    /// Runs `op` until it succeeds, fails fatally, or attempts run out.
    ///
    /// After the last attempt the last error is returned unchanged.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = op().await;

            match Self::classify(&result) {
                AttemptOutcome::Success => return result,
                AttemptOutcome::Fatal => {
                    if let Err(e) = &result {
                        debug!(attempt, error = %e, "Fatal error, not retrying");
                    }
                    return result;
                }
                AttemptOutcome::Retryable => {
                    if attempt >= max_attempts {
                        if let Err(e) = &result {
                            warn!(attempts = attempt, error = %e, "Retries exhausted");
                        }
                        return result;
                    }

                    let delay = self.delay_for_attempt(attempt);
                    if let Err(e) = &result {
                        warn!(
                            attempt,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            error = %e,
                            "Request failed, retrying"
                        );
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}
