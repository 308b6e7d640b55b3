//! Retry budget — bounded sequential retries with a fixed delay.
//!
//! `max_retries = N` means at most `N + 1` invocations of the operation.
//! The final error is surfaced verbatim, never wrapped, so diagnostics are
//! preserved; a non-retryable error is rethrown after exactly one attempt.
//! Attempts are strictly sequential — there is no parallel speculation.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

type Classifier<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;
type Observer<E> = Box<dyn Fn(&E, u32) + Send + Sync>;

/// Policy for [`run_with_budget`].
pub struct RetryPolicy<E> {
    max_retries: u32,
    delay: Duration,
    is_retryable: Option<Classifier<E>>,
    on_retry: Option<Observer<E>>,
}

impl<E> RetryPolicy<E> {
    /// A budget of `max_retries` retries with `delay` between attempts.
    /// Every error is considered retryable until a classifier is set.
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            delay,
            is_retryable: None,
            on_retry: None,
        }
    }

    /// Classifier deciding whether an error is worth another attempt.
    pub fn with_retryable<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.is_retryable = Some(Box::new(classifier));
        self
    }

    /// Observer invoked before each retry with the error and the 1-indexed
    /// number of the attempt that just failed.
    pub fn with_on_retry<F>(mut self, observer: F) -> Self
    where
        F: Fn(&E, u32) + Send + Sync + 'static,
    {
        self.on_retry = Some(Box::new(observer));
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn retryable(&self, error: &E) -> bool {
        self.is_retryable.as_ref().is_none_or(|f| f(error))
    }
}

/// Run `operation` under the given retry budget.
///
/// On failure: if the error is retryable and the budget is not exhausted,
/// the observer fires, the delay elapses, and the operation runs again.
/// Otherwise the error is returned unchanged. The delay is a suspension
/// point only; nothing else proceeds on this logical thread while waiting.
pub async fn run_with_budget<T, E, F, Fut>(
    policy: &RetryPolicy<E>,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !policy.retryable(&error) {
                    warn!(attempt, error = %error, "Error is not retryable; giving up");
                    return Err(error);
                }
                if attempt > policy.max_retries {
                    warn!(
                        attempts = attempt,
                        error = %error,
                        "Retry budget exhausted"
                    );
                    return Err(error);
                }
                if let Some(observer) = &policy.on_retry {
                    observer(&error, attempt);
                }
                debug!(
                    attempt,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %error,
                    "Attempt failed; retrying after delay"
                );
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
