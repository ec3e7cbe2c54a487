//! Retry handling with bounded exponential backoff.
//!
//! Transient failures (timeouts, resets, HTTP 429, any 5xx — see
//! [`GraphError::is_transient`]) are retried up to a configured bound with
//! full exponential backoff; everything else propagates immediately.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::error::GraphError;

/// Observer invoked before each backoff wait with the 1-based attempt number
/// and the error that triggered the retry. Purely informational — it cannot
/// affect control flow.
pub type RetryObserver = Arc<dyn Fn(u32, &GraphError) + Send + Sync>;

/// Retry policy for transient errors.
///
/// Controls exponential backoff retry behavior.
///
/// # Examples
///
/// ```
/// use meta_graph_core::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(5, Duration::from_millis(500), Duration::from_secs(10));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not counting the initial call)
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each subsequent attempt
    pub base_delay: Duration,

    /// Cap applied to the computed backoff delay
    pub max_delay: Duration,

    /// Whether to add ±25% jitter to delays
    pub use_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            use_jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with custom settings.
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            use_jitter: false,
        }
    }

    /// Enable ±25% randomization of delays.
    ///
    /// Jitter helps prevent thundering herd problems when multiple clients
    /// retry simultaneously.
    pub fn with_jitter(mut self) -> Self {
        self.use_jitter = true;
        self
    }

    /// Disable jitter. Delays then match `min(base_delay * 2^attempt,
    /// max_delay)` exactly, which is the default.
    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// Calculate the backoff delay for a retry attempt (0-indexed).
    ///
    /// Full exponential backoff: `min(base_delay * 2^attempt, max_delay)`,
    /// with optional jitter applied after the cap.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // 2^attempt saturates well past any sane cap; clamp the shift so it
        // cannot overflow u64.
        let factor = 1u64 << attempt.min(20);
        let delay_ms = (self.base_delay.as_millis() as u64).saturating_mul(factor);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as u64);
        let mut delay = Duration::from_millis(capped_ms);

        if self.use_jitter {
            use rand::Rng;
            let jitter_factor = rand::thread_rng().gen_range(0.75..=1.25);
            delay = Duration::from_millis((delay.as_millis() as f64 * jitter_factor) as u64);
        }

        delay
    }

    /// Check if another retry attempt should be made.
    ///
    /// `attempt` is the number of retries already performed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// Executes operations with retry-on-transient-failure semantics.
///
/// Attempt state is local to one [`execute`] call and discarded after
/// success or exhaustion; concurrent calls retry independently.
///
/// [`execute`]: RetryHandler::execute
#[derive(Clone)]
pub struct RetryHandler {
    policy: RetryPolicy,
    on_retry: Option<RetryObserver>,
}

impl RetryHandler {
    /// Create a handler with the given policy and no observer.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            on_retry: None,
        }
    }

    /// Create a handler that reports every retry to `observer` before the
    /// backoff wait. The observer receives the 1-based attempt number.
    pub fn with_observer(
        policy: RetryPolicy,
        observer: impl Fn(u32, &GraphError) + Send + Sync + 'static,
    ) -> Self {
        Self {
            policy,
            on_retry: Some(Arc::new(observer)),
        }
    }

    /// Get the retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation`, retrying transient failures with exponential backoff.
    ///
    /// The operation is invoked at most `max_retries + 1` times. A
    /// non-transient failure, or a transient one once attempts are
    /// exhausted, propagates unchanged — the caller sees the most recent
    /// error, never an aggregate.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use meta_graph_core::{RetryHandler, RetryPolicy};
    /// # async fn example() -> Result<(), meta_graph_core::GraphError> {
    /// let handler = RetryHandler::new(RetryPolicy::default());
    /// let value = handler.execute(|| async { Ok::<_, _>(42) }).await?;
    /// assert_eq!(value, 42);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, GraphError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GraphError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if self.policy.should_retry(attempt) && error.is_transient() => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    attempt += 1;
                    if let Some(observer) = &self.on_retry {
                        observer(attempt, &error);
                    }
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying transient failure"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl std::fmt::Debug for RetryHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryHandler")
            .field("policy", &self.policy)
            .field("on_retry", &self.on_retry.as_ref().map(|_| "<observer>"))
            .finish()
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
