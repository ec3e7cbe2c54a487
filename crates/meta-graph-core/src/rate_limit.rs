//! Request throughput limiting over a rolling window.
//!
//! One [`RateLimiter`] is shared by every call issued through a single
//! [`GraphClient`](crate::GraphClient) instance. Calls under the window
//! budget are admitted immediately; over-budget callers queue in arrival
//! order and are drained FIFO as the window rolls over.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

/// Rate limiting policy constants.
///
/// The defaults (200 admissions per 60 second window, drained on a 100 ms
/// tick) are policy, not protocol — override them per client when the
/// deployment calls for it.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum admissions per rolling window
    pub max_requests: u32,

    /// Rolling window duration
    pub window: Duration,

    /// How often the drain task re-checks the window for queued callers
    pub poll_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 200,
            window: Duration::from_secs(60),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl RateLimitConfig {
    /// Set the per-window admission budget.
    pub fn with_max_requests(mut self, max_requests: u32) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Set the rolling window duration.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set the drain tick interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Rolling-window state shared by all callers of one limiter.
///
/// Invariant: `request_count` never exceeds `max_requests` while the window
/// is live; when the window elapses, both the counter and the window start
/// reset together before any new admission is counted.
#[derive(Debug)]
struct WindowState {
    window_start: Instant,
    request_count: u32,
    queue: VecDeque<oneshot::Sender<()>>,
    draining: bool,
}

impl WindowState {
    fn roll_window(&mut self, now: Instant, window: Duration) {
        if now.duration_since(self.window_start) > window {
            self.window_start = now;
            self.request_count = 0;
        }
    }
}

/// Enforces a maximum-requests-per-rolling-window budget.
///
/// Cloning is cheap and shares the window state, so a client and the
/// wrappers built on it all draw from the same budget.
///
/// # Ordering
///
/// Queued callers are admitted strictly in arrival order — a caller that
/// queued earlier is never admitted after one that queued later. A caller
/// that finds free capacity mid-window is admitted without queueing.
///
/// # Examples
///
/// ```rust,no_run
/// use meta_graph_core::{RateLimitConfig, RateLimiter};
///
/// # async fn example() {
/// let limiter = RateLimiter::new(RateLimitConfig::default());
/// let value = limiter.execute(|| async { 2 + 2 }).await;
/// assert_eq!(value, 4);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<WindowState>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a limiter with the given policy.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(WindowState {
                window_start: Instant::now(),
                request_count: 0,
                queue: VecDeque::new(),
                draining: false,
            })),
            config,
        }
    }

    /// Get the limiter configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Wait for an admission slot in the current window.
    ///
    /// Returns immediately when the budget has headroom; otherwise the
    /// caller parks in the FIFO queue until the drain task hands it a slot.
    pub async fn acquire(&self) {
        let waiter = {
            let mut state = lock_state(&self.state);
            state.roll_window(Instant::now(), self.config.window);

            if state.request_count < self.config.max_requests {
                state.request_count += 1;
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.queue.push_back(tx);
                let start_drain = !state.draining;
                state.draining = true;
                debug!(
                    queued = state.queue.len(),
                    "request budget exhausted, queueing caller"
                );
                Some((rx, start_drain))
            }
        };

        if let Some((rx, start_drain)) = waiter {
            if start_drain {
                self.spawn_drain();
            }
            // A dropped sender means the limiter itself went away; proceeding
            // is better than deadlocking the caller.
            let _ = rx.await;
        }
    }

    /// Run `operation` once an admission slot is available.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        self.acquire().await;
        operation().await
    }

    /// Number of callers currently parked in the queue.
    pub fn queue_depth(&self) -> usize {
        lock_state(&self.state).queue.len()
    }

    fn spawn_drain(&self) {
        let state = Arc::clone(&self.state);
        let config = self.config.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(config.poll_interval).await;
                let mut guard = lock_state(&state);
                guard.roll_window(Instant::now(), config.window);

                while guard.request_count < config.max_requests {
                    match guard.queue.pop_front() {
                        Some(waiter) => {
                            guard.request_count += 1;
                            // Receiver may have been dropped by a cancelled
                            // caller; the slot is still consumed.
                            let _ = waiter.send(());
                        }
                        None => break,
                    }
                }

                if guard.queue.is_empty() {
                    guard.draining = false;
                    break;
                }
            }
        });
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

fn lock_state(state: &Mutex<WindowState>) -> MutexGuard<'_, WindowState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
#[path = "rate_limit_tests.rs"]
mod tests;
