//! Tests for rolling-window admission, FIFO ordering, and starvation freedom.

use super::*;
use std::sync::Mutex as StdMutex;
use tokio::time::{Duration, Instant};

fn small_config(max_requests: u32, window_ms: u64) -> RateLimitConfig {
    RateLimitConfig::default()
        .with_max_requests(max_requests)
        .with_window(Duration::from_millis(window_ms))
        .with_poll_interval(Duration::from_millis(10))
}

// ============================================================================
// Test: Admission Under Budget
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_calls_under_budget_admit_with_zero_delay() {
    let limiter = RateLimiter::new(small_config(10, 1_000));

    let started = Instant::now();
    for _ in 0..10 {
        limiter.acquire().await;
    }

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(limiter.queue_depth(), 0);
}

#[tokio::test]
async fn test_execute_returns_operation_result() {
    let limiter = RateLimiter::new(small_config(5, 1_000));

    let value = limiter.execute(|| async { "payload" }).await;

    assert_eq!(value, "payload");
}

// ============================================================================
// Test: FIFO Ordering Over Budget
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_queued_callers_admit_in_arrival_order() {
    // Arrange: budget of 2 per 1s window; issue 5 concurrent calls
    let limiter = RateLimiter::new(small_config(2, 1_000));
    let admissions: Arc<StdMutex<Vec<(usize, Instant)>>> = Arc::new(StdMutex::new(Vec::new()));
    let started = Instant::now();

    let mut handles = Vec::new();
    for index in 0..5 {
        let limiter = limiter.clone();
        let admissions = Arc::clone(&admissions);
        handles.push(tokio::spawn(async move {
            limiter.acquire().await;
            admissions.lock().unwrap().push((index, Instant::now()));
        }));
        // Let each task reach the limiter before spawning the next so the
        // arrival order is deterministic.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    }

    for handle in handles {
        handle.await.expect("admission task should not panic");
    }

    // Assert: strict arrival order, and no queued caller admitted before the
    // window that grants it capacity has elapsed.
    let admissions = admissions.lock().unwrap();
    let order: Vec<usize> = admissions.iter().map(|(index, _)| *index).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);

    let window = Duration::from_millis(1_000);
    assert_eq!(admissions[0].1.duration_since(started), Duration::ZERO);
    assert_eq!(admissions[1].1.duration_since(started), Duration::ZERO);
    assert!(admissions[2].1.duration_since(started) > window);
    assert!(admissions[3].1.duration_since(started) > window);
    // The fifth caller needs a second window rollover.
    assert!(admissions[4].1.duration_since(started) > window * 2);
}

// ============================================================================
// Test: Window Reset and Starvation Freedom
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_counter_resets_when_window_elapses() {
    let limiter = RateLimiter::new(small_config(1, 200));

    let started = Instant::now();
    limiter.acquire().await;
    assert_eq!(started.elapsed(), Duration::ZERO);

    // Sleeping past the window makes the next admission free again.
    tokio::time::sleep(Duration::from_millis(250)).await;
    let before_second = Instant::now();
    limiter.acquire().await;
    assert_eq!(before_second.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_every_queued_caller_is_eventually_admitted() {
    let limiter = RateLimiter::new(small_config(1, 100));
    let admitted = Arc::new(StdMutex::new(0usize));

    let mut handles = Vec::new();
    for _ in 0..6 {
        let limiter = limiter.clone();
        let admitted = Arc::clone(&admitted);
        handles.push(tokio::spawn(async move {
            limiter.acquire().await;
            *admitted.lock().unwrap() += 1;
        }));
        tokio::task::yield_now().await;
    }

    for handle in handles {
        handle.await.expect("admission task should not panic");
    }

    assert_eq!(*admitted.lock().unwrap(), 6);
    assert_eq!(limiter.queue_depth(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_queue_depth_reports_parked_callers() {
    let limiter = RateLimiter::new(small_config(1, 10_000));

    limiter.acquire().await;

    let parked = limiter.clone();
    tokio::spawn(async move { parked.acquire().await });
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    assert_eq!(limiter.queue_depth(), 1);
}
