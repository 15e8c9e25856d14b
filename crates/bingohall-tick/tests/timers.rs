//! Integration tests for the room timers.
//!
//! Runs with paused Tokio time: sleeps resolve as soon as the runtime is
//! idle, and `Instant::now()` only moves when the clock auto-advances.

use std::time::Duration;

use bingohall_tick::{CallTicker, Countdown};
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

fn ticker() -> CallTicker {
    CallTicker::new(Duration::from_secs(2), Duration::from_secs(10))
}

// =========================================================================
// CallTicker
// =========================================================================

#[test]
fn test_new_ticker_is_stopped() {
    let t = ticker();
    assert!(!t.is_running());
    assert_eq!(t.interval(), None);
    assert_eq!(t.ticks(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_clamps_interval() {
    let mut t = ticker();
    assert_eq!(t.start(Duration::from_millis(1_000)), Duration::from_secs(2));
    assert_eq!(t.start(Duration::from_secs(60)), Duration::from_secs(10));
    assert_eq!(t.start(Duration::from_millis(4_500)), Duration::from_millis(4_500));
    assert_eq!(t.interval(), Some(Duration::from_millis(4_500)));
}

#[tokio::test(start_paused = true)]
async fn test_clamped_ticker_never_fires_faster_than_floor() {
    let mut t = ticker();
    t.start(Duration::from_millis(1_000));

    let mut last = Instant::now();
    for expected in 1..=5 {
        assert_eq!(t.tick().await, expected);
        let now = Instant::now();
        assert!(now - last >= Duration::from_secs(2));
        last = now;
    }
}

#[tokio::test(start_paused = true)]
async fn test_stopped_ticker_pends() {
    let mut t = ticker();
    let result = tokio::time::timeout(Duration::from_secs(30), t.tick()).await;
    assert!(result.is_err(), "stopped ticker should pend forever");
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent_and_halts_ticks() {
    let mut t = ticker();
    t.start(Duration::from_secs(2));
    t.tick().await;

    t.stop();
    t.stop();
    assert!(!t.is_running());

    let result = tokio::time::timeout(Duration::from_secs(30), t.tick()).await;
    assert!(result.is_err());
    assert_eq!(t.ticks(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restart_replaces_schedule() {
    let mut t = ticker();
    t.start(Duration::from_secs(10));
    tokio::time::advance(Duration::from_secs(9)).await;

    // Restarting pushes the next tick a full new interval out.
    let restarted = Instant::now();
    t.start(Duration::from_secs(3));
    t.tick().await;
    assert!(Instant::now() - restarted >= Duration::from_secs(3));
    assert_eq!(t.ticks(), 1);
}

// =========================================================================
// Countdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_fires_once_then_disarms() {
    let mut c = Countdown::new();
    let started = Instant::now();
    c.start(Duration::from_secs(60));
    assert!(c.is_armed());

    c.expired().await;
    assert!(Instant::now() - started >= Duration::from_secs(60));
    assert!(!c.is_armed());

    let again = tokio::time::timeout(Duration::from_secs(120), c.expired()).await;
    assert!(again.is_err(), "disarmed countdown should pend");
}

#[tokio::test(start_paused = true)]
async fn test_countdown_cancel() {
    let mut c = Countdown::new();
    assert!(!c.cancel());

    c.start(Duration::from_secs(5));
    assert!(c.cancel());
    assert!(!c.is_armed());
    assert_eq!(c.remaining(), None);

    let result = tokio::time::timeout(Duration::from_secs(10), c.expired()).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_countdown_restart_replaces_deadline() {
    let mut c = Countdown::new();
    c.start(Duration::from_secs(5));
    c.start(Duration::from_secs(20));
    assert_eq!(c.remaining(), Some(Duration::from_secs(20)));

    let early = tokio::time::timeout(Duration::from_secs(10), c.expired()).await;
    assert!(early.is_err(), "old deadline must not fire");
    assert!(c.is_armed());

    c.expired().await;
    assert!(!c.is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_wait_keeps_timer_armed() {
    let mut c = Countdown::new();
    c.start(Duration::from_secs(5));

    // Losing a select! race must not disarm the countdown.
    tokio::select! {
        _ = c.expired() => panic!("countdown fired early"),
        _ = tokio::time::sleep(Duration::from_secs(1)) => {}
    }
    assert!(c.is_armed());
}
