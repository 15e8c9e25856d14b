//! Room timers for Bingohall.
//!
//! A room owns exactly two timers:
//!
//! - [`CallTicker`]: a repeating ticker that drives automatic number calls.
//! - [`Countdown`]: a one-shot timer that ends a host-declared timeout.
//!
//! Each timer is a single slot. Starting it again replaces the previous
//! deadline instead of stacking a second one, so a room can never have
//! two tickers or two countdowns running at once.
//!
//! # Integration
//!
//! Both timers are meant to sit inside a room actor's `tokio::select!`
//! loop. While stopped, their futures pend forever:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         _ = ticker.tick() => { /* call the next number */ }
//!         _ = countdown.expired() => { /* end the timeout */ }
//!     }
//! }
//! ```
//!
//! Both futures only touch their timer's state after the sleep completes,
//! so dropping them when another branch wins loses nothing.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// CallTicker
// ---------------------------------------------------------------------------

/// Repeating ticker with an interval clamped to fixed bounds.
#[derive(Debug)]
pub struct CallTicker {
    min: Duration,
    max: Duration,
    interval: Option<Duration>,
    /// When the next tick should fire (Tokio instant for `sleep_until`).
    next_tick: Option<Instant>,
    ticks: u64,
}

impl CallTicker {
    /// Creates a stopped ticker whose intervals are kept within
    /// `min..=max`.
    pub fn new(min: Duration, max: Duration) -> Self {
        let max = max.max(min);
        Self {
            min,
            max,
            interval: None,
            next_tick: None,
            ticks: 0,
        }
    }

    /// (Re)starts the ticker. Any running schedule is replaced, and the
    /// first tick fires one full interval from now.
    ///
    /// Returns the interval actually used after clamping.
    pub fn start(&mut self, requested: Duration) -> Duration {
        let interval = requested.clamp(self.min, self.max);
        if interval != requested {
            debug!(
                requested_ms = requested.as_millis() as u64,
                interval_ms = interval.as_millis() as u64,
                "call interval clamped"
            );
        }

        let replaced = self.interval.is_some();
        self.interval = Some(interval);
        self.next_tick = Some(Instant::now() + interval);
        debug!(
            interval_ms = interval.as_millis() as u64,
            replaced, "call ticker started"
        );
        interval
    }

    /// Stops the ticker. Safe to call when already stopped.
    pub fn stop(&mut self) {
        if self.interval.take().is_some() {
            self.next_tick = None;
            debug!(ticks = self.ticks, "call ticker stopped");
        }
    }

    /// Waits for the next tick and returns the running tick count.
    ///
    /// Pends forever while the ticker is stopped.
    pub async fn tick(&mut self) -> u64 {
        let (next, interval) = match (self.next_tick, self.interval) {
            (Some(next), Some(interval)) => (next, interval),
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        // Schedule from now, not from the missed deadline, so a stalled
        // room never fires a burst of catch-up calls.
        self.next_tick = Some(Instant::now() + interval);
        self.ticks += 1;
        trace!(tick = self.ticks, "call tick");
        self.ticks
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// The current interval, or `None` while stopped.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Total ticks fired over the ticker's lifetime.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// One-shot timer. Fires once, then disarms itself.
#[derive(Debug, Default)]
pub struct Countdown {
    deadline: Option<Instant>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the countdown, replacing any deadline already set.
    pub fn start(&mut self, duration: Duration) {
        let replaced = self.deadline.is_some();
        self.deadline = Some(Instant::now() + duration);
        debug!(
            duration_ms = duration.as_millis() as u64,
            replaced, "countdown started"
        );
    }

    /// Disarms the countdown. Returns `true` if it was armed.
    pub fn cancel(&mut self) -> bool {
        let was_armed = self.deadline.take().is_some();
        if was_armed {
            debug!("countdown cancelled");
        }
        was_armed
    }

    /// Waits for the deadline, then disarms.
    ///
    /// Pends forever while disarmed.
    pub async fn expired(&mut self) {
        let Some(deadline) = self.deadline else {
            return std::future::pending().await;
        };

        time::sleep_until(deadline).await;
        self.deadline = None;
        debug!("countdown expired");
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left before expiry, or `None` while disarmed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}
