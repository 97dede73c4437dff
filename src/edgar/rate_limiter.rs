//! Fixed-window client-side rate limiter
//!
//! Callers over the cap wait for the next window instead of failing.

use crate::config::RateLimitConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Time source for the limiter
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Tokio's clock; follows paused time in tests
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// Window state: Open while `count < cap`, Saturated once it reaches it
#[derive(Debug)]
struct Window {
    start: Instant,
    count: u32,
}

/// Fixed-window limiter shared by every outbound request
pub struct RateLimiter<C: Clock = TokioClock> {
    clock: C,
    cap: u32,
    period: Duration,
    window: Mutex<Option<Window>>,
}

impl RateLimiter<TokioClock> {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, TokioClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(config: RateLimitConfig, clock: C) -> Self {
        Self {
            clock,
            cap: config.max_requests.max(1),
            period: config.window,
            window: Mutex::new(None),
        }
    }

    /// Admit the call now, or report how long until the window resets
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let now = self.clock.now();
        let mut guard = self.window.lock();

        let expired = guard
            .as_ref()
            .map_or(true, |w| now.saturating_duration_since(w.start) >= self.period);
        if expired {
            *guard = None;
        }
        let window = guard.get_or_insert_with(|| Window {
            start: now,
            count: 0,
        });

        if window.count < self.cap {
            window.count += 1;
            Ok(())
        } else {
            Err(self.period - now.saturating_duration_since(window.start))
        }
    }

    /// Wait until the current window admits another call
    pub async fn acquire(&self) {
        loop {
            match self.try_acquire() {
                Ok(()) => return,
                Err(wait) => {
                    tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limit saturated");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Calls admitted in the current window
    pub fn admitted_in_window(&self) -> u32 {
        let now = self.clock.now();
        match self.window.lock().as_ref() {
            Some(w) if now.saturating_duration_since(w.start) < self.period => w.count,
            _ => 0,
        }
    }
}
