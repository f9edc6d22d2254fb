//! Time sources for the playback pacer.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;

/// Longest uninterrupted sleep; bounds how late a cancellation is observed.
pub const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Monotonic time plus a cancellable sleep.
pub trait Clock {
    /// Time elapsed since this clock's own epoch.
    fn now(&self) -> Duration;

    /// Suspend for `duration`. Returns `false` if `cancel` fired first.
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> bool;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> bool {
        let start = Instant::now();
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let slept = start.elapsed();
            if slept >= duration {
                return true;
            }
            thread::sleep((duration - slept).min(SLEEP_SLICE));
        }
    }
}

/// Simulated clock: sleeping advances time instantly.
///
/// Clones share the same timeline, so a test can hand one clone to the pacer
/// and keep another to inject delays with [`ManualClock::advance`].
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.saturating_add(by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        self.advance(duration);
        true
    }
}
