//! Time sources.
//!
//! All timestamps in the crate are milliseconds since the Unix epoch. The
//! dispatcher reads "now" through the [`Clock`] trait so HRRN ratios and
//! lifecycle timestamps can be driven deterministically in tests.

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Milliseconds in one minute.
pub const MS_PER_MINUTE: u128 = 60_000;

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Whole minutes elapsed between two timestamps, saturating at zero when
/// `later` precedes `earlier`.
#[must_use]
pub const fn whole_minutes_between(earlier_ms: u128, later_ms: u128) -> u64 {
    let elapsed = later_ms.saturating_sub(earlier_ms) / MS_PER_MINUTE;
    if elapsed > u64::MAX as u128 {
        u64::MAX
    } else {
        elapsed as u64
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u128;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u128 {
        now_ms()
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<u128>,
}

impl ManualClock {
    /// Create a clock frozen at `start_ms`.
    #[must_use]
    pub const fn new(start_ms: u128) -> Self {
        Self {
            now: Mutex::new(start_ms),
        }
    }

    /// Move the clock forward.
    pub fn advance_ms(&self, delta_ms: u128) {
        *self.now.lock() += delta_ms;
    }

    /// Move the clock forward by whole minutes.
    pub fn advance_minutes(&self, minutes: u64) {
        self.advance_ms(u128::from(minutes) * MS_PER_MINUTE);
    }

    /// Jump to an absolute time.
    pub fn set_ms(&self, now_ms: u128) {
        *self.now.lock() = now_ms;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u128 {
        *self.now.lock()
    }
}
