//! Non-decreasing millisecond clock.
//!
//! Wall-clock time can step backwards (NTP adjustments, VM migration). History
//! records are ordered by timestamp, so every reading is clamped to the
//! highest value handed out so far.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// A clock whose readings never decrease across calls, including calls from
/// different threads.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    /// Create a clock with no prior readings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Current time in Unix milliseconds, never lower than a previous reading.
    pub fn now_millis(&self) -> i64 {
        self.observe(Utc::now().timestamp_millis())
    }

    /// Clamp a raw reading against everything observed so far.
    fn observe(&self, wall: i64) -> i64 {
        let previous = self.last.fetch_max(wall, Ordering::AcqRel);
        previous.max(wall)
    }
}
