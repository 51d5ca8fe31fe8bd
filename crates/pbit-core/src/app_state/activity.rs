//! Last-activity timestamp shared between the input router and the power
//! manager.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_time::{Duration, Instant};

/// Millisecond timestamp of the most recent user input or wake event.
///
/// Stored as a wrapping 32-bit millisecond count: the ESP32 has no 64-bit
/// atomics. Comparisons use wrapping arithmetic, so idle durations are exact
/// for anything under ~24 days, which is far past the deep-sleep threshold.
#[derive(Debug)]
pub struct ActivityClock {
    last_ms: AtomicU32,
}

impl ActivityClock {
    pub const fn new() -> Self {
        Self {
            last_ms: AtomicU32::new(0),
        }
    }

    /// Record activity at `now`. Never moves the clock backwards.
    pub(crate) fn touch(&self, now: Instant) {
        let now_ms = now.as_millis() as u32;
        let _ = self
            .last_ms
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                ((now_ms.wrapping_sub(last) as i32) > 0).then_some(now_ms)
            });
    }

    /// Unconditionally set the clock. Only for process start, where the time
    /// base itself has restarted.
    pub(crate) fn reset(&self, now: Instant) {
        self.last_ms.store(now.as_millis() as u32, Ordering::Release);
    }

    pub fn last_activity_ms(&self) -> u32 {
        self.last_ms.load(Ordering::Acquire)
    }

    /// Time since the last activity. A timestamp ahead of `now` (a racing
    /// touch) counts as zero.
    pub fn idle_for(&self, now: Instant) -> Duration {
        let elapsed = (now.as_millis() as u32).wrapping_sub(self.last_activity_ms());
        if (elapsed as i32) < 0 {
            Duration::from_ticks(0)
        } else {
            Duration::from_millis(elapsed as u64)
        }
    }
}

impl Default for ActivityClock {
    fn default() -> Self {
        Self::new()
    }
}
