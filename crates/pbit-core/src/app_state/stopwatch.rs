//! User stopwatch driven from the Timer screen.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopwatchPhase {
    Ready,
    Running,
    Paused,
}

/// Start/pause/resume stopwatch.
///
/// Written only by the input router, read by the Timer screen. Each field
/// is a word-sized atomic; a reader racing a toggle can see a value one
/// frame stale, which the next refresh corrects.
#[derive(Debug)]
pub struct Stopwatch {
    running: AtomicBool,
    started_ms: AtomicU32,
    banked_ms: AtomicU32,
}

impl Stopwatch {
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            started_ms: AtomicU32::new(0),
            banked_ms: AtomicU32::new(0),
        }
    }

    /// Start or resume if stopped, pause if running.
    pub(crate) fn toggle(&self, now: Instant) {
        let now_ms = now.as_millis() as u32;
        if self.running.load(Ordering::Acquire) {
            let run = now_ms.wrapping_sub(self.started_ms.load(Ordering::Acquire));
            self.banked_ms.fetch_add(run, Ordering::AcqRel);
            self.running.store(false, Ordering::Release);
        } else {
            self.started_ms.store(now_ms, Ordering::Release);
            self.running.store(true, Ordering::Release);
        }
    }

    /// Stop and clear back to zero.
    pub(crate) fn reset(&self) {
        self.running.store(false, Ordering::Release);
        self.banked_ms.store(0, Ordering::Release);
        self.started_ms.store(0, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> StopwatchPhase {
        if self.is_running() {
            StopwatchPhase::Running
        } else if self.banked_ms.load(Ordering::Acquire) == 0 {
            StopwatchPhase::Ready
        } else {
            StopwatchPhase::Paused
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        let mut total = self.banked_ms.load(Ordering::Acquire);
        if self.is_running() {
            let started = self.started_ms.load(Ordering::Acquire);
            total = total.wrapping_add((now.as_millis() as u32).wrapping_sub(started));
        }
        Duration::from_millis(total as u64)
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn test_fresh_stopwatch_is_ready_at_zero() {
        let watch = Stopwatch::new();
        assert_eq!(watch.phase(), StopwatchPhase::Ready);
        assert_eq!(watch.elapsed(at(10_000)), Duration::from_millis(0));
    }

    #[test]
    fn test_pause_and_resume_accumulate() {
        let watch = Stopwatch::new();
        watch.toggle(at(1_000));
        assert_eq!(watch.phase(), StopwatchPhase::Running);
        assert_eq!(watch.elapsed(at(1_250)), Duration::from_millis(250));

        watch.toggle(at(2_000));
        assert_eq!(watch.phase(), StopwatchPhase::Paused);
        assert_eq!(watch.elapsed(at(9_000)), Duration::from_millis(1_000));

        watch.toggle(at(10_000));
        assert_eq!(watch.elapsed(at(10_500)), Duration::from_millis(1_500));
    }

    #[test]
    fn test_reset_stops_and_clears() {
        let watch = Stopwatch::new();
        watch.toggle(at(0));
        watch.reset();
        assert_eq!(watch.phase(), StopwatchPhase::Ready);
        assert_eq!(watch.elapsed(at(5_000)), Duration::from_millis(0));
    }
}
