//! Task clock that keeps counting through light sleep.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Instant};
use pbit_core::hal::Clock;

/// Embassy time plus whatever time the timer group missed while the CPU
/// was in light sleep.
pub struct SleepClock {
    missed_us: Mutex<CriticalSectionRawMutex, Cell<u64>>,
}

impl SleepClock {
    pub const fn new() -> Self {
        Self {
            missed_us: Mutex::new(Cell::new(0)),
        }
    }

    /// Account for `us` microseconds that passed without the tick timer
    /// seeing them.
    pub fn add_missed(&self, us: u64) {
        self.missed_us
            .lock(|missed| missed.set(missed.get().saturating_add(us)));
    }
}

impl Default for SleepClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SleepClock {
    fn now(&self) -> Instant {
        let missed = self.missed_us.lock(Cell::get);
        Instant::now() + Duration::from_micros(missed)
    }
}
