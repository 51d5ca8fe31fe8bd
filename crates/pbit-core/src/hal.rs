//! Platform services the core drives but does not implement.
//!
//! The firmware implements these on top of esp-hal; the simulator and the
//! tests implement them in software.

use core::future::Future;

use embassy_time::{Duration, Instant};
use embedded_graphics::pixelcolor::Rgb888;
use thiserror_no_std::Error;

/// A square-wave beep on the buzzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u16,
    pub duration_ms: u16,
}

impl Tone {
    /// Rotary step confirmation
    pub const CLICK: Tone = Tone::new(2_000, 20);
    /// Button press confirmation
    pub const CONFIRM: Tone = Tone::new(1_500, 60);
    /// Pre-sleep attention beep
    pub const ATTENTION: Tone = Tone::new(880, 120);
    /// Boot jingle, played in order
    pub const JINGLE: [Tone; 4] = [
        Tone::new(523, 120),
        Tone::new(659, 120),
        Tone::new(784, 120),
        Tone::new(1_046, 200),
    ];

    pub const fn new(frequency_hz: u16, duration_ms: u16) -> Self {
        Self {
            frequency_hz,
            duration_ms,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms as u64)
    }
}

/// The input line that can bring the device out of sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeSource {
    /// Encoder push button, active low
    Button,
}

/// Why the process started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    ColdBoot,
    ButtonWake,
}

/// Why a light-sleep call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightSleepWake {
    Button,
    Timer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepExit {
    pub cause: LightSleepWake,
    pub at: Instant,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeArmError {
    #[error("wake source {0:?} is not available on this board")]
    Unsupported(WakeSource),
    #[error("wake source {0:?} is already asserted")]
    AlreadyAsserted(WakeSource),
}

/// Indicator LED, buzzer and pacing delays.
pub trait Feedback {
    /// Show `color` on the RGB indicator. Black switches it off.
    fn set_indicator(&mut self, color: Rgb888);

    /// Play `tone` and return once it has finished.
    fn beep(&mut self, tone: Tone) -> impl Future<Output = ()>;

    /// Deliberate pause used for UX pacing.
    fn pause(&mut self, duration: Duration) -> impl Future<Output = ()>;
}

/// Sleep primitives used by the power manager.
pub trait PowerHal: Feedback {
    /// Configure `source` to wake the chip. Must be called before every
    /// sleep entry.
    fn arm_wake(&mut self, source: WakeSource) -> Result<(), WakeArmError>;

    /// Suspend the CPU until `source` fires or `max` elapses.
    fn enter_light_sleep(
        &mut self,
        source: WakeSource,
        max: Duration,
    ) -> impl Future<Output = SleepExit>;

    /// Power down everything except `source`. Does not return on hardware;
    /// the next thing to run is the boot entry with
    /// [`WakeCause::ButtonWake`].
    fn enter_deep_sleep(&mut self, source: WakeSource);
}

/// Extra services used by the input router.
pub trait InputHal: Feedback {
    /// Reboot the device. Does not return on hardware.
    fn restart(&mut self);
}

/// Time source for the task loops.
///
/// On targets whose tick timer stops during light sleep the platform
/// supplies a clock that adds the time spent asleep, so idle thresholds and
/// the stopwatch keep counting.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The embassy time driver, for platforms whose timer never stops.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
