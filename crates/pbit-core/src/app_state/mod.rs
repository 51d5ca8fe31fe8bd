//! Process-wide state shared by the sampler, display, input and power tasks.
//!
//! There is exactly one [`SharedState`], created at startup and handed to
//! every task by reference. Fields are word-sized atomics (or a tiny critical
//! section for the multi-field reading) and each has a single writer, listed
//! on the field. Writers are `pub(crate)` so only the owning component in
//! this crate can reach them; the power flags go further and are writable
//! only from inside [`crate::power`].

mod activity;
mod stopwatch;

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::i18n::Language;
use crate::power::PowerFlags;
use crate::reading::SensorReading;
use crate::screen::ScreenId;

pub use activity::ActivityClock;
pub use stopwatch::{Stopwatch, StopwatchPhase};

pub struct SharedState {
    /// Latest sensor snapshot. Writer: sampler.
    reading: Mutex<CriticalSectionRawMutex, Cell<SensorReading>>,
    /// A fresh reading has not been drawn yet. Set by the sampler, taken by
    /// the display scheduler.
    data_ready: AtomicBool,
    /// The next display tick must redraw everything. Set by the power
    /// module (wake path, cancelled overlay), taken by the display scheduler.
    full_redraw: AtomicBool,
    /// Writer: input router, and the power module's wake path.
    active_screen: AtomicU8,
    /// Writer: input router and wake path (touch), bootstrap (reset).
    pub activity: ActivityClock,
    /// Writer: power module only.
    pub power: PowerFlags,
    /// Mirror of the wireless link's connection status. Writer: sampler.
    peer_connected: AtomicBool,
    /// Writer: input router.
    fahrenheit: AtomicBool,
    /// Writer: input router.
    sound_enabled: AtomicBool,
    /// Writer: bootstrap.
    language: AtomicU8,
    /// Writer: input router.
    pub stopwatch: Stopwatch,
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            reading: Mutex::new(Cell::new(SensorReading::UNSPECIFIED)),
            data_ready: AtomicBool::new(false),
            full_redraw: AtomicBool::new(true),
            active_screen: AtomicU8::new(ScreenId::Boot as u8),
            activity: ActivityClock::new(),
            power: PowerFlags::new(),
            peer_connected: AtomicBool::new(false),
            fahrenheit: AtomicBool::new(false),
            sound_enabled: AtomicBool::new(true),
            language: AtomicU8::new(Language::Spanish as u8),
            stopwatch: Stopwatch::new(),
        }
    }

    // ---- sensor data ----

    pub fn reading(&self) -> SensorReading {
        self.reading.lock(Cell::get)
    }

    /// Replace the reading wholesale and flag it for the display.
    pub(crate) fn publish_reading(&self, reading: SensorReading) {
        self.reading.lock(|cell| cell.set(reading));
        self.data_ready.store(true, Ordering::Release);
    }

    pub fn is_data_ready(&self) -> bool {
        self.data_ready.load(Ordering::Acquire)
    }

    pub(crate) fn take_data_ready(&self) -> bool {
        self.data_ready.swap(false, Ordering::AcqRel)
    }

    // ---- redraw handoff ----

    pub(crate) fn request_full_redraw(&self) {
        self.full_redraw.store(true, Ordering::Release);
    }

    pub fn is_full_redraw_pending(&self) -> bool {
        self.full_redraw.load(Ordering::Acquire)
    }

    pub(crate) fn take_full_redraw(&self) -> bool {
        self.full_redraw.swap(false, Ordering::AcqRel)
    }

    // ---- screen selection ----

    pub fn active_screen(&self) -> ScreenId {
        ScreenId::from_u8(self.active_screen.load(Ordering::Acquire)).unwrap_or(ScreenId::DEFAULT)
    }

    pub(crate) fn set_active_screen(&self, screen: ScreenId) {
        self.active_screen.store(screen as u8, Ordering::Release);
    }

    // ---- user settings ----

    pub fn is_fahrenheit(&self) -> bool {
        self.fahrenheit.load(Ordering::Acquire)
    }

    /// Returns the new setting.
    pub(crate) fn toggle_fahrenheit(&self) -> bool {
        !self.fahrenheit.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn is_sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Acquire)
    }

    /// Returns the new setting.
    pub(crate) fn toggle_sound(&self) -> bool {
        !self.sound_enabled.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn language(&self) -> Language {
        Language::from_u8(self.language.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub(crate) fn set_language(&self, language: Language) {
        self.language.store(language as u8, Ordering::Release);
    }

    // ---- wireless link ----

    pub fn is_peer_connected(&self) -> bool {
        self.peer_connected.load(Ordering::Acquire)
    }

    pub(crate) fn set_peer_connected(&self, connected: bool) {
        self.peer_connected.store(connected, Ordering::Release);
    }

    /// Return every volatile field to its power-on value.
    ///
    /// Deep sleep is a restart, so bootstrap rebuilds state from scratch even
    /// on targets (the simulator) where the static survives.
    pub(crate) fn reset(&self) {
        self.publish_reading(SensorReading::UNSPECIFIED);
        self.data_ready.store(false, Ordering::Release);
        self.full_redraw.store(true, Ordering::Release);
        self.set_active_screen(ScreenId::Boot);
        self.peer_connected.store(false, Ordering::Release);
        self.fahrenheit.store(false, Ordering::Release);
        self.sound_enabled.store(true, Ordering::Release);
        self.stopwatch.reset();
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_ready_is_taken_once() {
        let state = SharedState::new();
        let mut reading = SensorReading::default();
        reading.temperature = 21.5;
        state.publish_reading(reading);

        assert_eq!(state.reading().temperature, 21.5);
        assert!(state.take_data_ready());
        assert!(!state.take_data_ready());
    }

    #[test]
    fn test_full_redraw_starts_pending() {
        let state = SharedState::new();
        assert!(state.take_full_redraw());
        assert!(!state.is_full_redraw_pending());
        state.request_full_redraw();
        assert!(state.take_full_redraw());
    }

    #[test]
    fn test_toggles_report_new_value() {
        let state = SharedState::new();
        assert!(state.toggle_fahrenheit());
        assert!(state.is_fahrenheit());
        assert!(!state.toggle_sound());
        assert!(!state.is_sound_enabled());
    }

    #[test]
    fn test_reset_restores_power_on_values() {
        let state = SharedState::new();
        state.set_active_screen(ScreenId::Timer);
        state.toggle_sound();
        state.set_peer_connected(true);
        state.take_full_redraw();

        state.reset();

        assert_eq!(state.active_screen(), ScreenId::Boot);
        assert!(state.is_sound_enabled());
        assert!(!state.is_peer_connected());
        assert!(!state.is_data_ready());
        assert!(state.is_full_redraw_pending());
    }
}
