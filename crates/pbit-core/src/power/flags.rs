use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PowerState {
    Active = 0,
    PreSleepWarning,
    PeripheralSleep,
    DeepSleep,
}

impl PowerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => PowerState::PreSleepWarning,
            2 => PowerState::PeripheralSleep,
            3 => PowerState::DeepSleep,
            _ => PowerState::Active,
        }
    }
}

/// Power flags published for the other tasks.
///
/// Readable from anywhere, writable only from the `power` module: display
/// and input code can influence power only by touching the activity clock.
#[derive(Debug)]
pub struct PowerFlags {
    state: AtomicU8,
    /// Display and indicator are blanked
    peripherals_sleeping: AtomicBool,
    /// The sleep overlay is on screen; the display scheduler is frozen
    warning_active: AtomicBool,
    /// The button ended a light sleep; the input router consumes the rest
    /// of that press
    button_wake: AtomicBool,
}

impl PowerFlags {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(PowerState::Active as u8),
            peripherals_sleeping: AtomicBool::new(false),
            warning_active: AtomicBool::new(false),
            button_wake: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> PowerState {
        PowerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn peripherals_sleeping(&self) -> bool {
        self.peripherals_sleeping.load(Ordering::Acquire)
    }

    pub fn warning_active(&self) -> bool {
        self.warning_active.load(Ordering::Acquire)
    }

    pub(super) fn set_state(&self, state: PowerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(super) fn set_peripherals_sleeping(&self, sleeping: bool) {
        self.peripherals_sleeping.store(sleeping, Ordering::Release);
    }

    pub(super) fn set_warning_active(&self, active: bool) {
        self.warning_active.store(active, Ordering::Release);
    }

    pub(super) fn set_button_wake(&self) {
        self.button_wake.store(true, Ordering::Release);
    }

    /// Whether the button woke the device since the last call.
    pub(crate) fn take_button_wake(&self) -> bool {
        self.button_wake.swap(false, Ordering::AcqRel)
    }

    pub(super) fn reset(&self) {
        self.button_wake.store(false, Ordering::Release);
        self.set_warning_active(false);
        self.set_peripherals_sleeping(false);
        self.set_state(PowerState::Active);
    }
}

impl Default for PowerFlags {
    fn default() -> Self {
        Self::new()
    }
}
