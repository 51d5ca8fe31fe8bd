//! Edge-triggered guards for side effects that must happen once per window.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatchState {
    /// The window is closed
    #[default]
    Idle,
    /// The window is open and the effect has not run yet
    Armed,
    /// The effect has run for this window
    Fired,
}

/// `Idle -> Armed -> Fired -> Idle` state machine.
///
/// Arm when the preconditions start to hold, fire when the effect runs,
/// reset the moment the preconditions stop holding. [`OneShotLatch::fire`]
/// returns `true` at most once between resets.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneShotLatch {
    state: LatchState,
}

impl OneShotLatch {
    pub const fn new() -> Self {
        Self {
            state: LatchState::Idle,
        }
    }

    pub fn state(&self) -> LatchState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == LatchState::Idle
    }

    pub fn has_fired(&self) -> bool {
        self.state == LatchState::Fired
    }

    pub fn arm(&mut self) {
        if self.state == LatchState::Idle {
            self.state = LatchState::Armed;
        }
    }

    /// Move `Armed -> Fired`. Returns whether the caller should run the
    /// effect.
    pub fn fire(&mut self) -> bool {
        if self.state == LatchState::Armed {
            self.state = LatchState::Fired;
            true
        } else {
            false
        }
    }

    /// Arm and fire in one step.
    pub fn trigger(&mut self) -> bool {
        self.arm();
        self.fire()
    }

    /// Close the window. Returns whether the latch was open.
    pub fn reset(&mut self) -> bool {
        let was_open = self.state != LatchState::Idle;
        self.state = LatchState::Idle;
        was_open
    }
}
