//! Rotary encoder and push-button poller.
//!
//! Samples the three encoder lines every millisecond, decodes them with the
//! core's [`RotaryEncoder`] and [`ButtonTracker`] and queues the resulting
//! events for the control loop.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_time::{Duration, Timer};
use esp_hal::gpio::Input;
use log::warn;
use pbit_core::app_state::SharedState;
use pbit_core::hal::Clock;
use pbit_core::input::{ButtonTracker, InputEvent, RotaryEncoder};
use pbit_core::screen::ScreenId;
use pbit_core::tasks::InputSender;

const POLL_PERIOD: Duration = Duration::from_millis(1);

/// Raw button level, read by the wake arming check.
static BUTTON_HELD: AtomicBool = AtomicBool::new(false);

pub fn button_held() -> bool {
    BUTTON_HELD.load(Ordering::Relaxed)
}

pub struct Controls {
    a: Input<'static>,
    b: Input<'static>,
    button: Input<'static>,
    encoder: RotaryEncoder,
    tracker: ButtonTracker,
}

impl Controls {
    /// `woke_by_button` is set when the press that ended deep sleep may
    /// still be held, so its release is not reported as a click.
    pub fn new(
        a: Input<'static>,
        b: Input<'static>,
        button: Input<'static>,
        debounce: Duration,
        woke_by_button: bool,
    ) -> Self {
        let position = ScreenId::DEFAULT.selector().unwrap_or(0);
        Self {
            a,
            b,
            button,
            encoder: RotaryEncoder::new(ScreenId::SELECTABLE.len(), position),
            tracker: ButtonTracker::new(debounce, woke_by_button),
        }
    }

    pub async fn run<C: Clock>(&mut self, state: &SharedState, events: InputSender<'_>, clock: &C) {
        loop {
            // Keep the detent count aligned with screens chosen elsewhere
            // (wake path, splash).
            if let Some(selector) = state.active_screen().selector() {
                if selector != self.encoder.position() {
                    self.encoder.set_position(selector);
                }
            }

            let pressed = self.button.is_low();
            BUTTON_HELD.store(pressed, Ordering::Relaxed);

            // Both lines idle high with pull-ups
            if let Some(position) = self.encoder.update(self.a.is_low(), self.b.is_low()) {
                Self::queue(&events, InputEvent::Rotated { position });
            }
            if let Some(event) = self.tracker.update(pressed, clock.now()) {
                Self::queue(&events, event);
            }

            Timer::after(POLL_PERIOD).await;
        }
    }

    fn queue(events: &InputSender<'_>, event: InputEvent) {
        if events.try_send(event).is_err() {
            warn!(" Input queue full, dropping {:?}", event);
        }
    }
}
