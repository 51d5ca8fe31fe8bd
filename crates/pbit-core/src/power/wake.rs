use embassy_time::Instant;
use log::info;

use crate::app_state::SharedState;
use crate::screen::ScreenId;

/// Record activity and, if the peripherals are asleep, bring the device back.
///
/// Every input event goes through here before anything else, and so does a
/// button wake out of light sleep. When the device was asleep this clears
/// the overlay flag, forces the default screen and requests a full redraw,
/// and only then clears `peripherals_sleeping`. The display scheduler stays
/// frozen until that last store, so it never draws a half-woken state.
///
/// Returns whether the device was asleep.
pub fn wake(state: &SharedState, now: Instant) -> bool {
    state.activity.touch(now);

    if !state.power.peripherals_sleeping() {
        return false;
    }

    state.power.set_warning_active(false);
    state.set_active_screen(ScreenId::DEFAULT);
    state.request_full_redraw();
    state.power.set_peripherals_sleeping(false);

    info!(" Woke from peripheral sleep at {} ms", now.as_millis());
    true
}
