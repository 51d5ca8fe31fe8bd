//! Power manager: idle tracking, pre-sleep warning, light and deep sleep.
//!
//! [`PowerManager::poll`] runs once per main-loop iteration. It reads the
//! activity clock and the peer connection status, and performs each side
//! effect exactly once per transition using [`OneShotLatch`]es:
//!
//! - `attention`: flashes and beeps when idle reaches the warning threshold
//! - `overlay`: raises `warning_active` and draws the sleep overlay shortly
//!   before light sleep
//! - `deep_sleep`: enters deep sleep once per idle period
//!
//! Peripheral sleep is tracked by the `peripherals_sleeping` flag itself so
//! the blanking happens once per sleep entry while the wake line is re-armed
//! before every light-sleep call.

mod flags;
mod latch;
mod wake;

use core::fmt::Debug;

use embassy_time::{Duration, Instant};
use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use log::{debug, error, info, warn};

use crate::app_state::SharedState;
use crate::config::PowerConfig;
use crate::display::{SharedDisplay, overlay};
use crate::hal::{Feedback, LightSleepWake, PowerHal, Tone, WakeSource};

pub use flags::{PowerFlags, PowerState};
pub use latch::{LatchState, OneShotLatch};
pub use wake::wake;

const ATTENTION_COLOR: Rgb888 = Rgb888::new(255, 120, 0);
const FLASH_ON: Duration = Duration::from_millis(150);
const FLASH_OFF: Duration = Duration::from_millis(150);

/// Return the power flags to their boot values.
pub(crate) fn reset_flags(state: &SharedState) {
    state.power.reset();
}

#[cfg(test)]
pub(crate) fn force_button_wake(state: &SharedState) {
    state.power.set_button_wake();
}

#[cfg(test)]
pub(crate) fn force_flags(state: &SharedState, peripherals_sleeping: bool, warning_active: bool) {
    state.power.set_peripherals_sleeping(peripherals_sleeping);
    state.power.set_warning_active(warning_active);
}

pub struct PowerManager {
    config: PowerConfig,
    attention: OneShotLatch,
    overlay: OneShotLatch,
    deep_sleep: OneShotLatch,
    /// Display and indicator were blanked and have not been restored yet
    blanked: bool,
}

impl PowerManager {
    pub fn new(config: PowerConfig) -> Self {
        Self {
            config,
            attention: OneShotLatch::new(),
            overlay: OneShotLatch::new(),
            deep_sleep: OneShotLatch::new(),
            blanked: false,
        }
    }

    pub fn config(&self) -> &PowerConfig {
        &self.config
    }

    pub fn attention_latch(&self) -> LatchState {
        self.attention.state()
    }

    pub fn overlay_latch(&self) -> LatchState {
        self.overlay.state()
    }

    pub fn deep_sleep_latch(&self) -> LatchState {
        self.deep_sleep.state()
    }

    /// Evaluate the power policy at `now` and perform any due transition.
    ///
    /// Returns the resulting power state. On hardware a deep-sleep entry
    /// never returns; on hosts it returns [`PowerState::DeepSleep`] and later
    /// polls do nothing until activity resumes.
    pub async fn poll<D, H>(
        &mut self,
        now: Instant,
        state: &SharedState,
        display: &SharedDisplay<D>,
        hal: &mut H,
    ) -> PowerState
    where
        D: DrawTarget<Color = Rgb565>,
        D::Error: Debug,
        H: PowerHal,
    {
        let connected = state.is_peer_connected();
        let light_sleep_blocked = connected && self.config.gate_light_sleep_on_connection;

        if light_sleep_blocked && state.power.peripherals_sleeping() {
            info!(" Peer connected while asleep, restoring peripherals");
            wake(state, now);
        }

        let idle = state.activity.idle_for(now);
        let sleeping = state.power.peripherals_sleeping();

        if idle < self.config.warn_after() || connected || sleeping {
            self.cancel_warning(state);
        } else {
            self.run_warning(idle, state, display, hal).await;
        }

        if idle < self.config.deep_sleep_after() || connected {
            self.deep_sleep.reset();
        }

        if idle >= self.config.deep_sleep_after() && !connected {
            self.enter_deep_sleep(state, display, hal).await;
        } else if idle >= self.config.light_sleep_after()
            && !light_sleep_blocked
            && self.enter_light_sleep(state, display, hal).await
        {
            self.cancel_warning(state);
        }

        self.settle(state, hal)
    }

    fn cancel_warning(&mut self, state: &SharedState) {
        let attention_was_open = self.attention.reset();
        self.overlay.reset();

        if state.power.warning_active() {
            state.power.set_warning_active(false);
            // The overlay is still on the panel; make the scheduler paint over it.
            state.request_full_redraw();
        }

        if attention_was_open && !state.power.peripherals_sleeping() {
            debug!(" Pre-sleep warning cancelled");
        }
    }

    async fn run_warning<D, H>(
        &mut self,
        idle: Duration,
        state: &SharedState,
        display: &SharedDisplay<D>,
        hal: &mut H,
    ) where
        D: DrawTarget<Color = Rgb565>,
        D::Error: Debug,
        H: Feedback,
    {
        if self.attention.trigger() {
            info!(" Idle for {} ms, playing pre-sleep warning", idle.as_millis());
            self.play_attention(state, hal).await;
        }

        self.overlay.arm();
        if idle >= self.config.overlay_after() && self.overlay.fire() {
            // Freeze the scheduler before taking the panel so no tick paints over us.
            state.power.set_warning_active(true);
            let mut target = display.lock().await;
            if let Err(e) = overlay::draw_sleep_overlay(&mut *target, state.language()) {
                error!(" Failed to draw sleep overlay: {:?}", e);
            }
        }
    }

    async fn play_attention<H: Feedback>(&self, state: &SharedState, hal: &mut H) {
        for _ in 0..self.config.attention_flashes {
            hal.set_indicator(ATTENTION_COLOR);
            if state.is_sound_enabled() {
                hal.beep(Tone::ATTENTION).await;
            }
            hal.pause(FLASH_ON).await;
            hal.set_indicator(Rgb888::BLACK);
            hal.pause(FLASH_OFF).await;
        }
        hal.set_indicator(state.active_screen().indicator_color());
    }

    /// Blank once, then sleep for one slice. Returns whether the button
    /// woke the device.
    async fn enter_light_sleep<D, H>(
        &mut self,
        state: &SharedState,
        display: &SharedDisplay<D>,
        hal: &mut H,
    ) -> bool
    where
        D: DrawTarget<Color = Rgb565>,
        D::Error: Debug,
        H: PowerHal,
    {
        if !state.power.peripherals_sleeping() {
            info!(" Entering peripheral sleep");
            blank_peripherals(display, hal).await;
            self.blanked = true;
            state.power.set_warning_active(false);
            state.power.set_peripherals_sleeping(true);
        }

        if let Err(e) = hal.arm_wake(WakeSource::Button) {
            error!(" Cannot arm wake source, staying awake: {}", e);
            return false;
        }

        let exit = hal
            .enter_light_sleep(WakeSource::Button, self.config.light_sleep_slice())
            .await;

        if exit.cause == LightSleepWake::Button && wake(state, exit.at) {
            state.power.set_button_wake();
            return true;
        }
        false
    }

    async fn enter_deep_sleep<D, H>(
        &mut self,
        state: &SharedState,
        display: &SharedDisplay<D>,
        hal: &mut H,
    ) where
        D: DrawTarget<Color = Rgb565>,
        D::Error: Debug,
        H: PowerHal,
    {
        if !self.deep_sleep.trigger() {
            return;
        }

        info!(" Entering deep sleep");
        blank_peripherals(display, hal).await;
        self.blanked = true;
        state.power.set_warning_active(false);
        state.power.set_peripherals_sleeping(true);
        state.power.set_state(PowerState::DeepSleep);

        match hal.arm_wake(WakeSource::Button) {
            Ok(()) => hal.enter_deep_sleep(WakeSource::Button),
            Err(e) => {
                // Sleeping now would never wake. Stay blanked until a press.
                error!(" Cannot arm wake source, not entering deep sleep: {}", e);
            }
        }
    }

    fn settle<H: Feedback>(&mut self, state: &SharedState, hal: &mut H) -> PowerState {
        let next = if self.deep_sleep.has_fired() {
            PowerState::DeepSleep
        } else if state.power.peripherals_sleeping() {
            PowerState::PeripheralSleep
        } else if !self.attention.is_idle() {
            PowerState::PreSleepWarning
        } else {
            PowerState::Active
        };

        if self.blanked && !state.power.peripherals_sleeping() {
            self.blanked = false;
            hal.set_indicator(state.active_screen().indicator_color());
        }

        let previous = state.power.state();
        if next != previous {
            info!(" Power state {:?} -> {:?}", previous, next);
            state.power.set_state(next);
        }

        next
    }
}

async fn blank_peripherals<D, H>(display: &SharedDisplay<D>, hal: &mut H)
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
    H: Feedback,
{
    {
        let mut target = display.lock().await;
        if let Err(e) = target.clear(Rgb565::BLACK) {
            warn!(" Failed to blank display: {:?}", e);
        }
    }
    hal.set_indicator(Rgb888::BLACK);
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::display::SharedDisplay;
    use crate::screen::ScreenId;
    use crate::test_support::{HalEvent, MockHal, RecordingTarget};

    fn test_config() -> PowerConfig {
        PowerConfig {
            warn_after_ms: 5_000,
            light_sleep_after_ms: 10_000,
            deep_sleep_after_ms: 20_000,
            overlay_lead_ms: 2_000,
            light_sleep_slice_ms: 500,
            poll_period_ms: 50,
            attention_flashes: 2,
            gate_light_sleep_on_connection: true,
        }
    }

    struct Rig {
        manager: PowerManager,
        state: SharedState,
        display: SharedDisplay<RecordingTarget>,
        hal: MockHal,
    }

    impl Rig {
        fn new(config: PowerConfig) -> Self {
            let state = SharedState::new();
            state.set_active_screen(ScreenId::DEFAULT);
            state.take_full_redraw();
            state.activity.reset(Instant::from_millis(0));
            Self {
                manager: PowerManager::new(config),
                state,
                display: SharedDisplay::new(RecordingTarget::new()),
                hal: MockHal::new(),
            }
        }

        fn poll(&mut self, ms: u64) -> PowerState {
            block_on(self.manager.poll(
                Instant::from_millis(ms),
                &self.state,
                &self.display,
                &mut self.hal,
            ))
        }

        fn blanks(&mut self) -> usize {
            block_on(self.display.lock()).clears
        }
    }

    #[test]
    fn test_no_side_effects_below_warning_threshold() {
        let mut rig = Rig::new(test_config());
        for ms in [0, 1_000, 2_500, 4_999] {
            assert_eq!(rig.poll(ms), PowerState::Active);
        }
        assert!(rig.hal.events.is_empty());
        assert_eq!(rig.manager.attention_latch(), LatchState::Idle);
        assert_eq!(rig.manager.overlay_latch(), LatchState::Idle);
        assert_eq!(rig.blanks(), 0);
    }

    #[test]
    fn test_attention_fires_once_per_idle_period() {
        let mut rig = Rig::new(test_config());
        assert_eq!(rig.poll(5_000), PowerState::PreSleepWarning);
        rig.poll(6_000);
        rig.poll(7_000);
        assert_eq!(rig.hal.beeps(), 2);

        // User activity closes the window
        wake(&rig.state, Instant::from_millis(7_500));
        assert_eq!(rig.poll(8_000), PowerState::Active);
        assert_eq!(rig.manager.attention_latch(), LatchState::Idle);

        // A new idle period may warn again
        rig.poll(12_600);
        assert_eq!(rig.hal.beeps(), 4);
    }

    #[test]
    fn test_attention_is_silent_when_sound_disabled() {
        let mut rig = Rig::new(test_config());
        rig.state.toggle_sound();
        rig.poll(5_000);
        assert_eq!(rig.hal.beeps(), 0);
        assert!(rig.hal.events.contains(&HalEvent::Indicator(ATTENTION_COLOR)));
    }

    #[test]
    fn test_overlay_freezes_display_before_light_sleep() {
        let mut rig = Rig::new(test_config());
        rig.poll(5_000);
        assert!(!rig.state.power.warning_active());

        rig.poll(8_000);
        assert!(rig.state.power.warning_active());
        assert_eq!(rig.manager.overlay_latch(), LatchState::Fired);
        let drawn = block_on(rig.display.lock()).pixels;
        assert!(drawn > 0);

        // Overlay is drawn once, not per poll
        rig.poll(9_000);
        assert_eq!(block_on(rig.display.lock()).pixels, drawn);
    }

    #[test]
    fn test_scenario_idle_past_light_sleep_blanks_peripherals() {
        let mut rig = Rig::new(test_config());
        assert_eq!(rig.poll(11_000), PowerState::PeripheralSleep);

        assert!(rig.state.power.peripherals_sleeping());
        assert!(!rig.state.power.warning_active());
        assert_eq!(rig.blanks(), 1);
        assert_eq!(rig.hal.last_indicator(), Some(Rgb888::BLACK));

        let arm = rig.hal.position(&HalEvent::ArmWake).unwrap();
        let sleep = rig.hal.position(&HalEvent::LightSleep).unwrap();
        assert!(arm < sleep);
    }

    #[test]
    fn test_repeated_light_sleep_does_not_blank_again() {
        let mut rig = Rig::new(test_config());
        rig.poll(11_000);
        let first_arm = rig.hal.position(&HalEvent::ArmWake).unwrap();

        rig.poll(12_000);
        rig.poll(13_000);

        assert_eq!(rig.blanks(), 1);
        assert!(
            rig.hal.events[first_arm..]
                .iter()
                .all(|event| !matches!(event, HalEvent::Indicator(_)))
        );
        // The wake line is re-armed before every sleep call
        assert_eq!(rig.hal.count(&HalEvent::ArmWake), 3);
        assert_eq!(rig.hal.count(&HalEvent::LightSleep), 3);
    }

    #[test]
    fn test_deep_sleep_invoked_once_after_arming() {
        let mut rig = Rig::new(test_config());
        assert_eq!(rig.poll(21_000), PowerState::DeepSleep);
        rig.poll(22_000);
        rig.poll(60_000);

        assert_eq!(rig.hal.count(&HalEvent::DeepSleep), 1);
        let deep = rig.hal.position(&HalEvent::DeepSleep).unwrap();
        assert_eq!(rig.hal.events[deep - 1], HalEvent::ArmWake);
        assert_eq!(rig.hal.count(&HalEvent::LightSleep), 0);
    }

    #[test]
    fn test_scenario_activity_before_light_sleep_cancels_warning() {
        let mut rig = Rig::new(test_config());
        rig.poll(5_000);
        rig.poll(8_500);
        assert!(rig.state.power.warning_active());

        wake(&rig.state, Instant::from_millis(9_000));
        assert_eq!(rig.poll(9_100), PowerState::Active);

        assert_eq!(rig.manager.attention_latch(), LatchState::Idle);
        assert_eq!(rig.manager.overlay_latch(), LatchState::Idle);
        assert!(!rig.state.power.warning_active());
        assert!(rig.state.is_full_redraw_pending());
        assert_eq!(rig.hal.count(&HalEvent::LightSleep), 0);
        assert_eq!(rig.hal.count(&HalEvent::DeepSleep), 0);
    }

    #[test]
    fn test_scenario_connected_peer_suppresses_sleep() {
        let mut rig = Rig::new(test_config());
        rig.state.set_peer_connected(true);

        for ms in [6_000, 25_000, 100_000, 1_000_000] {
            assert_eq!(rig.poll(ms), PowerState::Active);
        }
        assert_eq!(rig.hal.count(&HalEvent::DeepSleep), 0);
        assert_eq!(rig.hal.count(&HalEvent::LightSleep), 0);
        assert_eq!(rig.hal.beeps(), 0);
    }

    #[test]
    fn test_connected_peer_without_gating_still_allows_light_sleep() {
        let mut config = test_config();
        config.gate_light_sleep_on_connection = false;
        let mut rig = Rig::new(config);
        rig.state.set_peer_connected(true);

        assert_eq!(rig.poll(25_000), PowerState::PeripheralSleep);
        assert_eq!(rig.hal.count(&HalEvent::LightSleep), 1);
        assert_eq!(rig.hal.count(&HalEvent::DeepSleep), 0);
    }

    #[test]
    fn test_peer_connecting_while_asleep_restores_display() {
        let mut rig = Rig::new(test_config());
        rig.state.set_active_screen(ScreenId::Soil);
        rig.poll(11_000);
        assert!(rig.state.power.peripherals_sleeping());

        rig.state.set_peer_connected(true);
        assert_eq!(rig.poll(11_100), PowerState::Active);

        assert!(!rig.state.power.peripherals_sleeping());
        assert_eq!(rig.state.active_screen(), ScreenId::DEFAULT);
        assert!(rig.state.is_full_redraw_pending());
        assert_eq!(
            rig.hal.last_indicator(),
            Some(ScreenId::DEFAULT.indicator_color())
        );
    }

    #[test]
    fn test_button_exit_from_light_sleep_runs_wake_path() {
        let mut rig = Rig::new(test_config());
        rig.hal.light_exit = LightSleepWake::Button;
        rig.hal.exit_at = Instant::from_millis(11_400);

        assert_eq!(rig.poll(11_000), PowerState::Active);

        assert!(!rig.state.power.peripherals_sleeping());
        assert_eq!(rig.state.activity.last_activity_ms(), 11_400);
        assert!(rig.state.is_full_redraw_pending());
        // The press that woke us is handed to the input router, once
        assert!(rig.state.power.take_button_wake());
        assert!(!rig.state.power.take_button_wake());
    }

    #[test]
    fn test_timer_exit_from_light_sleep_is_not_a_button_wake() {
        let mut rig = Rig::new(test_config());
        rig.poll(11_000);
        assert!(rig.state.power.peripherals_sleeping());
        assert!(!rig.state.power.take_button_wake());
    }

    #[test]
    fn test_peer_connecting_during_overlay_cancels_warning() {
        let mut rig = Rig::new(test_config());
        rig.poll(5_000);
        rig.poll(8_500);
        assert!(rig.state.power.warning_active());
        assert_eq!(rig.manager.overlay_latch(), LatchState::Fired);

        rig.state.set_peer_connected(true);
        assert_eq!(rig.poll(8_600), PowerState::Active);

        assert!(!rig.state.power.warning_active());
        assert_eq!(rig.manager.attention_latch(), LatchState::Idle);
        assert_eq!(rig.manager.overlay_latch(), LatchState::Idle);
        assert!(rig.state.is_full_redraw_pending());

        // Still connected well past every threshold: nothing fires
        rig.poll(30_000);
        assert!(!rig.state.power.warning_active());
        assert_eq!(rig.hal.count(&HalEvent::LightSleep), 0);
        assert_eq!(rig.hal.count(&HalEvent::DeepSleep), 0);
    }

    #[test]
    fn test_wake_arm_failure_skips_the_sleep_call() {
        let mut rig = Rig::new(test_config());
        rig.hal.fail_arm = true;

        rig.poll(11_000);
        rig.poll(21_000);

        assert_eq!(rig.hal.count(&HalEvent::LightSleep), 0);
        assert_eq!(rig.hal.count(&HalEvent::DeepSleep), 0);
    }
}
