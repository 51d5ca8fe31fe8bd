//! Input router: turns encoder and button events into state changes.
//!
//! Every event first goes through [`power::wake`], which resets the
//! activity clock and, if the peripherals were asleep, restores the default
//! screen. Only then is the event's own effect applied, so a rotation that
//! wakes the device still selects its screen. A button press that wakes the
//! device only wakes it: its release is consumed, whether the wake happened
//! here or in the power manager's light-sleep exit.

mod button;
mod encoder;

use core::fmt::Debug;

use embassy_time::{Duration, Instant};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::{debug, error, info, warn};

use crate::app_state::SharedState;
use crate::config::InputConfig;
use crate::display::{SharedDisplay, overlay};
use crate::hal::{InputHal, Tone};
use crate::power::{self, OneShotLatch};
use crate::prefs::PreferenceStore;
use crate::screen::ScreenId;

pub use button::ButtonTracker;
pub use encoder::RotaryEncoder;

/// How soon after a light-sleep button exit the press must reach the
/// router to count as the waking press
const WAKE_PRESS_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The encoder settled on an absolute dial position
    Rotated { position: i32 },
    /// The button went down. Carries no action besides waking.
    ButtonDown,
    /// The button was released after being held for `held`
    Pressed { held: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Handled,
    /// The event had no effect beyond waking
    Ignored,
    /// A factory reset ran and the platform was asked to restart
    Restarting,
}

pub struct InputRouter {
    config: InputConfig,
    factory_reset: OneShotLatch,
    /// The button currently down woke the device; drop its release
    swallow_release: bool,
}

impl InputRouter {
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            factory_reset: OneShotLatch::new(),
            swallow_release: false,
        }
    }

    pub async fn handle<D, P, H>(
        &mut self,
        event: InputEvent,
        now: Instant,
        state: &SharedState,
        display: &SharedDisplay<D>,
        prefs: &mut P,
        hal: &mut H,
    ) -> RouteOutcome
    where
        D: DrawTarget<Color = Rgb565>,
        D::Error: Debug,
        P: PreferenceStore,
        H: InputHal,
    {
        // Nothing has touched the activity clock since a light-sleep exit
        // that left the flag up; any event in between consumed it.
        let button_woke =
            state.power.take_button_wake() && state.activity.idle_for(now) <= WAKE_PRESS_WINDOW;
        let woke = power::wake(state, now);
        if woke {
            debug!(" {:?} woke the device", event);
        }

        match event {
            InputEvent::Rotated { position } => self.on_rotate(position, state, hal).await,
            InputEvent::ButtonDown => {
                self.swallow_release = woke || button_woke;
                RouteOutcome::Ignored
            }
            InputEvent::Pressed { .. } if core::mem::take(&mut self.swallow_release) => {
                debug!(" Consumed the release of the waking press");
                RouteOutcome::Ignored
            }
            InputEvent::Pressed { held } => self.on_press(held, now, state, display, prefs, hal).await,
        }
    }

    async fn on_rotate<H: InputHal>(
        &mut self,
        position: i32,
        state: &SharedState,
        hal: &mut H,
    ) -> RouteOutcome {
        let Some(screen) = ScreenId::from_selector(position) else {
            warn!(" Ignoring out-of-range dial position {}", position);
            return RouteOutcome::Ignored;
        };

        state.set_active_screen(screen);
        hal.set_indicator(screen.indicator_color());
        if state.is_sound_enabled() {
            hal.beep(Tone::CLICK).await;
        }
        RouteOutcome::Handled
    }

    async fn on_press<D, P, H>(
        &mut self,
        held: Duration,
        now: Instant,
        state: &SharedState,
        display: &SharedDisplay<D>,
        prefs: &mut P,
        hal: &mut H,
    ) -> RouteOutcome
    where
        D: DrawTarget<Color = Rgb565>,
        D::Error: Debug,
        P: PreferenceStore,
        H: InputHal,
    {
        let long = held > self.config.long_press();
        let screen = state.active_screen();

        if screen == ScreenId::SystemInfo {
            if long {
                return self.factory_reset(state, display, prefs, hal).await;
            }
            let enabled = state.toggle_sound();
            info!(" Sound {}", if enabled { "enabled" } else { "disabled" });
            return RouteOutcome::Handled;
        }

        match screen {
            ScreenId::Temperature | ScreenId::ExternalProbe => {
                let fahrenheit = state.toggle_fahrenheit();
                debug!(" Units now {}", if fahrenheit { "°F" } else { "°C" });
            }
            ScreenId::Timer if long => {
                state.stopwatch.reset();
                debug!(" Stopwatch reset");
            }
            ScreenId::Timer => state.stopwatch.toggle(now),
            _ => {}
        }

        if state.is_sound_enabled() {
            hal.beep(Tone::CONFIRM).await;
        }
        RouteOutcome::Handled
    }

    async fn factory_reset<D, P, H>(
        &mut self,
        state: &SharedState,
        display: &SharedDisplay<D>,
        prefs: &mut P,
        hal: &mut H,
    ) -> RouteOutcome
    where
        D: DrawTarget<Color = Rgb565>,
        D::Error: Debug,
        P: PreferenceStore,
        H: InputHal,
    {
        if !self.factory_reset.trigger() {
            return RouteOutcome::Ignored;
        }

        info!(" Factory reset requested");
        if let Err(e) = prefs.clear() {
            error!(" Failed to clear preferences: {}", e);
        }

        // Keep the panel until the restart so the scheduler cannot paint over the notice.
        let mut target = display.lock().await;
        if let Err(e) = overlay::draw_reset_notice(&mut *target, state.language()) {
            error!(" Failed to draw reset notice: {:?}", e);
        }
        hal.pause(self.config.reset_hold()).await;

        info!(" Restarting");
        hal.restart();
        RouteOutcome::Restarting
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::app_state::StopwatchPhase;
    use crate::i18n::Language;
    use crate::power::{force_button_wake, force_flags};
    use crate::prefs::{MemoryPreferenceStore, Preferences};
    use crate::test_support::{HalEvent, MockHal, RecordingTarget};

    struct Rig {
        router: InputRouter,
        state: SharedState,
        display: SharedDisplay<RecordingTarget>,
        prefs: MemoryPreferenceStore,
        hal: MockHal,
    }

    impl Rig {
        fn new(screen: ScreenId) -> Self {
            let state = SharedState::new();
            state.set_active_screen(screen);
            state.take_full_redraw();
            let mut prefs = MemoryPreferenceStore::new();
            prefs
                .save(&Preferences {
                    language: Language::English,
                })
                .unwrap();
            Self {
                router: InputRouter::new(InputConfig::default()),
                state,
                display: SharedDisplay::new(RecordingTarget::new()),
                prefs,
                hal: MockHal::new(),
            }
        }

        fn send(&mut self, event: InputEvent, ms: u64) -> RouteOutcome {
            block_on(self.router.handle(
                event,
                Instant::from_millis(ms),
                &self.state,
                &self.display,
                &mut self.prefs,
                &mut self.hal,
            ))
        }
    }

    fn press(ms: u64) -> InputEvent {
        InputEvent::Pressed {
            held: Duration::from_millis(ms),
        }
    }

    #[test]
    fn test_every_event_resets_idle_time_first() {
        let events = [
            InputEvent::Rotated { position: 2 },
            InputEvent::Rotated { position: 99 },
            InputEvent::ButtonDown,
            press(100),
        ];
        for (i, event) in events.into_iter().enumerate() {
            let mut rig = Rig::new(ScreenId::Humidity);
            let now = 40_000 + i as u64;
            rig.send(event, now);
            assert_eq!(
                rig.state.activity.idle_for(Instant::from_millis(now)),
                Duration::from_ticks(0)
            );
        }
    }

    #[test]
    fn test_rotation_selects_screen_and_indicator() {
        let mut rig = Rig::new(ScreenId::Temperature);
        assert_eq!(rig.send(InputEvent::Rotated { position: 7 }, 10), RouteOutcome::Handled);
        assert_eq!(rig.state.active_screen(), ScreenId::Timer);
        assert_eq!(rig.hal.last_indicator(), Some(ScreenId::Timer.indicator_color()));
        assert_eq!(rig.hal.count(&HalEvent::Beep(Tone::CLICK)), 1);
    }

    #[test]
    fn test_out_of_range_rotation_is_ignored() {
        let mut rig = Rig::new(ScreenId::Soil);
        for position in [-1, 8, i32::MAX] {
            assert_eq!(rig.send(InputEvent::Rotated { position }, 10), RouteOutcome::Ignored);
        }
        assert_eq!(rig.state.active_screen(), ScreenId::Soil);
        assert!(rig.hal.events.is_empty());
    }

    #[test]
    fn test_scenario_press_while_asleep_wakes_to_default_screen() {
        let mut rig = Rig::new(ScreenId::Soil);
        force_flags(&rig.state, true, false);

        rig.send(InputEvent::ButtonDown, 70_000);

        assert!(!rig.state.power.peripherals_sleeping());
        assert_eq!(rig.state.active_screen(), ScreenId::DEFAULT);
        assert!(rig.state.is_full_redraw_pending());
    }

    #[test]
    fn test_scenario_long_press_on_system_resets_once_without_toggling_sound() {
        let mut rig = Rig::new(ScreenId::SystemInfo);

        assert_eq!(rig.send(press(2_100), 10), RouteOutcome::Restarting);
        assert!(rig.state.is_sound_enabled());
        assert_eq!(rig.prefs.load(), Ok(None));
        assert_eq!(rig.hal.count(&HalEvent::Restart), 1);
        assert!(block_on(rig.display.lock()).pixels > 0);

        assert_eq!(rig.send(press(2_100), 20), RouteOutcome::Ignored);
        assert_eq!(rig.hal.count(&HalEvent::Restart), 1);
        assert!(rig.state.is_sound_enabled());
    }

    #[test]
    fn test_short_press_on_system_toggles_sound_silently() {
        let mut rig = Rig::new(ScreenId::SystemInfo);
        rig.send(press(300), 10);
        assert!(!rig.state.is_sound_enabled());
        rig.send(press(300), 20);
        assert!(rig.state.is_sound_enabled());
        assert_eq!(rig.hal.beeps(), 0);
        assert_eq!(rig.hal.count(&HalEvent::Restart), 0);
    }

    #[test]
    fn test_press_on_thermometers_toggles_units() {
        for screen in [ScreenId::Temperature, ScreenId::ExternalProbe] {
            let mut rig = Rig::new(screen);
            rig.send(press(2_500), 10);
            assert!(rig.state.is_fahrenheit());
            assert_eq!(rig.hal.count(&HalEvent::Beep(Tone::CONFIRM)), 1);
        }
    }

    #[test]
    fn test_timer_press_toggles_and_long_press_resets() {
        let mut rig = Rig::new(ScreenId::Timer);
        rig.send(press(200), 1_000);
        assert_eq!(rig.state.stopwatch.phase(), StopwatchPhase::Running);
        rig.send(press(200), 4_000);
        assert_eq!(rig.state.stopwatch.phase(), StopwatchPhase::Paused);
        assert_eq!(
            rig.state.stopwatch.elapsed(Instant::from_millis(9_000)),
            Duration::from_millis(3_000)
        );

        rig.send(press(2_200), 5_000);
        assert_eq!(rig.state.stopwatch.phase(), StopwatchPhase::Ready);
        assert_eq!(rig.hal.count(&HalEvent::Beep(Tone::CONFIRM)), 3);
    }

    #[test]
    fn test_confirmation_tone_respects_sound_setting() {
        let mut rig = Rig::new(ScreenId::Light);
        rig.state.toggle_sound();
        rig.send(press(100), 10);
        rig.send(InputEvent::Rotated { position: 0 }, 20);
        assert_eq!(rig.hal.beeps(), 0);
    }

    #[test]
    fn test_waking_press_only_wakes() {
        let mut rig = Rig::new(ScreenId::Soil);
        force_flags(&rig.state, true, false);

        assert_eq!(rig.send(InputEvent::ButtonDown, 100), RouteOutcome::Ignored);
        assert_eq!(rig.send(press(150), 250), RouteOutcome::Ignored);

        assert_eq!(rig.state.active_screen(), ScreenId::DEFAULT);
        assert!(!rig.state.is_fahrenheit());
        assert_eq!(rig.hal.beeps(), 0);

        // The next full press acts normally
        rig.send(InputEvent::ButtonDown, 1_000);
        rig.send(press(150), 1_150);
        assert!(rig.state.is_fahrenheit());
    }

    #[test]
    fn test_press_after_light_sleep_button_exit_only_wakes() {
        // The power manager already ran the wake path when the button
        // ended light sleep; the press then reaches the router.
        let mut rig = Rig::new(ScreenId::DEFAULT);
        force_button_wake(&rig.state);

        rig.send(InputEvent::ButtonDown, 100);
        assert_eq!(rig.send(press(150), 250), RouteOutcome::Ignored);
        assert!(!rig.state.is_fahrenheit());
    }

    #[test]
    fn test_late_press_after_light_sleep_exit_acts_normally() {
        // The waking press was too short for the poller to see
        let mut rig = Rig::new(ScreenId::DEFAULT);
        force_button_wake(&rig.state);

        rig.send(InputEvent::ButtonDown, 5_000);
        rig.send(press(150), 5_150);
        assert!(rig.state.is_fahrenheit());
    }

    #[test]
    fn test_rotation_that_wakes_still_selects_screen() {
        let mut rig = Rig::new(ScreenId::Soil);
        force_flags(&rig.state, true, false);

        rig.send(InputEvent::Rotated { position: 7 }, 100);

        assert!(!rig.state.power.peripherals_sleeping());
        assert_eq!(rig.state.active_screen(), ScreenId::Timer);
    }
}
