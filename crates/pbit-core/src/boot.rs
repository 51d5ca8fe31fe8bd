//! Startup: rebuild the shared state after a cold boot or a deep-sleep wake.

use embassy_time::{Duration, Instant};
use log::{info, warn};

use crate::app_state::SharedState;
use crate::hal::{Clock, Feedback, Tone, WakeCause};
use crate::power;
use crate::prefs::{PreferenceStore, Preferences};
use crate::screen::ScreenId;

/// Reset `state` to power-on values, restore the saved preferences and pick
/// the first screen.
///
/// A cold boot starts on the splash; a button wake from deep sleep goes
/// straight to [`ScreenId::DEFAULT`]. Unreadable preferences fall back to
/// the defaults.
pub fn bootstrap<P: PreferenceStore>(
    cause: WakeCause,
    prefs: &mut P,
    state: &SharedState,
    now: Instant,
) -> ScreenId {
    state.reset();
    power::reset_flags(state);

    let preferences = match prefs.load() {
        Ok(Some(preferences)) => preferences,
        Ok(None) => Preferences::default(),
        Err(e) => {
            warn!(" Using default preferences: {}", e);
            Preferences::default()
        }
    };
    state.set_language(preferences.language);
    state.activity.reset(now);

    let first = match cause {
        WakeCause::ColdBoot => ScreenId::Boot,
        WakeCause::ButtonWake => ScreenId::DEFAULT,
    };
    state.set_active_screen(first);

    info!(
        " Boot after {:?}, language {:?}, first screen {:?}",
        cause, preferences.language, first
    );
    first
}

/// Leave the splash for the default screen. Idle time starts counting here.
pub fn finish_splash(state: &SharedState, now: Instant) {
    if state.active_screen() == ScreenId::Boot {
        state.set_active_screen(ScreenId::DEFAULT);
        state.activity.touch(now);
    }
}

/// Play the boot jingle, hold the splash for `hold`, then move on.
///
/// Does nothing unless the splash is showing. Idle time starts at
/// `clock`'s reading once the splash is gone.
pub async fn play_splash<H, C>(state: &SharedState, hal: &mut H, hold: Duration, clock: &C)
where
    H: Feedback,
    C: Clock,
{
    if state.active_screen() != ScreenId::Boot {
        return;
    }

    if state.is_sound_enabled() {
        for tone in Tone::JINGLE {
            hal.beep(tone).await;
        }
    }
    hal.pause(hold).await;

    finish_splash(state, clock.now());
    hal.set_indicator(ScreenId::DEFAULT.indicator_color());
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::i18n::Language;
    use crate::prefs::MemoryPreferenceStore;
    use crate::test_support::{HalEvent, MockHal};

    struct FixedClock(Instant);

    impl Clock for FixedClock {
        fn now(&self) -> Instant {
            self.0
        }
    }

    const SPLASH: Duration = Duration::from_millis(2_500);

    fn store(language: Language) -> MemoryPreferenceStore {
        let mut prefs = MemoryPreferenceStore::new();
        prefs.save(&Preferences { language }).unwrap();
        prefs
    }

    #[test]
    fn test_cold_boot_starts_on_splash() {
        let state = SharedState::new();
        let mut prefs = store(Language::Catalan);

        let first = bootstrap(WakeCause::ColdBoot, &mut prefs, &state, Instant::from_millis(40));

        assert_eq!(first, ScreenId::Boot);
        assert_eq!(state.active_screen(), ScreenId::Boot);
        assert_eq!(state.language(), Language::Catalan);
        assert_eq!(state.activity.last_activity_ms(), 40);
        assert!(state.is_full_redraw_pending());
    }

    #[test]
    fn test_button_wake_skips_splash_and_clears_volatile_state() {
        let state = SharedState::new();
        state.toggle_fahrenheit();
        state.set_peer_connected(true);
        let mut prefs = store(Language::English);

        let first = bootstrap(WakeCause::ButtonWake, &mut prefs, &state, Instant::from_millis(0));

        assert_eq!(first, ScreenId::DEFAULT);
        assert!(!state.is_fahrenheit());
        assert!(!state.is_peer_connected());
        assert!(!state.power.peripherals_sleeping());
        assert_eq!(state.power.state(), power::PowerState::Active);
    }

    #[test]
    fn test_corrupt_preferences_fall_back_to_default_language() {
        let state = SharedState::new();
        let mut prefs = MemoryPreferenceStore::new();
        prefs.set_bytes(&[0xFF, 0xFF]);

        bootstrap(WakeCause::ColdBoot, &mut prefs, &state, Instant::from_millis(0));
        assert_eq!(state.language(), Language::default());
    }

    #[test]
    fn test_splash_plays_jingle_then_shows_default_screen() {
        let state = SharedState::new();
        let mut prefs = MemoryPreferenceStore::new();
        bootstrap(WakeCause::ColdBoot, &mut prefs, &state, Instant::from_millis(0));
        let mut hal = MockHal::new();

        let clock = FixedClock(Instant::from_millis(2_600));

        block_on(play_splash(&state, &mut hal, SPLASH, &clock));

        assert_eq!(hal.beeps(), Tone::JINGLE.len());
        assert_eq!(state.active_screen(), ScreenId::DEFAULT);
        assert_eq!(state.activity.last_activity_ms(), 2_600);
        assert_eq!(
            hal.events.last(),
            Some(&HalEvent::Indicator(ScreenId::DEFAULT.indicator_color()))
        );
    }

    #[test]
    fn test_splash_is_skipped_after_button_wake() {
        let state = SharedState::new();
        let mut prefs = MemoryPreferenceStore::new();
        bootstrap(WakeCause::ButtonWake, &mut prefs, &state, Instant::from_millis(0));
        let mut hal = MockHal::new();

        block_on(play_splash(&state, &mut hal, SPLASH, &FixedClock(Instant::from_millis(0))));
        assert!(hal.events.is_empty());
    }
}
