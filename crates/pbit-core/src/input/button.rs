use embassy_time::{Duration, Instant};

use super::InputEvent;

/// Debounces the encoder push button and measures how long it was held.
#[derive(Debug, Clone)]
pub struct ButtonTracker {
    debounce: Duration,
    stable: bool,
    candidate: bool,
    candidate_since: Instant,
    pressed_at: Option<Instant>,
}

impl ButtonTracker {
    /// `initially_pressed` covers a button still held from a wake: its
    /// release is swallowed instead of being reported as a press.
    pub fn new(debounce: Duration, initially_pressed: bool) -> Self {
        Self {
            debounce,
            stable: initially_pressed,
            candidate: initially_pressed,
            candidate_since: Instant::from_ticks(0),
            pressed_at: None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.stable
    }

    /// Feed the raw level sampled at `now` (`true` = pressed).
    pub fn update(&mut self, pressed: bool, now: Instant) -> Option<InputEvent> {
        if pressed != self.candidate {
            self.candidate = pressed;
            self.candidate_since = now;
        }

        if self.candidate == self.stable
            || now.checked_duration_since(self.candidate_since)? < self.debounce
        {
            return None;
        }

        self.stable = self.candidate;
        if self.stable {
            self.pressed_at = Some(self.candidate_since);
            Some(InputEvent::ButtonDown)
        } else {
            let pressed_at = self.pressed_at.take()?;
            let held = self
                .candidate_since
                .checked_duration_since(pressed_at)
                .unwrap_or(Duration::from_ticks(0));
            Some(InputEvent::Pressed { held })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn test_press_and_release_report_hold_time() {
        let mut button = ButtonTracker::new(Duration::from_millis(30), false);
        assert_eq!(button.update(true, at(1_000)), None);
        assert_eq!(button.update(true, at(1_030)), Some(InputEvent::ButtonDown));
        assert_eq!(button.update(true, at(2_000)), None);
        assert_eq!(button.update(false, at(3_100)), None);
        assert_eq!(
            button.update(false, at(3_140)),
            Some(InputEvent::Pressed {
                held: Duration::from_millis(2_100)
            })
        );
    }

    #[test]
    fn test_contact_bounce_is_ignored() {
        let mut button = ButtonTracker::new(Duration::from_millis(30), false);
        for ms in (0..100).step_by(10) {
            assert_eq!(button.update(ms % 20 == 0, at(ms)), None);
        }
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_release_of_wake_press_is_swallowed() {
        let mut button = ButtonTracker::new(Duration::from_millis(30), true);
        assert_eq!(button.update(false, at(500)), None);
        assert_eq!(button.update(false, at(600)), None);
        assert!(!button.is_pressed());
    }
}
