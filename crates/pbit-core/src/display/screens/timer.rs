use core::fmt::Write;

use embassy_time::Duration;
use embedded_graphics::pixelcolor::{Rgb565, WebColors};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Alignment;
use heapless::String;

use super::{RenderContext, RenderPass, ScreenRenderer};
use crate::app_state::StopwatchPhase;
use crate::display::widgets::{self, BACKGROUND, CARD_BORDER, LABEL, TEXT};
use crate::i18n::{TextKey, text};
use crate::screen::ScreenId;

pub type ElapsedText = String<12>;

/// `MM:SS.cc` under an hour, `HH:MM:SS` from then on.
pub fn format_elapsed(elapsed: Duration) -> ElapsedText {
    let total_ms = elapsed.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = total_ms / 60_000 % 60;
    let seconds = total_ms / 1_000 % 60;

    let mut out = ElapsedText::new();
    let _ = if hours == 0 {
        write!(out, "{:02}:{:02}.{:02}", minutes, seconds, total_ms / 10 % 100)
    } else {
        write!(out, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    };
    out
}

fn phase_style(phase: StopwatchPhase) -> (TextKey, TextKey, Rgb565) {
    match phase {
        StopwatchPhase::Ready => (TextKey::TimerReady, TextKey::PushToStart, Rgb565::CSS_DEEP_SKY_BLUE),
        StopwatchPhase::Running => (TextKey::TimerRunning, TextKey::PushToPause, Rgb565::GREEN),
        StopwatchPhase::Paused => (TextKey::TimerPaused, TextKey::HoldToReset, Rgb565::CSS_ORANGE),
    }
}

/// Stopwatch with a phase card. The time is refreshed on the scheduler's
/// timer tick, not on sensor data.
pub struct TimerScreen {
    last_phase: Option<StopwatchPhase>,
    last_time: Option<ElapsedText>,
}

impl TimerScreen {
    pub fn new() -> Self {
        Self {
            last_phase: None,
            last_time: None,
        }
    }
}

impl Default for TimerScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenRenderer for TimerScreen {
    fn render<D>(
        &mut self,
        target: &mut D,
        ctx: &RenderContext<'_>,
        pass: RenderPass,
    ) -> Result<bool, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if pass.screen_changed {
            self.last_phase = None;
            self.last_time = None;
            widgets::draw_header(
                target,
                text(ctx.language, TextKey::TitleTimer),
                widgets::accent_for(ScreenId::Timer.indicator_color()),
            )?;
        } else if !(pass.data_changed || pass.timer_tick_due) {
            return Ok(false);
        }

        let area = widgets::content_area();
        let mut drew = pass.screen_changed;

        let phase = ctx.stopwatch_phase;
        if self.last_phase != Some(phase) {
            let (label, hint, color) = phase_style(phase);
            let card = Rectangle::new(
                area.top_left + Point::new(30, 6),
                Size::new(area.size.width - 60, 18),
            );
            widgets::draw_card(target, card, CARD_BORDER)?;
            widgets::draw_text(
                target,
                text(ctx.language, label),
                card.center(),
                widgets::SMALL_FONT,
                color,
                Alignment::Center,
            )?;
            widgets::draw_footer(target, text(ctx.language, hint), LABEL)?;
            self.last_phase = Some(phase);
            drew = true;
        }

        let time = format_elapsed(ctx.stopwatch_elapsed);
        if self.last_time.as_ref() != Some(&time) {
            let time_area = Rectangle::new(
                Point::new(0, area.top_left.y + 34),
                Size::new(area.size.width, 30),
            );
            widgets::fill(target, time_area, BACKGROUND)?;
            widgets::draw_text(
                target,
                &time,
                time_area.center(),
                widgets::VALUE_FONT,
                TEXT,
                Alignment::Center,
            )?;
            self.last_time = Some(time);
            drew = true;
        }

        Ok(drew)
    }
}
