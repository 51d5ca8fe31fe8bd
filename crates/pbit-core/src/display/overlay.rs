//! Full-screen notices drawn outside the scheduler: the sleep overlay
//! (by the power manager) and the factory reset message (by the input
//! router).

use embedded_graphics::pixelcolor::{Rgb565, WebColors};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Alignment;

use super::widgets::{self, BACKGROUND, TEXT};
use crate::i18n::{Language, TextKey, text};

const OVERLAY_SIZE: Size = Size::new(120, 56);

/// "Going to sleep" card over whatever is on screen.
pub fn draw_sleep_overlay<D>(target: &mut D, language: Language) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let screen = widgets::screen_area();
    let card = Rectangle::with_center(screen.center(), OVERLAY_SIZE);

    widgets::draw_card(target, card, Rgb565::CSS_SLATE_BLUE)?;
    widgets::draw_text(
        target,
        "Zzz",
        card.center() - Point::new(0, 10),
        widgets::VALUE_FONT,
        Rgb565::CSS_SLATE_BLUE,
        Alignment::Center,
    )?;
    widgets::draw_text(
        target,
        text(language, TextKey::SleepImminent),
        card.center() + Point::new(0, 12),
        widgets::SMALL_FONT,
        TEXT,
        Alignment::Center,
    )
}

/// Factory reset confirmation shown right before the restart.
pub fn draw_reset_notice<D>(target: &mut D, language: Language) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let screen = widgets::screen_area();
    widgets::fill(target, screen, BACKGROUND)?;
    widgets::draw_text(
        target,
        text(language, TextKey::FactoryReset),
        screen.center(),
        widgets::TITLE_FONT,
        Rgb565::RED,
        Alignment::Center,
    )
}
