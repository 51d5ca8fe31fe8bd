use embedded_graphics::pixelcolor::{Rgb565, WebColors};
use embedded_graphics::prelude::*;
use embedded_graphics::text::Alignment;

use super::{RenderContext, RenderPass, ScreenRenderer};
use crate::display::widgets::{self, LABEL};

/// Splash shown on a cold boot while the jingle plays.
pub struct BootScreen;

impl BootScreen {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BootScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenRenderer for BootScreen {
    fn render<D>(
        &mut self,
        target: &mut D,
        _ctx: &RenderContext<'_>,
        pass: RenderPass,
    ) -> Result<bool, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if !pass.screen_changed {
            return Ok(false);
        }

        let center = widgets::screen_area().center();
        widgets::draw_text(
            target,
            "P-Bit",
            center - Point::new(0, 10),
            widgets::VALUE_FONT,
            Rgb565::CSS_DEEP_SKY_BLUE,
            Alignment::Center,
        )?;
        widgets::draw_text(
            target,
            concat!("v", env!("CARGO_PKG_VERSION")),
            center + Point::new(0, 14),
            widgets::SMALL_FONT,
            LABEL,
            Alignment::Center,
        )?;
        Ok(true)
    }
}
