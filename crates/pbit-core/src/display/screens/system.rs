use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Alignment;

use super::{RenderContext, RenderPass, ScreenRenderer};
use crate::display::widgets::{self, BACKGROUND, CARD_BORDER, LABEL, TEXT};
use crate::i18n::{TextKey, text};
use crate::screen::ScreenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shown {
    peer_connected: bool,
    sound_enabled: bool,
}

/// Device name, link status and the sound toggle.
pub struct SystemScreen {
    last: Option<Shown>,
}

impl SystemScreen {
    pub fn new() -> Self {
        Self { last: None }
    }

    fn card() -> Rectangle {
        let area = widgets::content_area();
        Rectangle::new(
            area.top_left + Point::new(8, 4),
            Size::new(area.size.width - 16, area.size.height - 8),
        )
    }
}

impl Default for SystemScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenRenderer for SystemScreen {
    fn render<D>(
        &mut self,
        target: &mut D,
        ctx: &RenderContext<'_>,
        pass: RenderPass,
    ) -> Result<bool, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let card = Self::card();
        let left = card.top_left.x + 8;

        if pass.screen_changed {
            self.last = None;
            widgets::draw_header(
                target,
                text(ctx.language, TextKey::TitleSystem),
                widgets::accent_for(ScreenId::SystemInfo.indicator_color()),
            )?;
            widgets::draw_card(target, card, CARD_BORDER)?;
            widgets::draw_text(
                target,
                "DEVICE",
                Point::new(left, card.top_left.y + 10),
                widgets::SMALL_FONT,
                LABEL,
                Alignment::Left,
            )?;
            widgets::draw_text(
                target,
                ctx.device_name,
                Point::new(left, card.top_left.y + 24),
                widgets::TITLE_FONT,
                TEXT,
                Alignment::Left,
            )?;
            widgets::draw_text(
                target,
                "BLE",
                Point::new(left, card.top_left.y + 46),
                widgets::SMALL_FONT,
                LABEL,
                Alignment::Left,
            )?;
        } else if !pass.data_changed {
            return Ok(false);
        }

        let shown = Shown {
            peer_connected: ctx.peer_connected,
            sound_enabled: ctx.sound_enabled,
        };
        if self.last == Some(shown) {
            return Ok(pass.screen_changed);
        }

        let status_area = Rectangle::new(
            Point::new(left + 24, card.top_left.y + 40),
            Size::new(card.size.width - 40, 12),
        );
        widgets::fill(target, status_area, BACKGROUND)?;
        let (status, status_color) = if shown.peer_connected {
            (TextKey::LinkConnected, Rgb565::GREEN)
        } else {
            (TextKey::LinkDisconnected, Rgb565::RED)
        };
        widgets::draw_text(
            target,
            text(ctx.language, status),
            Point::new(status_area.top_left.x, status_area.center().y),
            widgets::SMALL_FONT,
            status_color,
            Alignment::Left,
        )?;

        let (footer, footer_color) = if shown.sound_enabled {
            (TextKey::SoundFooterOn, Rgb565::GREEN)
        } else {
            (TextKey::SoundFooterOff, Rgb565::RED)
        };
        widgets::draw_footer(target, text(ctx.language, footer), footer_color)?;

        self.last = Some(shown);
        Ok(true)
    }
}
