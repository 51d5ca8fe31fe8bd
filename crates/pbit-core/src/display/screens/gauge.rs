use core::fmt::Write;

use embedded_graphics::pixelcolor::{Rgb565, WebColors};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Alignment;
use heapless::String;

use super::{RenderContext, RenderPass, ScreenRenderer};
use crate::display::widgets::{self, BACKGROUND, MUTED, ORANGE};
use crate::i18n::{TextKey, text};
use crate::reading::{Quantity, to_tenths};
use crate::screen::ScreenId;

/// Lux breakpoints for the light bar; each band takes an equal share so the
/// bar reads roughly logarithmic.
const LIGHT_BANDS: [f32; 6] = [0.0, 10.0, 100.0, 500.0, 2_000.0, 20_000.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeKind {
    Humidity,
    Light,
    Sound,
    Soil,
}

impl GaugeKind {
    fn quantity(self) -> Quantity {
        match self {
            GaugeKind::Humidity => Quantity::Humidity,
            GaugeKind::Light => Quantity::Light,
            GaugeKind::Sound => Quantity::Sound,
            GaugeKind::Soil => Quantity::Soil,
        }
    }

    fn unit(self) -> &'static str {
        match self {
            GaugeKind::Humidity | GaugeKind::Soil => "%",
            GaugeKind::Light => "lx",
            GaugeKind::Sound => "dB",
        }
    }

    /// Humidity and soil read as a tank; light and sound as a bar.
    fn is_tank(self) -> bool {
        matches!(self, GaugeKind::Humidity | GaugeKind::Soil)
    }

    pub fn category(self, value: f32) -> (TextKey, Rgb565) {
        match self {
            GaugeKind::Humidity => {
                if value > 70.0 {
                    (TextKey::HumidityMoldRisk, Rgb565::RED)
                } else if value < 30.0 {
                    (TextKey::HumidityTooDry, ORANGE)
                } else {
                    (TextKey::SoilOptimal, Rgb565::GREEN)
                }
            }
            GaugeKind::Light => {
                if value < 10.0 {
                    (TextKey::LightDark, MUTED)
                } else if value < 100.0 {
                    (TextKey::LightDim, Rgb565::CSS_SLATE_GRAY)
                } else if value < 500.0 {
                    (TextKey::LightIndoor, Rgb565::CSS_KHAKI)
                } else if value < 2_000.0 {
                    (TextKey::LightBright, Rgb565::YELLOW)
                } else {
                    (TextKey::LightSunlight, Rgb565::WHITE)
                }
            }
            GaugeKind::Sound => {
                if value < 15.0 {
                    (TextKey::SoundSilent, MUTED)
                } else if value < 40.0 {
                    (TextKey::SoundQuiet, Rgb565::GREEN)
                } else if value < 70.0 {
                    (TextKey::SoundNormal, Rgb565::YELLOW)
                } else if value < 88.0 {
                    (TextKey::SoundLoud, ORANGE)
                } else {
                    (TextKey::SoundVeryLoud, Rgb565::RED)
                }
            }
            GaugeKind::Soil => {
                if value < 20.0 {
                    (TextKey::SoilDry, ORANGE)
                } else if value < 55.0 {
                    (TextKey::SoilOptimal, Rgb565::GREEN)
                } else if value < 80.0 {
                    (TextKey::SoilMoist, Rgb565::CYAN)
                } else {
                    (TextKey::SoilSaturated, Rgb565::BLUE)
                }
            }
        }
    }

    pub fn fraction(self, value: f32) -> f32 {
        match self {
            GaugeKind::Light => light_fraction(value),
            _ => value / 100.0,
        }
    }
}

fn light_fraction(lux: f32) -> f32 {
    let band_share = 1.0 / (LIGHT_BANDS.len() - 1) as f32;
    for (band, pair) in LIGHT_BANDS.windows(2).enumerate() {
        let (low, high) = (pair[0], pair[1]);
        if lux < high {
            let within = ((lux - low) / (high - low)).max(0.0);
            return (band as f32 + within) * band_share;
        }
    }
    1.0
}

/// Nearest whole unit; what the gauge actually prints.
fn whole(value: f32) -> i32 {
    let tenths = to_tenths(value);
    (tenths + if tenths >= 0 { 5 } else { -5 }) / 10
}

/// Single-value gauge with a category label.
pub struct GaugeScreen {
    id: ScreenId,
    kind: GaugeKind,
    last: Option<Option<i32>>,
}

impl GaugeScreen {
    pub fn new(id: ScreenId, kind: GaugeKind) -> Self {
        Self {
            id,
            kind,
            last: None,
        }
    }
}

impl ScreenRenderer for GaugeScreen {
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
            self.last = None;
            let title = self.id.title().map_or("", |key| text(ctx.language, key));
            widgets::draw_header(target, title, widgets::accent_for(self.id.indicator_color()))?;
        } else if !pass.data_changed {
            return Ok(false);
        }

        let value = ctx.reading.value(self.kind.quantity());
        let shown = value.map(whole);
        if self.last == Some(shown) {
            return Ok(pass.screen_changed);
        }

        let area = widgets::content_area();
        let (Some(raw), Some(rounded)) = (value, shown) else {
            widgets::draw_no_sensor(target, area, ctx.language)?;
            self.last = Some(shown);
            return Ok(true);
        };

        let (category, color) = self.kind.category(raw);
        let mut label: String<16> = String::new();
        let _ = write!(label, "{} {}", rounded, self.kind.unit());

        widgets::fill(target, area, BACKGROUND)?;
        let top = area.top_left.y;
        if self.kind.is_tank() {
            let tank = Rectangle::new(
                Point::new(14, top + 6),
                Size::new(24, area.size.height - 12),
            );
            widgets::draw_tank(target, tank, self.kind.fraction(raw), color)?;
            widgets::draw_text(
                target,
                &label,
                Point::new(100, area.center().y - 10),
                widgets::VALUE_FONT,
                widgets::TEXT,
                Alignment::Center,
            )?;
            widgets::draw_text(
                target,
                text(ctx.language, category),
                Point::new(100, area.center().y + 14),
                widgets::SMALL_FONT,
                color,
                Alignment::Center,
            )?;
        } else {
            let center_x = area.center().x;
            widgets::draw_text(
                target,
                &label,
                Point::new(center_x, top + 20),
                widgets::VALUE_FONT,
                widgets::TEXT,
                Alignment::Center,
            )?;
            widgets::draw_text(
                target,
                text(ctx.language, category),
                Point::new(center_x, top + 44),
                widgets::SMALL_FONT,
                color,
                Alignment::Center,
            )?;
            let bar = Rectangle::new(
                Point::new(10, top + area.size.height as i32 - 24),
                Size::new(area.size.width - 20, 14),
            );
            widgets::draw_bar(target, bar, self.kind.fraction(raw), color)?;
        }

        self.last = Some(shown);
        Ok(true)
    }
}
