use core::fmt::Write;

use embedded_graphics::pixelcolor::{Rgb565, WebColors};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Alignment;
use heapless::String;

use super::{RenderContext, RenderPass, ScreenRenderer};
use crate::display::widgets::{self, BACKGROUND, LABEL};
use crate::i18n::{TextKey, text};
use crate::reading::{Quantity, celsius_to_fahrenheit, to_tenths};
use crate::screen::ScreenId;

/// Range covered by the tank graphic, in °C.
const TANK_MIN_C: f32 = -10.0;
const TANK_MAX_C: f32 = 50.0;

/// Colour band for a temperature in °C.
pub fn temperature_color(celsius: f32) -> Rgb565 {
    if celsius < 15.0 {
        Rgb565::CSS_DEEP_SKY_BLUE
    } else if celsius < 22.0 {
        Rgb565::CYAN
    } else if celsius < 27.0 {
        Rgb565::GREEN
    } else if celsius < 32.0 {
        Rgb565::CSS_ORANGE
    } else {
        Rgb565::RED
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shown {
    tenths: Option<i32>,
    fahrenheit: bool,
}

/// Ambient or probe temperature with a tank graphic and C/F toggle hint.
pub struct ThermometerScreen {
    id: ScreenId,
    quantity: Quantity,
    last: Option<Shown>,
}

impl ThermometerScreen {
    pub fn new(id: ScreenId, quantity: Quantity) -> Self {
        Self {
            id,
            quantity,
            last: None,
        }
    }
}

impl ScreenRenderer for ThermometerScreen {
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

        let celsius = ctx.reading.value(self.quantity);
        let shown = Shown {
            tenths: celsius.map(|c| {
                to_tenths(if ctx.fahrenheit {
                    celsius_to_fahrenheit(c)
                } else {
                    c
                })
            }),
            fahrenheit: ctx.fahrenheit,
        };
        if self.last == Some(shown) {
            return Ok(pass.screen_changed);
        }

        let area = widgets::content_area();
        match (celsius, shown.tenths) {
            (Some(c), Some(tenths)) => {
                let color = temperature_color(c);
                widgets::fill(target, area, BACKGROUND)?;

                let tank = Rectangle::new(
                    Point::new(14, area.top_left.y + 6),
                    Size::new(18, area.size.height - 12),
                );
                widgets::draw_tank(
                    target,
                    tank,
                    (c - TANK_MIN_C) / (TANK_MAX_C - TANK_MIN_C),
                    color,
                )?;

                let mut label: String<16> = String::new();
                let unit = if ctx.fahrenheit { 'F' } else { 'C' };
                let _ = write!(label, "{:.1}°{}", tenths as f32 / 10.0, unit);
                widgets::draw_text(
                    target,
                    &label,
                    Point::new(96, area.center().y),
                    widgets::VALUE_FONT,
                    color,
                    Alignment::Center,
                )?;

                let hint = if ctx.fahrenheit {
                    TextKey::PushForCelsius
                } else {
                    TextKey::PushForFahrenheit
                };
                widgets::draw_footer(target, text(ctx.language, hint), LABEL)?;
            }
            _ => {
                widgets::draw_no_sensor(target, area, ctx.language)?;
                widgets::fill(target, widgets::footer_area(), BACKGROUND)?;
            }
        }

        self.last = Some(shown);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::screens::tests::{DATA, FULL, context};
    use crate::reading::SensorReading;
    use crate::test_support::RecordingTarget;

    fn ambient(temperature: f32) -> SensorReading {
        SensorReading {
            temperature,
            ..SensorReading::default()
        }
    }

    #[test]
    fn test_unchanged_value_skips_the_draw() {
        let mut screen = ThermometerScreen::new(ScreenId::Temperature, Quantity::Temperature);
        let mut target = RecordingTarget::new();

        assert!(screen.render(&mut target, &context(ambient(21.0)), FULL).unwrap());
        target.take_work();

        // 21.04 rounds to the same tenth
        assert!(!screen.render(&mut target, &context(ambient(21.04)), DATA).unwrap());
        assert_eq!(target.take_work(), (0, 0));

        assert!(screen.render(&mut target, &context(ambient(21.2)), DATA).unwrap());
    }

    #[test]
    fn test_unit_toggle_forces_a_redraw() {
        let mut screen = ThermometerScreen::new(ScreenId::Temperature, Quantity::Temperature);
        let mut target = RecordingTarget::new();
        screen.render(&mut target, &context(ambient(21.0)), FULL).unwrap();

        let mut ctx = context(ambient(21.0));
        ctx.fahrenheit = true;
        assert!(screen.render(&mut target, &ctx, DATA).unwrap());
    }

    #[test]
    fn test_data_pass_leaves_the_header_alone() {
        let mut screen = ThermometerScreen::new(ScreenId::Temperature, Quantity::Temperature);
        let mut target = RecordingTarget::new();
        screen.render(&mut target, &context(ambient(21.0)), FULL).unwrap();
        let (_, full_pixels) = target.take_work();

        screen.render(&mut target, &context(ambient(25.0)), DATA).unwrap();
        let (_, partial_pixels) = target.take_work();

        assert!(partial_pixels > 0);
        assert!(partial_pixels < full_pixels);
    }

    #[test]
    fn test_absent_probe_renders_no_sensor_once() {
        let mut screen = ThermometerScreen::new(ScreenId::ExternalProbe, Quantity::Probe);
        let mut target = RecordingTarget::new();
        let ctx = context(SensorReading::default());

        assert!(screen.render(&mut target, &ctx, FULL).unwrap());
        assert!(!screen.render(&mut target, &ctx, DATA).unwrap());
    }

    #[test]
    fn test_temperature_bands() {
        assert_eq!(temperature_color(10.0), Rgb565::CSS_DEEP_SKY_BLUE);
        assert_eq!(temperature_color(20.0), Rgb565::CYAN);
        assert_eq!(temperature_color(25.0), Rgb565::GREEN);
        assert_eq!(temperature_color(30.0), Rgb565::CSS_ORANGE);
        assert_eq!(temperature_color(35.0), Rgb565::RED);
    }
}
