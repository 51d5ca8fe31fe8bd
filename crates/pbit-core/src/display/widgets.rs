//! Drawing primitives shared by the screen renderers.
//!
//! Layout is fixed for the 160x128 landscape panel: a coloured header bar,
//! a content region and a one-line footer.

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::iso_8859_1::{FONT_6X10, FONT_7X13_BOLD, FONT_10X20};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::{Rgb565, Rgb888, WebColors};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use super::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::i18n::{Language, TextKey, text};

pub const HEADER_HEIGHT: u32 = 22;
pub const FOOTER_HEIGHT: u32 = 14;

pub const BACKGROUND: Rgb565 = Rgb565::BLACK;
pub const TEXT: Rgb565 = Rgb565::WHITE;
pub const MUTED: Rgb565 = Rgb565::CSS_DIM_GRAY;
pub const LABEL: Rgb565 = Rgb565::CSS_LIGHT_GRAY;
pub const CARD_BORDER: Rgb565 = Rgb565::CSS_DARK_GRAY;
pub const ORANGE: Rgb565 = Rgb565::CSS_ORANGE;

pub const SMALL_FONT: &MonoFont<'static> = &FONT_6X10;
pub const TITLE_FONT: &MonoFont<'static> = &FONT_7X13_BOLD;
pub const VALUE_FONT: &MonoFont<'static> = &FONT_10X20;

// ---- layout ----

pub fn screen_area() -> Rectangle {
    Rectangle::new(Point::zero(), Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT))
}

pub fn content_area() -> Rectangle {
    Rectangle::new(
        Point::new(0, HEADER_HEIGHT as i32),
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT - HEADER_HEIGHT - FOOTER_HEIGHT),
    )
}

pub fn footer_area() -> Rectangle {
    Rectangle::new(
        Point::new(0, (DISPLAY_HEIGHT - FOOTER_HEIGHT) as i32),
        Size::new(DISPLAY_WIDTH, FOOTER_HEIGHT),
    )
}

/// Clamp a gauge fill fraction into `0.0..=1.0`; NaN reads as empty.
pub fn clamp_fraction(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

// ---- primitives ----

pub fn fill<D>(target: &mut D, area: Rectangle, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    area.into_styled(PrimitiveStyle::with_fill(color))
        .draw(target)
}

pub fn draw_text<D>(
    target: &mut D,
    content: &str,
    anchor: Point,
    font: &MonoFont<'_>,
    color: Rgb565,
    alignment: Alignment,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let style = TextStyleBuilder::new()
        .alignment(alignment)
        .baseline(Baseline::Middle)
        .build();
    Text::with_text_style(content, anchor, MonoTextStyle::new(font, color), style).draw(target)?;
    Ok(())
}

/// Title bar in the screen's accent colour.
pub fn draw_header<D>(target: &mut D, title: &str, accent: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let bar = Rectangle::new(Point::zero(), Size::new(DISPLAY_WIDTH, HEADER_HEIGHT));
    fill(target, bar, accent)?;
    draw_text(
        target,
        title,
        bar.center(),
        TITLE_FONT,
        BACKGROUND,
        Alignment::Center,
    )
}

/// Replace the footer line with `content`.
pub fn draw_footer<D>(target: &mut D, content: &str, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let area = footer_area();
    fill(target, area, BACKGROUND)?;
    draw_text(
        target,
        content,
        area.center(),
        SMALL_FONT,
        color,
        Alignment::Center,
    )
}

/// Outlined card.
pub fn draw_card<D>(target: &mut D, area: Rectangle, border: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let style = PrimitiveStyleBuilder::new()
        .stroke_color(border)
        .stroke_width(1)
        .fill_color(BACKGROUND)
        .build();
    area.into_styled(style).draw(target)
}

/// Horizontal bar filled from the left.
pub fn draw_bar<D>(
    target: &mut D,
    area: Rectangle,
    fraction: f32,
    color: Rgb565,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    draw_card(target, area, CARD_BORDER)?;
    let inner = area.offset(-2);
    let filled = (inner.size.width as f32 * clamp_fraction(fraction)) as u32;
    if filled > 0 {
        fill(
            target,
            Rectangle::new(inner.top_left, Size::new(filled, inner.size.height)),
            color,
        )?;
    }
    Ok(())
}

/// Vertical tank filled from the bottom.
pub fn draw_tank<D>(
    target: &mut D,
    area: Rectangle,
    fraction: f32,
    color: Rgb565,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    draw_card(target, area, CARD_BORDER)?;
    let inner = area.offset(-2);
    let level = (inner.size.height as f32 * clamp_fraction(fraction)) as u32;
    if level > 0 {
        let top = inner.top_left.y + (inner.size.height - level) as i32;
        fill(
            target,
            Rectangle::new(
                Point::new(inner.top_left.x, top),
                Size::new(inner.size.width, level),
            ),
            color,
        )?;
    }
    Ok(())
}

/// Muted "no sensor" hint centred in `area`.
pub fn draw_no_sensor<D>(target: &mut D, area: Rectangle, language: Language) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    fill(target, area, BACKGROUND)?;
    draw_text(
        target,
        "---",
        area.center() - Point::new(0, 10),
        VALUE_FONT,
        MUTED,
        Alignment::Center,
    )?;
    draw_text(
        target,
        text(language, TextKey::NoSensor),
        area.center() + Point::new(0, 12),
        SMALL_FONT,
        MUTED,
        Alignment::Center,
    )
}

/// Panel colour for the indicator colour of the same screen.
pub fn accent_for(color: Rgb888) -> Rgb565 {
    Rgb565::new(color.r() >> 3, color.g() >> 2, color.b() >> 3)
}
