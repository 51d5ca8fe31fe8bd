//! Screen identifiers and the rotary selector mapping.

use embedded_graphics::pixelcolor::Rgb888;

use crate::i18n::TextKey;

/// Every display mode the device can show. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ScreenId {
    Boot = 0,
    Temperature,
    Humidity,
    Light,
    Sound,
    Soil,
    ExternalProbe,
    SystemInfo,
    Timer,
}

impl ScreenId {
    pub const COUNT: usize = 9;

    pub const ALL: [ScreenId; Self::COUNT] = [
        ScreenId::Boot,
        ScreenId::Temperature,
        ScreenId::Humidity,
        ScreenId::Light,
        ScreenId::Sound,
        ScreenId::Soil,
        ScreenId::ExternalProbe,
        ScreenId::SystemInfo,
        ScreenId::Timer,
    ];

    /// Screens reachable from the rotary encoder, in dial order.
    ///
    /// The encoder's range is `0..SELECTABLE.len()`; keep the two in step.
    pub const SELECTABLE: [ScreenId; Self::COUNT - 1] = [
        ScreenId::Temperature,
        ScreenId::Humidity,
        ScreenId::Light,
        ScreenId::Sound,
        ScreenId::Soil,
        ScreenId::ExternalProbe,
        ScreenId::SystemInfo,
        ScreenId::Timer,
    ];

    /// Screen shown after boot and after every wake.
    pub const DEFAULT: ScreenId = ScreenId::Temperature;

    /// Map an absolute encoder position to a screen.
    ///
    /// Returns `None` for positions outside the dial range.
    pub fn from_selector(position: i32) -> Option<Self> {
        usize::try_from(position)
            .ok()
            .and_then(|index| Self::SELECTABLE.get(index).copied())
    }

    /// Encoder position for this screen, `None` for [`ScreenId::Boot`].
    pub fn selector(self) -> Option<i32> {
        Self::SELECTABLE
            .iter()
            .position(|screen| *screen == self)
            .map(|index| index as i32)
    }

    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> Option<TextKey> {
        match self {
            ScreenId::Boot => None,
            ScreenId::Temperature => Some(TextKey::TitleTemperature),
            ScreenId::Humidity => Some(TextKey::TitleHumidity),
            ScreenId::Light => Some(TextKey::TitleLight),
            ScreenId::Sound => Some(TextKey::TitleSound),
            ScreenId::Soil => Some(TextKey::TitleSoil),
            ScreenId::ExternalProbe => Some(TextKey::TitleThermometer),
            ScreenId::SystemInfo => Some(TextKey::TitleSystem),
            ScreenId::Timer => Some(TextKey::TitleTimer),
        }
    }

    /// RGB indicator colour announcing this screen.
    pub fn indicator_color(self) -> Rgb888 {
        match self {
            ScreenId::Boot => Rgb888::new(0, 0, 0),
            ScreenId::Temperature => Rgb888::new(255, 80, 0),
            ScreenId::Humidity => Rgb888::new(0, 120, 255),
            ScreenId::Light => Rgb888::new(255, 200, 0),
            ScreenId::Sound => Rgb888::new(180, 0, 255),
            ScreenId::Soil => Rgb888::new(120, 60, 0),
            ScreenId::ExternalProbe => Rgb888::new(255, 0, 60),
            ScreenId::SystemInfo => Rgb888::new(0, 255, 0),
            ScreenId::Timer => Rgb888::new(0, 255, 255),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_round_trips_every_selectable_screen() {
        for (position, screen) in ScreenId::SELECTABLE.iter().enumerate() {
            assert_eq!(ScreenId::from_selector(position as i32), Some(*screen));
            assert_eq!(screen.selector(), Some(position as i32));
        }
    }

    #[test]
    fn test_out_of_range_selector_is_rejected() {
        assert_eq!(ScreenId::from_selector(-1), None);
        assert_eq!(ScreenId::from_selector(ScreenId::SELECTABLE.len() as i32), None);
        assert_eq!(ScreenId::from_selector(i32::MAX), None);
    }

    #[test]
    fn test_boot_is_not_selectable() {
        assert_eq!(ScreenId::Boot.selector(), None);
        assert!(!ScreenId::SELECTABLE.contains(&ScreenId::Boot));
    }

    #[test]
    fn test_all_is_indexed_by_discriminant() {
        for (index, screen) in ScreenId::ALL.iter().enumerate() {
            assert_eq!(screen.index(), index);
            assert_eq!(ScreenId::from_u8(index as u8), Some(*screen));
        }
        assert_eq!(ScreenId::from_u8(ScreenId::COUNT as u8), None);
    }
}
