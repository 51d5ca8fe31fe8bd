//! The sensor snapshot shared between the sampler, the screens and the
//! wireless link.

/// Value stored in [`SensorReading::probe`] when no external probe answers.
pub const PROBE_ABSENT: f32 = -999.0;

/// Anything colder than this is treated as a missing probe rather than a
/// real temperature.
const PROBE_FLOOR: f32 = -100.0;

/// One physical quantity carried by a [`SensorReading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Temperature,
    Humidity,
    Light,
    Sound,
    Soil,
    Probe,
}

/// Latest values from every sensor on the board.
///
/// Fields that have never been read, or whose sensor failed without a
/// previous value to fall back on, hold `NaN`. The external probe uses
/// [`PROBE_ABSENT`] instead. The sampler always replaces the whole struct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Relative humidity in percent
    pub humidity: f32,
    /// Ambient temperature in °C
    pub temperature: f32,
    /// Illuminance in lux
    pub light: f32,
    /// Sound level in dB
    pub sound: f32,
    /// Soil moisture in percent
    pub soil: f32,
    /// External probe temperature in °C
    pub probe: f32,
}

impl SensorReading {
    pub const UNSPECIFIED: Self = Self {
        humidity: f32::NAN,
        temperature: f32::NAN,
        light: f32::NAN,
        sound: f32::NAN,
        soil: f32::NAN,
        probe: PROBE_ABSENT,
    };

    /// The value for `quantity`, or `None` if it holds a sentinel.
    pub fn value(&self, quantity: Quantity) -> Option<f32> {
        let raw = match quantity {
            Quantity::Temperature => self.temperature,
            Quantity::Humidity => self.humidity,
            Quantity::Light => self.light,
            Quantity::Sound => self.sound,
            Quantity::Soil => self.soil,
            Quantity::Probe => {
                if !is_probe_present(self.probe) {
                    return None;
                }
                self.probe
            }
        };

        if raw.is_nan() { None } else { Some(raw) }
    }

    pub fn has_probe(&self) -> bool {
        is_probe_present(self.probe)
    }
}

impl Default for SensorReading {
    fn default() -> Self {
        Self::UNSPECIFIED
    }
}

fn is_probe_present(value: f32) -> bool {
    !value.is_nan() && value >= PROBE_FLOOR
}

pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Round to the nearest tenth and return it as an integer count of tenths.
///
/// `f32::round` lives in `std`, so this does the half-away-from-zero step by
/// hand. Out-of-range values saturate.
pub fn to_tenths(value: f32) -> i32 {
    let scaled = value * 10.0;
    if scaled >= 0.0 {
        (scaled + 0.5) as i32
    } else {
        (scaled - 0.5) as i32
    }
}
