//! Wireless link seen from the core: a publisher that pushes one
//! notification per sampling cycle and reports whether a peer is connected.
//!
//! The core owns only the payload layout. Transport, advertising and
//! framing belong to the platform's [`WirelessPublisher`].

use core::fmt::Write;
use core::future::Future;

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::display::DeviceName;
use crate::reading::{Quantity, SensorReading, to_tenths};

pub trait WirelessPublisher {
    /// Push `reading` to the connected peer, if any. Must not block longer
    /// than one fast sampling period.
    fn publish(&mut self, reading: &SensorReading) -> impl Future<Output = ()>;

    fn is_peer_connected(&self) -> bool;
}

/// Advertised name, `PBIT-` followed by the last two MAC bytes in hex.
pub fn device_name(mac: [u8; 6]) -> DeviceName {
    let mut name = DeviceName::new();
    let _ = write!(name, "PBIT-{:02X}{:02X}", mac[4], mac[5]);
    name
}

/// Bit in [`NotifyPayload::present`] for each field.
pub mod present {
    pub const TEMPERATURE: u8 = 1 << 0;
    pub const HUMIDITY: u8 = 1 << 1;
    pub const LIGHT: u8 = 1 << 2;
    pub const SOUND: u8 = 1 << 3;
    pub const SOIL: u8 = 1 << 4;
    pub const PROBE: u8 = 1 << 5;
}

/// Notification body. Every field is the value in tenths of its unit;
/// fields whose sensor is missing are zero with their `present` bit clear.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotifyPayload {
    pub present: u8,
    pub temperature: i16,
    pub humidity: i16,
    pub light: i16,
    pub sound: i16,
    pub soil: i16,
    pub probe: i16,
}

impl NotifyPayload {
    pub fn from_reading(reading: &SensorReading) -> Self {
        let mut mask = 0;
        let mut field = |quantity: Quantity, bit: u8| match reading.value(quantity) {
            Some(value) => {
                mask |= bit;
                to_tenths(value).clamp(i16::MIN as i32, i16::MAX as i32) as i16
            }
            None => 0,
        };

        let temperature = field(Quantity::Temperature, present::TEMPERATURE);
        let humidity = field(Quantity::Humidity, present::HUMIDITY);
        let light = field(Quantity::Light, present::LIGHT);
        let sound = field(Quantity::Sound, present::SOUND);
        let soil = field(Quantity::Soil, present::SOIL);
        let probe = field(Quantity::Probe, present::PROBE);

        Self {
            present: mask,
            temperature,
            humidity,
            light,
            sound,
            soil,
            probe,
        }
    }

    pub fn has(&self, bit: u8) -> bool {
        self.present & bit != 0
    }

    pub fn encode(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::PROBE_ABSENT;

    #[test]
    fn test_device_name_uses_last_mac_bytes() {
        assert_eq!(
            device_name([0x24, 0x6F, 0x28, 0x00, 0x1A, 0x2B]).as_str(),
            "PBIT-1A2B"
        );
    }

    #[test]
    fn test_missing_fields_encode_as_zero() {
        let reading = SensorReading {
            humidity: f32::NAN,
            temperature: 21.46,
            light: 350.0,
            sound: 42.0,
            soil: f32::NAN,
            probe: PROBE_ABSENT,
        };
        let payload = NotifyPayload::from_reading(&reading);

        assert_eq!(payload.temperature, 215);
        assert_eq!(payload.light, 3_500);
        assert!(payload.has(present::TEMPERATURE));
        assert!(payload.has(present::SOUND));
        assert_eq!(payload.humidity, 0);
        assert!(!payload.has(present::HUMIDITY));
        assert_eq!(payload.probe, 0);
        assert!(!payload.has(present::PROBE));
        assert!(!payload.has(present::SOIL));
    }

    #[test]
    fn test_large_values_saturate() {
        let mut reading = SensorReading::UNSPECIFIED;
        reading.light = 60_000.0;
        assert_eq!(NotifyPayload::from_reading(&reading).light, i16::MAX);
    }

    #[test]
    fn test_encoded_payload_is_compact() {
        let payload = NotifyPayload::from_reading(&SensorReading::UNSPECIFIED);
        assert_eq!(payload.encode().unwrap(), [0u8; 7]);
    }
}
