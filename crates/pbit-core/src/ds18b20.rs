//! DS18B20 protocol pieces that never touch the bus: command bytes, the
//! Dallas/Maxim CRC and scratchpad decoding. The firmware drives the 1-Wire
//! line and hands the nine scratchpad bytes to [`decode_scratchpad`].

use crate::sampler::SensorError;

const SENSOR: &str = "DS18B20";

pub const SKIP_ROM: u8 = 0xCC;
pub const CONVERT_T: u8 = 0x44;
pub const READ_SCRATCHPAD: u8 = 0xBE;

pub const SCRATCHPAD_LEN: usize = 9;

/// Worst-case conversion time at 12-bit resolution
pub const CONVERSION_MS: u64 = 750;

/// CRC-8 with the reflected 0x31 polynomial used on 1-Wire.
///
/// Running it over data followed by its own CRC yields zero.
pub fn crc8(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |mut crc, byte| {
        let mut byte = *byte;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            byte >>= 1;
        }
        crc
    })
}

/// Temperature in °C from a scratchpad read.
pub fn decode_scratchpad(scratchpad: &[u8; SCRATCHPAD_LEN]) -> Result<f32, SensorError> {
    // Nobody drove the line during the read slots
    if scratchpad.iter().all(|byte| *byte == 0xFF) {
        return Err(SensorError::Disconnected);
    }
    // An all-zero frame passes the CRC
    if scratchpad.iter().all(|byte| *byte == 0x00) {
        return Err(SensorError::ReadFailed {
            sensor: SENSOR,
            details: "bus held low",
        });
    }
    if crc8(&scratchpad[..SCRATCHPAD_LEN - 1]) != scratchpad[SCRATCHPAD_LEN - 1] {
        return Err(SensorError::ReadFailed {
            sensor: SENSOR,
            details: "scratchpad CRC mismatch",
        });
    }

    // Bits below the configured resolution are undefined
    let resolution = (scratchpad[4] >> 5) & 0x03;
    let mask = !((1i16 << (3 - resolution)) - 1);
    let raw = i16::from_le_bytes([scratchpad[0], scratchpad[1]]) & mask;

    Ok(raw as f32 / 16.0)
}
