//! Bit-banged 1-Wire bus and the DS18B20 plugged into the J4 port.
//!
//! Slot timings are the standard-speed values from Maxim AN126. Only the
//! sampling window of each slot runs with interrupts off; the long reset
//! pulse and the recovery gaps tolerate being stretched.

use embassy_time::Timer;
use embedded_hal::delay::DelayNs;
use esp_hal::delay::Delay;
use esp_hal::gpio::{DriveMode, Flex, OutputConfig, Pull};
use log::debug;
use pbit_core::ds18b20::{
    self, CONVERSION_MS, CONVERT_T, READ_SCRATCHPAD, SCRATCHPAD_LEN, SKIP_ROM,
};
use pbit_core::sampler::SensorError;
use thiserror_no_std::Error;

const RESET_LOW_US: u32 = 480;
const PRESENCE_SAMPLE_US: u32 = 70;
const PRESENCE_TAIL_US: u32 = 410;

const WRITE_ONE_LOW_US: u32 = 6;
const WRITE_ONE_HIGH_US: u32 = 64;
const WRITE_ZERO_LOW_US: u32 = 60;
const WRITE_ZERO_HIGH_US: u32 = 10;

const READ_LOW_US: u32 = 6;
const READ_SAMPLE_US: u32 = 9;
const READ_TAIL_US: u32 = 55;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneWireError {
    #[error("no device answered the reset pulse")]
    NoPresence,
    #[error("bus held low before reset")]
    BusShorted,
}

impl From<OneWireError> for SensorError {
    fn from(error: OneWireError) -> Self {
        match error {
            OneWireError::NoPresence => SensorError::Disconnected,
            OneWireError::BusShorted => SensorError::ReadFailed {
                sensor: "DS18B20",
                details: "1-Wire bus held low",
            },
        }
    }
}

pub struct OneWire<D> {
    pin: Flex<'static>,
    delay: D,
}

impl<D: DelayNs> OneWire<D> {
    pub fn new(mut pin: Flex<'static>, delay: D) -> Self {
        pin.apply_output_config(
            &OutputConfig::default()
                .with_drive_mode(DriveMode::OpenDrain)
                .with_pull(Pull::Up),
        );
        pin.set_input_enable(true);
        pin.set_high();
        pin.set_output_enable(true);
        Self { pin, delay }
    }

    /// Reset pulse followed by the presence check.
    pub fn reset(&mut self) -> Result<(), OneWireError> {
        if self.pin.is_low() {
            return Err(OneWireError::BusShorted);
        }

        self.pin.set_low();
        self.delay.delay_us(RESET_LOW_US);
        let present = critical_section::with(|_| {
            self.pin.set_high();
            self.delay.delay_us(PRESENCE_SAMPLE_US);
            self.pin.is_low()
        });
        self.delay.delay_us(PRESENCE_TAIL_US);

        if present {
            Ok(())
        } else {
            Err(OneWireError::NoPresence)
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        for bit in 0..8 {
            self.write_bit(byte & (1 << bit) != 0);
        }
    }

    pub fn read_byte(&mut self) -> u8 {
        (0..8).fold(0, |byte, bit| {
            if self.read_bit() {
                byte | (1 << bit)
            } else {
                byte
            }
        })
    }

    fn write_bit(&mut self, bit: bool) {
        let (low, high) = if bit {
            (WRITE_ONE_LOW_US, WRITE_ONE_HIGH_US)
        } else {
            (WRITE_ZERO_LOW_US, WRITE_ZERO_HIGH_US)
        };
        critical_section::with(|_| {
            self.pin.set_low();
            self.delay.delay_us(low);
            self.pin.set_high();
        });
        self.delay.delay_us(high);
    }

    fn read_bit(&mut self) -> bool {
        let bit = critical_section::with(|_| {
            self.pin.set_low();
            self.delay.delay_us(READ_LOW_US);
            self.pin.set_high();
            self.delay.delay_us(READ_SAMPLE_US);
            self.pin.is_high()
        });
        self.delay.delay_us(READ_TAIL_US);
        bit
    }
}

/// The single DS18B20 on the port, addressed with Skip ROM.
///
/// Conversions are pipelined: each read returns the result of the
/// conversion started by the previous one, so the sampler only waits the
/// full conversion time on the first read or after an error. This relies
/// on the slow sampling period being longer than [`CONVERSION_MS`].
pub struct Ds18b20 {
    bus: OneWire<Delay>,
    converting: bool,
}

impl Ds18b20 {
    pub fn new(pin: Flex<'static>) -> Self {
        Self {
            bus: OneWire::new(pin, Delay::new()),
            converting: false,
        }
    }

    pub async fn read(&mut self) -> Result<f32, SensorError> {
        if !self.converting {
            self.start_conversion()?;
            Timer::after_millis(CONVERSION_MS).await;
        }

        let reading = self.read_scratchpad();
        self.converting = self.start_conversion().is_ok();
        if let Err(e) = &reading {
            debug!(" DS18B20 read failed: {}", e);
        }
        reading
    }

    fn start_conversion(&mut self) -> Result<(), OneWireError> {
        self.bus.reset()?;
        self.bus.write_byte(SKIP_ROM);
        self.bus.write_byte(CONVERT_T);
        Ok(())
    }

    fn read_scratchpad(&mut self) -> Result<f32, SensorError> {
        self.bus.reset()?;
        self.bus.write_byte(SKIP_ROM);
        self.bus.write_byte(READ_SCRATCHPAD);

        let mut scratchpad = [0u8; SCRATCHPAD_LEN];
        for byte in scratchpad.iter_mut() {
            *byte = self.bus.read_byte();
        }
        ds18b20::decode_scratchpad(&scratchpad)
    }
}
