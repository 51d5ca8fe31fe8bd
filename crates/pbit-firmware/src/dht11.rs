//! Bit-banged DHT11 temperature/humidity sensor on a single open-drain
//! line.

use embassy_time::Timer;
use esp_hal::gpio::{DriveMode, Flex, OutputConfig, Pull};
use esp_hal::time::Instant;
use pbit_core::sampler::{AmbientReading, SensorError};

const SENSOR: &str = "DHT11";

/// Host start pulse; the datasheet asks for at least 18 ms
const START_LOW_MS: u64 = 20;
/// Longest any single level lasts in a healthy frame
const LEVEL_TIMEOUT_US: u64 = 120;
/// High time separating a 0 bit (~27 us) from a 1 bit (~70 us)
const ONE_THRESHOLD_US: u64 = 45;

pub struct Dht11 {
    pin: Flex<'static>,
}

impl Dht11 {
    pub fn new(mut pin: Flex<'static>) -> Self {
        pin.apply_output_config(
            &OutputConfig::default()
                .with_drive_mode(DriveMode::OpenDrain)
                .with_pull(Pull::Up),
        );
        pin.set_input_enable(true);
        pin.set_high();
        pin.set_output_enable(true);
        Self { pin }
    }

    pub async fn read(&mut self) -> Result<AmbientReading, SensorError> {
        self.pin.set_low();
        Timer::after_millis(START_LOW_MS).await;

        // The frame is timing critical; no interrupts until it is in.
        let frame = critical_section::with(|_| {
            self.pin.set_high();
            self.read_frame()
        })?;

        decode(frame)
    }

    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        // Response: sensor pulls low ~80 us, then high ~80 us
        self.wait_while(true)?;
        self.wait_while(false)?;
        self.wait_while(true)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            self.wait_while(false)?;
            let high_us = self.wait_while(true)?;
            if high_us > ONE_THRESHOLD_US {
                frame[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
        Ok(frame)
    }

    /// Busy-wait while the line sits at `high`; returns how long it did.
    fn wait_while(&self, high: bool) -> Result<u64, SensorError> {
        let start = Instant::now();
        while self.pin.is_high() == high {
            if start.elapsed().as_micros() > LEVEL_TIMEOUT_US {
                return Err(SensorError::Timeout { sensor: SENSOR });
            }
        }
        Ok(start.elapsed().as_micros())
    }
}

fn decode(frame: [u8; 5]) -> Result<AmbientReading, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, byte| acc.wrapping_add(*byte));
    if sum != frame[4] {
        return Err(SensorError::ReadFailed {
            sensor: SENSOR,
            details: "checksum mismatch",
        });
    }

    let humidity = frame[0] as f32 + frame[1] as f32 / 10.0;
    let magnitude = frame[2] as f32 + (frame[3] & 0x7F) as f32 / 10.0;
    let temperature = if frame[3] & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    };

    Ok(AmbientReading {
        temperature,
        humidity,
    })
}
