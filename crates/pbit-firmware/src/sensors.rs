//! On-board analog sensors, the DHT11 and the DS18B20 on the J4 port,
//! behind the core's [`SensorSource`].

use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcConfig, AdcPin, Attenuation};
use esp_hal::peripherals::{ADC1, GPIO35, GPIO36, GPIO39};
use log::debug;
use pbit_core::sampler::{AmbientReading, FastReading, SensorError, SensorSource};

use crate::dht11::Dht11;
use crate::onewire::Ds18b20;

// ----------------------------------------------------------------------------
// Conversions
// ----------------------------------------------------------------------------

const ADC_FULL_SCALE: f32 = 4095.0;
const ADC_VREF: f32 = 3.3;

/// Fixed resistor below the LDR in the light divider
const LDR_FIXED_OHMS: f32 = 10_000.0;
const LUX_MAX: f32 = 20_000.0;

/// Soil probe raw readings in dry air and in water
const SOIL_DRY_RAW: f32 = 2_800.0;
const SOIL_WET_RAW: f32 = 1_200.0;

/// Microphone envelope mapped onto a 30..100 dB scale
const SOUND_FLOOR_DB: f32 = 30.0;
const SOUND_SPAN_DB: f32 = 70.0;

const LIGHT_SAMPLES: usize = 8;
const SOIL_SAMPLES: usize = 8;
const SOUND_SAMPLES: usize = 64;

/// Lux estimate from the LDR divider voltage.
pub fn lux_from_raw(raw: u16) -> f32 {
    let volts = raw as f32 / ADC_FULL_SCALE * ADC_VREF;
    if volts <= 0.0 {
        return 0.0;
    }
    if volts >= ADC_VREF {
        return LUX_MAX;
    }
    let ldr_ohms = LDR_FIXED_OHMS * volts / (ADC_VREF - volts);
    (1_000_000.0 / ldr_ohms).clamp(0.0, LUX_MAX)
}

/// Soil moisture percentage, 0 in air and 100 in water.
pub fn soil_from_raw(raw: u16) -> f32 {
    let percent = (SOIL_DRY_RAW - raw as f32) / (SOIL_DRY_RAW - SOIL_WET_RAW) * 100.0;
    percent.clamp(0.0, 100.0)
}

/// Sound level from the peak-to-peak span of a burst of samples.
pub fn sound_from_span(span: u16) -> f32 {
    SOUND_FLOOR_DB + SOUND_SPAN_DB * (span as f32 / ADC_FULL_SCALE).clamp(0.0, 1.0)
}

// ----------------------------------------------------------------------------
// Board sensors
// ----------------------------------------------------------------------------

pub struct BoardSensors {
    adc: Adc<'static, ADC1<'static>, Blocking>,
    ldr: AdcPin<GPIO39<'static>, ADC1<'static>>,
    mic: AdcPin<GPIO36<'static>, ADC1<'static>>,
    soil: AdcPin<GPIO35<'static>, ADC1<'static>>,
    dht: Dht11,
    external: Ds18b20,
}

impl BoardSensors {
    pub fn new(
        adc1: ADC1<'static>,
        ldr: GPIO39<'static>,
        mic: GPIO36<'static>,
        soil: GPIO35<'static>,
        dht: Dht11,
        external: Ds18b20,
    ) -> Self {
        let mut config = AdcConfig::new();
        let ldr = config.enable_pin(ldr, Attenuation::_11dB);
        let mic = config.enable_pin(mic, Attenuation::_11dB);
        let soil = config.enable_pin(soil, Attenuation::_11dB);
        let adc = Adc::new(adc1, config);

        Self {
            adc,
            ldr,
            mic,
            soil,
            dht,
            external,
        }
    }

    fn read_average<P>(
        adc: &mut Adc<'static, ADC1<'static>, Blocking>,
        pin: &mut AdcPin<P, ADC1<'static>>,
        samples: usize,
    ) -> Result<u16, SensorError>
    where
        P: esp_hal::analog::adc::AdcChannel,
    {
        let mut sum = 0u32;
        for _ in 0..samples {
            sum += Self::read_once(adc, pin)? as u32;
        }
        Ok((sum / samples as u32) as u16)
    }

    fn read_once<P>(
        adc: &mut Adc<'static, ADC1<'static>, Blocking>,
        pin: &mut AdcPin<P, ADC1<'static>>,
    ) -> Result<u16, SensorError>
    where
        P: esp_hal::analog::adc::AdcChannel,
    {
        nb::block!(adc.read_oneshot(pin)).map_err(|_| SensorError::ReadFailed {
            sensor: "ADC1",
            details: "oneshot conversion failed",
        })
    }

    fn read_sound_span(&mut self) -> Result<u16, SensorError> {
        let mut low = u16::MAX;
        let mut high = 0;
        for _ in 0..SOUND_SAMPLES {
            let raw = Self::read_once(&mut self.adc, &mut self.mic)?;
            low = low.min(raw);
            high = high.max(raw);
        }
        Ok(high.saturating_sub(low))
    }
}

impl SensorSource for BoardSensors {
    async fn read_fast(&mut self) -> Result<FastReading, SensorError> {
        let light_raw = Self::read_average(&mut self.adc, &mut self.ldr, LIGHT_SAMPLES)?;
        let soil_raw = Self::read_average(&mut self.adc, &mut self.soil, SOIL_SAMPLES)?;
        let span = self.read_sound_span()?;
        debug!(
            " LDR raw {} | soil raw {} | mic span {}",
            light_raw, soil_raw, span
        );

        Ok(FastReading {
            light: lux_from_raw(light_raw),
            sound: sound_from_span(span),
            soil: soil_from_raw(soil_raw),
        })
    }

    async fn read_ambient(&mut self) -> Result<AmbientReading, SensorError> {
        self.dht.read().await
    }

    async fn read_probe(&mut self) -> Result<f32, SensorError> {
        self.external.read().await
    }
}
