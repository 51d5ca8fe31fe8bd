//! ESP32 board support for the P-Bit sensor gadget
//!
//! This crate contains the code that only builds for the ESP32: the RGB
//! indicator and buzzer, RTC light/deep sleep, the ADC, DHT11 and DS18B20
//! sensors, encoder polling, the BLE link and preferences kept in RTC
//! memory. Scheduling decisions all live in `pbit_core`; the types here
//! implement its platform traits.

#![no_std]

extern crate alloc;

pub mod board;
pub mod clock;
pub mod controls;
pub mod dht11;
pub mod onewire;
pub mod prefs;
pub mod sensors;
pub mod wireless;
