//! Hardware-independent core library for the P-Bit sensor gadget
//!
//! This crate holds everything that decides *when* things happen on the
//! device: the shared state contract between tasks, the power manager with
//! its pre-sleep warning and wake path, the display scheduler and its screen
//! renderers, the input router, and the sensor sampler.
//!
//! Hardware is reached only through the traits in [`hal`], [`sampler`],
//! [`wireless`] and [`prefs`], so the crate is `#![no_std]` with
//! `extern crate alloc` and compiles for the ESP32 firmware, the desktop
//! simulator and host tests alike.

#![no_std]

extern crate alloc;

pub mod app_state;
pub mod boot;
pub mod config;
pub mod display;
pub mod ds18b20;
pub mod hal;
pub mod i18n;
pub mod input;
pub mod power;
pub mod prefs;
pub mod reading;
pub mod sampler;
pub mod screen;
pub mod tasks;
pub mod wireless;

#[cfg(test)]
mod test_support;
