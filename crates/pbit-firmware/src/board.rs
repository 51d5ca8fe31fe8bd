//! Board wiring and the [`BoardHal`] implementation of the core's platform
//! traits.
//!
//! Pin map of the P-Bit board:
//!
//! | Signal              | GPIO |
//! |---------------------|------|
//! | TFT SCK / MOSI      | 25 / 19 |
//! | TFT CS / DC / RST   | 23 / 22 / 21 |
//! | Encoder A / B       | 14 / 12 |
//! | Encoder push button | 13 (RTC capable, wakes the chip) |
//! | RGB LED R / G / B   | 5 / 17 / 16 (active low) |
//! | Buzzer              | 18 |
//! | DHT11               | 4 |
//! | DS18B20 (J4 1-Wire) | 33 |
//! | LDR / MIC / Soil    | 39 / 36 / 35 (ADC1) |

use embassy_time::{Duration, Instant, Timer};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use esp_hal::gpio::{Level, Output, RtcPinWithResistors};
use esp_hal::peripherals::GPIO13;
use esp_hal::rtc_cntl::sleep::{Ext0WakeupSource, TimerWakeupSource, WakeupLevel};
use esp_hal::rtc_cntl::{Rtc, wakeup_cause};
use esp_hal::system::SleepSource;
use log::{debug, info};
use pbit_core::hal::{
    Clock, Feedback, InputHal, LightSleepWake, PowerHal, SleepExit, Tone, WakeArmError, WakeSource,
};

use crate::clock::SleepClock;
use crate::controls;

pub const DISPLAY_WIDTH: u16 = 128;
pub const DISPLAY_HEIGHT: u16 = 160;

/// Channel threshold for the on/off RGB LED
const CHANNEL_ON: u8 = 128;

/// The wake line, taken over from the encoder poller for each sleep.
///
/// The poller keeps reading the same pin as a digital input; the RTC
/// multiplexer only drives it while the chip sleeps.
fn wake_pin() -> GPIO13<'static> {
    // SAFETY: GPIO13 is only ever read, by the poller and by the RTC
    // wake logic, and neither changes its direction.
    let pin = unsafe { GPIO13::steal() };
    pin.rtcio_pullup(true);
    pin.rtcio_pulldown(false);
    pin
}

pub struct BoardHal {
    red: Output<'static>,
    green: Output<'static>,
    blue: Output<'static>,
    buzzer: Output<'static>,
    rtc: Rtc<'static>,
    clock: &'static SleepClock,
}

impl BoardHal {
    pub fn new(
        red: Output<'static>,
        green: Output<'static>,
        blue: Output<'static>,
        buzzer: Output<'static>,
        rtc: Rtc<'static>,
        clock: &'static SleepClock,
    ) -> Self {
        Self {
            red,
            green,
            blue,
            buzzer,
            rtc,
            clock,
        }
    }
}

/// Active-low LED: driving the pin low lights the channel.
fn channel_level(value: u8) -> Level {
    if value >= CHANNEL_ON {
        Level::Low
    } else {
        Level::High
    }
}

impl Feedback for BoardHal {
    fn set_indicator(&mut self, color: Rgb888) {
        self.red.set_level(channel_level(color.r()));
        self.green.set_level(channel_level(color.g()));
        self.blue.set_level(channel_level(color.b()));
    }

    async fn beep(&mut self, tone: Tone) {
        if tone.frequency_hz == 0 {
            Timer::after(tone.duration()).await;
            return;
        }

        let half_period = Duration::from_micros(500_000 / tone.frequency_hz as u64);
        let end = Instant::now() + tone.duration();
        while Instant::now() < end {
            self.buzzer.toggle();
            Timer::after(half_period).await;
        }
        self.buzzer.set_low();
    }

    async fn pause(&mut self, duration: Duration) {
        Timer::after(duration).await;
    }
}

impl PowerHal for BoardHal {
    fn arm_wake(&mut self, source: WakeSource) -> Result<(), WakeArmError> {
        // Ext0 is level triggered; arming while the button is held would
        // wake the chip immediately.
        if controls::button_held() {
            return Err(WakeArmError::AlreadyAsserted(source));
        }
        Ok(())
    }

    async fn enter_light_sleep(&mut self, _source: WakeSource, max: Duration) -> SleepExit {
        let timer = TimerWakeupSource::new(core::time::Duration::from_micros(max.as_micros()));
        let ext0 = Ext0WakeupSource::new(wake_pin(), WakeupLevel::Low);

        let rtc_before = self.rtc.current_time_us();
        let ticks_before = Instant::now();
        self.rtc.sleep_light(&[&timer, &ext0]);
        let slept_us = self.rtc.current_time_us().saturating_sub(rtc_before);
        let counted_us = ticks_before.elapsed().as_micros();
        self.clock.add_missed(slept_us.saturating_sub(counted_us));

        let cause = match wakeup_cause() {
            SleepSource::Ext0 => LightSleepWake::Button,
            _ => LightSleepWake::Timer,
        };
        debug!(" Light sleep ended after {} us: {:?}", slept_us, cause);

        SleepExit {
            cause,
            at: self.clock.now(),
        }
    }

    fn enter_deep_sleep(&mut self, _source: WakeSource) {
        info!(" Deep sleep until the button is pressed");
        let ext0 = Ext0WakeupSource::new(wake_pin(), WakeupLevel::Low);
        self.rtc.sleep_deep(&[&ext0]);
    }
}

impl InputHal for BoardHal {
    fn restart(&mut self) {
        esp_hal::system::software_reset();
    }
}
