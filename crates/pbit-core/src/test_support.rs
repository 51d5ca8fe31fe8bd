//! Test doubles shared by the unit tests in this crate.

use alloc::vec::Vec;

use embassy_time::{Duration, Instant};
use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::display::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::hal::{
    Feedback, InputHal, LightSleepWake, PowerHal, SleepExit, Tone, WakeArmError, WakeSource,
};
use crate::reading::SensorReading;
use crate::sampler::{AmbientReading, FastReading, SensorError, SensorSource};
use crate::wireless::WirelessPublisher;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HalEvent {
    Indicator(Rgb888),
    Beep(Tone),
    Pause(Duration),
    ArmWake,
    LightSleep,
    DeepSleep,
    Restart,
}

/// Records every hardware call in order.
pub struct MockHal {
    pub events: Vec<HalEvent>,
    pub light_exit: LightSleepWake,
    pub exit_at: Instant,
    pub fail_arm: bool,
}

impl MockHal {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            light_exit: LightSleepWake::Timer,
            exit_at: Instant::from_millis(0),
            fail_arm: false,
        }
    }

    pub fn count(&self, event: &HalEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn position(&self, event: &HalEvent) -> Option<usize> {
        self.events.iter().position(|e| e == event)
    }

    pub fn beeps(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, HalEvent::Beep(_)))
            .count()
    }

    pub fn last_indicator(&self) -> Option<Rgb888> {
        self.events.iter().rev().find_map(|e| match e {
            HalEvent::Indicator(color) => Some(*color),
            _ => None,
        })
    }
}

impl Feedback for MockHal {
    fn set_indicator(&mut self, color: Rgb888) {
        self.events.push(HalEvent::Indicator(color));
    }

    async fn beep(&mut self, tone: Tone) {
        self.events.push(HalEvent::Beep(tone));
    }

    async fn pause(&mut self, duration: Duration) {
        self.events.push(HalEvent::Pause(duration));
    }
}

impl PowerHal for MockHal {
    fn arm_wake(&mut self, source: WakeSource) -> Result<(), WakeArmError> {
        if self.fail_arm {
            return Err(WakeArmError::Unsupported(source));
        }
        self.events.push(HalEvent::ArmWake);
        Ok(())
    }

    async fn enter_light_sleep(&mut self, _source: WakeSource, _max: Duration) -> SleepExit {
        self.events.push(HalEvent::LightSleep);
        SleepExit {
            cause: self.light_exit,
            at: self.exit_at,
        }
    }

    fn enter_deep_sleep(&mut self, _source: WakeSource) {
        self.events.push(HalEvent::DeepSleep);
    }
}

impl InputHal for MockHal {
    fn restart(&mut self) {
        self.events.push(HalEvent::Restart);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawFailed;

/// Counts drawing work instead of storing pixels.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    /// Calls to `clear`
    pub clears: usize,
    /// Pixels written through `draw_iter` or `fill_solid`
    pub pixels: usize,
    /// Make every draw call fail
    pub fail: bool,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pixel and clear counters, reset after reading.
    pub fn take_work(&mut self) -> (usize, usize) {
        let work = (self.clears, self.pixels);
        self.clears = 0;
        self.pixels = 0;
        work
    }
}

impl OriginDimensions for RecordingTarget {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

impl DrawTarget for RecordingTarget {
    type Color = Rgb565;
    type Error = DrawFailed;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        if self.fail {
            return Err(DrawFailed);
        }
        self.pixels += pixels.into_iter().count();
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, _color: Self::Color) -> Result<(), Self::Error> {
        if self.fail {
            return Err(DrawFailed);
        }
        self.pixels += area.size.width as usize * area.size.height as usize;
        Ok(())
    }

    fn clear(&mut self, _color: Self::Color) -> Result<(), Self::Error> {
        if self.fail {
            return Err(DrawFailed);
        }
        self.clears += 1;
        Ok(())
    }
}

/// Sensors that return whatever the test put in the fields.
pub struct ScriptedSource {
    pub fast: Result<FastReading, SensorError>,
    pub ambient: Result<AmbientReading, SensorError>,
    pub probe: Result<f32, SensorError>,
    pub fast_reads: usize,
    pub ambient_reads: usize,
    pub probe_reads: usize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            fast: Ok(FastReading {
                light: 120.0,
                sound: 40.0,
                soil: 35.0,
            }),
            ambient: Ok(AmbientReading {
                temperature: 22.5,
                humidity: 48.0,
            }),
            probe: Err(SensorError::Disconnected),
            fast_reads: 0,
            ambient_reads: 0,
            probe_reads: 0,
        }
    }
}

impl SensorSource for ScriptedSource {
    async fn read_fast(&mut self) -> Result<FastReading, SensorError> {
        self.fast_reads += 1;
        self.fast
    }

    async fn read_ambient(&mut self) -> Result<AmbientReading, SensorError> {
        self.ambient_reads += 1;
        self.ambient
    }

    async fn read_probe(&mut self) -> Result<f32, SensorError> {
        self.probe_reads += 1;
        self.probe
    }
}

/// Publisher that keeps every reading it was handed.
pub struct RecordingPublisher {
    pub published: Vec<SensorReading>,
    pub connected: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            published: Vec::new(),
            connected: false,
        }
    }
}

impl WirelessPublisher for RecordingPublisher {
    async fn publish(&mut self, reading: &SensorReading) {
        self.published.push(*reading);
    }

    fn is_peer_connected(&self) -> bool {
        self.connected
    }
}
