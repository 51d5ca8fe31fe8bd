//! Screen renderers, one per [`ScreenId`].
//!
//! Every renderer implements [`ScreenRenderer`]. The scheduler keeps one
//! instance per screen in a [`ScreenSet`] indexed by `ScreenId`, wrapped in
//! the [`Screen`] enum so dispatch needs no `dyn`.
//!
//! Renderers follow the same contract:
//! - `screen_changed`: the panel was just cleared; draw static chrome and
//!   all dynamic content, and forget the value cache
//! - `data_changed` (or `timer_tick_due` on the Timer screen): redraw only
//!   the dynamic region, and only if the value that would be shown differs
//!   from the cached one

mod boot;
mod gauge;
mod system;
mod thermometer;
mod timer;

use embassy_time::Duration;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use crate::app_state::StopwatchPhase;
use crate::i18n::Language;
use crate::reading::{Quantity, SensorReading};
use crate::screen::ScreenId;

pub use boot::BootScreen;
pub use gauge::{GaugeKind, GaugeScreen};
pub use system::SystemScreen;
pub use thermometer::ThermometerScreen;
pub use timer::{TimerScreen, format_elapsed};

/// What changed since the previous tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderPass {
    pub screen_changed: bool,
    pub data_changed: bool,
    pub timer_tick_due: bool,
}

impl RenderPass {
    pub fn is_empty(&self) -> bool {
        !(self.screen_changed || self.data_changed || self.timer_tick_due)
    }
}

/// Snapshot of everything a renderer may show, taken once per tick.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub reading: SensorReading,
    pub language: Language,
    pub fahrenheit: bool,
    pub sound_enabled: bool,
    pub peer_connected: bool,
    pub device_name: &'a str,
    pub stopwatch_phase: StopwatchPhase,
    pub stopwatch_elapsed: Duration,
}

pub trait ScreenRenderer {
    /// Draw according to `pass`. Returns whether anything was drawn.
    fn render<D>(
        &mut self,
        target: &mut D,
        ctx: &RenderContext<'_>,
        pass: RenderPass,
    ) -> Result<bool, D::Error>
    where
        D: DrawTarget<Color = Rgb565>;
}

pub enum Screen {
    Boot(BootScreen),
    Thermometer(ThermometerScreen),
    Gauge(GaugeScreen),
    System(SystemScreen),
    Timer(TimerScreen),
}

impl Screen {
    pub fn for_id(id: ScreenId) -> Self {
        match id {
            ScreenId::Boot => Screen::Boot(BootScreen::new()),
            ScreenId::Temperature => {
                Screen::Thermometer(ThermometerScreen::new(id, Quantity::Temperature))
            }
            ScreenId::ExternalProbe => Screen::Thermometer(ThermometerScreen::new(id, Quantity::Probe)),
            ScreenId::Humidity => Screen::Gauge(GaugeScreen::new(id, GaugeKind::Humidity)),
            ScreenId::Light => Screen::Gauge(GaugeScreen::new(id, GaugeKind::Light)),
            ScreenId::Sound => Screen::Gauge(GaugeScreen::new(id, GaugeKind::Sound)),
            ScreenId::Soil => Screen::Gauge(GaugeScreen::new(id, GaugeKind::Soil)),
            ScreenId::SystemInfo => Screen::System(SystemScreen::new()),
            ScreenId::Timer => Screen::Timer(TimerScreen::new()),
        }
    }
}

impl ScreenRenderer for Screen {
    fn render<D>(
        &mut self,
        target: &mut D,
        ctx: &RenderContext<'_>,
        pass: RenderPass,
    ) -> Result<bool, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        match self {
            Screen::Boot(screen) => screen.render(target, ctx, pass),
            Screen::Thermometer(screen) => screen.render(target, ctx, pass),
            Screen::Gauge(screen) => screen.render(target, ctx, pass),
            Screen::System(screen) => screen.render(target, ctx, pass),
            Screen::Timer(screen) => screen.render(target, ctx, pass),
        }
    }
}

/// One renderer per screen, indexed by [`ScreenId`].
pub struct ScreenSet {
    screens: [Screen; ScreenId::COUNT],
}

impl ScreenSet {
    pub fn new() -> Self {
        Self {
            screens: ScreenId::ALL.map(Screen::for_id),
        }
    }

    pub fn get_mut(&mut self, id: ScreenId) -> &mut Screen {
        &mut self.screens[id.index()]
    }
}

impl Default for ScreenSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_support::RecordingTarget;

    pub(crate) fn context(reading: SensorReading) -> RenderContext<'static> {
        RenderContext {
            reading,
            language: Language::English,
            fahrenheit: false,
            sound_enabled: true,
            peer_connected: false,
            device_name: "PBIT-1A2B",
            stopwatch_phase: StopwatchPhase::Ready,
            stopwatch_elapsed: Duration::from_millis(0),
        }
    }

    pub(crate) const FULL: RenderPass = RenderPass {
        screen_changed: true,
        data_changed: true,
        timer_tick_due: false,
    };

    pub(crate) const DATA: RenderPass = RenderPass {
        screen_changed: false,
        data_changed: true,
        timer_tick_due: false,
    };

    #[test]
    fn test_every_screen_draws_on_full_pass() {
        let mut set = ScreenSet::new();
        let ctx = context(SensorReading::default());
        for id in ScreenId::ALL {
            let mut target = RecordingTarget::new();
            let drew = set.get_mut(id).render(&mut target, &ctx, FULL).unwrap();
            assert!(drew, "{id:?}");
            assert!(target.pixels > 0, "{id:?}");
        }
    }

    #[test]
    fn test_empty_pass_draws_nothing() {
        let mut set = ScreenSet::new();
        let ctx = context(SensorReading::default());
        for id in ScreenId::ALL {
            let mut target = RecordingTarget::new();
            set.get_mut(id).render(&mut target, &ctx, FULL).unwrap();
            target.take_work();

            let drew = set
                .get_mut(id)
                .render(&mut target, &ctx, RenderPass::default())
                .unwrap();
            assert!(!drew, "{id:?}");
            assert_eq!(target.take_work(), (0, 0), "{id:?}");
        }
    }
}
