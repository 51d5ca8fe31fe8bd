//! Display scheduler: decides when and how much of the panel to redraw.
//!
//! The scheduler owns one renderer per screen and runs a fixed-period tick.
//! Each tick it either stays frozen (pre-sleep overlay up, or peripherals
//! asleep), does nothing, or asks the active renderer to draw the parts
//! that changed:
//! - a screen switch or a requested full redraw clears the panel and
//!   redraws everything
//! - a fresh sensor reading redraws the dynamic region only
//! - the Timer screen also refreshes on its own cadence while visible
//!
//! The panel is shared with the power manager (sleep overlay, blanking) and
//! the input router (factory reset notice) through [`SharedDisplay`].

pub mod overlay;
pub mod screens;
pub mod widgets;

use core::fmt::Debug;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Instant, Timer};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use heapless::String;
use log::{debug, error, info};

use crate::app_state::SharedState;
use crate::config::DisplayConfig;
use crate::hal::Clock;
use crate::screen::ScreenId;
use screens::{RenderContext, RenderPass, ScreenRenderer, ScreenSet};

pub const DISPLAY_WIDTH: u32 = 160;
pub const DISPLAY_HEIGHT: u32 = 128;

/// The panel, shared between the scheduler, the power manager and the input
/// router.
pub type SharedDisplay<D> = Mutex<CriticalSectionRawMutex, D>;

pub type DeviceName = String<16>;

/// Result of one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Drawing is suspended; no flag was consumed
    Frozen,
    /// Nothing changed since the last tick
    Idle,
    /// The active renderer ran. `full` means the panel was cleared first.
    Drawn { full: bool },
}

pub struct DisplayScheduler {
    screens: ScreenSet,
    last_drawn: Option<ScreenId>,
    last_timer_refresh: Option<Instant>,
    timer_refresh: Duration,
    device_name: DeviceName,
}

impl DisplayScheduler {
    pub fn new(config: &DisplayConfig, device_name: &str) -> Self {
        let mut name = DeviceName::new();
        for c in device_name.chars() {
            if name.push(c).is_err() {
                break;
            }
        }

        Self {
            screens: ScreenSet::new(),
            last_drawn: None,
            last_timer_refresh: None,
            timer_refresh: config.timer_refresh(),
            device_name: name,
        }
    }

    /// Screen shown by the last successful tick.
    pub fn last_drawn(&self) -> Option<ScreenId> {
        self.last_drawn
    }

    /// Run one scheduling step at `now`.
    pub fn tick<D>(
        &mut self,
        now: Instant,
        state: &SharedState,
        target: &mut D,
    ) -> Result<TickOutcome, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        // Leave both handoff flags alone so the first tick after waking sees them.
        if state.power.warning_active() || state.power.peripherals_sleeping() {
            return Ok(TickOutcome::Frozen);
        }

        let active = state.active_screen();
        let full_redraw = state.take_full_redraw();
        let pass = RenderPass {
            screen_changed: full_redraw || self.last_drawn != Some(active),
            data_changed: state.take_data_ready(),
            timer_tick_due: active == ScreenId::Timer && self.timer_refresh_due(now),
        };

        if pass.timer_tick_due {
            self.last_timer_refresh = Some(now);
        }
        if pass.is_empty() {
            return Ok(TickOutcome::Idle);
        }

        if pass.screen_changed {
            debug!(" Full redraw of {:?}", active);
        }

        match self.draw(now, state, active, pass, target) {
            Ok(()) => {
                self.last_drawn = Some(active);
                Ok(TickOutcome::Drawn {
                    full: pass.screen_changed,
                })
            }
            Err(e) => {
                // Whatever is on the panel now is unknown; start over next tick.
                self.last_drawn = None;
                Err(e)
            }
        }
    }

    fn timer_refresh_due(&self, now: Instant) -> bool {
        self.last_timer_refresh.is_none_or(|last| {
            now.checked_duration_since(last)
                .is_none_or(|since| since >= self.timer_refresh)
        })
    }

    fn draw<D>(
        &mut self,
        now: Instant,
        state: &SharedState,
        active: ScreenId,
        pass: RenderPass,
        target: &mut D,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if pass.screen_changed {
            target.clear(widgets::BACKGROUND)?;
        }

        let ctx = RenderContext {
            reading: state.reading(),
            language: state.language(),
            fahrenheit: state.is_fahrenheit(),
            sound_enabled: state.is_sound_enabled(),
            peer_connected: state.is_peer_connected(),
            device_name: &self.device_name,
            stopwatch_phase: state.stopwatch.phase(),
            stopwatch_elapsed: state.stopwatch.elapsed(now),
        };

        self.screens.get_mut(active).render(target, &ctx, pass)?;
        Ok(())
    }

    /// Run the scheduler task forever, locking the panel for each tick.
    pub async fn run<D, C>(
        &mut self,
        state: &SharedState,
        display: &SharedDisplay<D>,
        clock: &C,
        tick_period: Duration,
    ) where
        D: DrawTarget<Color = Rgb565>,
        D::Error: Debug,
        C: Clock,
    {
        info!(" Display scheduler task started");

        loop {
            {
                let mut target = display.lock().await;
                if let Err(e) = self.tick(clock.now(), state, &mut *target) {
                    error!(" Display render error: {:?}", e);
                }
            }
            Timer::after(tick_period).await;
        }
    }
}
