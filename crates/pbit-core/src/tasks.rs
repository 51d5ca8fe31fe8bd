//! Task bodies shared by the firmware and the simulator.
//!
//! The platform spawns one task per loop below and hands each the same
//! [`SharedState`]. Input reaches the control loop through an
//! [`InputChannel`] filled by the platform's encoder/button poller.

use core::fmt::Debug;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::Timer;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::info;

use crate::app_state::SharedState;
use crate::config::PbitConfig;
use crate::display::{DisplayScheduler, SharedDisplay};
use crate::hal::{Clock, InputHal, PowerHal};
use crate::input::{InputEvent, InputRouter, RouteOutcome};
use crate::power::PowerManager;
use crate::prefs::PreferenceStore;
use crate::sampler::{SensorSampler, SensorSource};
use crate::wireless::WirelessPublisher;

/// Input events buffered between the poller and the control loop
pub const INPUT_QUEUE_DEPTH: usize = 8;

pub type InputChannel = Channel<CriticalSectionRawMutex, InputEvent, INPUT_QUEUE_DEPTH>;
pub type InputSender<'a> = Sender<'a, CriticalSectionRawMutex, InputEvent, INPUT_QUEUE_DEPTH>;
pub type InputReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, InputEvent, INPUT_QUEUE_DEPTH>;

/// Main loop: route any pending input, then evaluate the power policy.
///
/// Waits at most one poll period for input so idle thresholds are checked
/// on time. Returns only after a factory reset on a platform whose
/// `restart` comes back.
pub async fn control_loop<D, P, H, C>(
    config: &PbitConfig,
    state: &SharedState,
    display: &SharedDisplay<D>,
    input: InputReceiver<'_>,
    prefs: &mut P,
    hal: &mut H,
    clock: &C,
) where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
    P: PreferenceStore,
    H: PowerHal + InputHal,
    C: Clock,
{
    info!(" Control loop started");

    let mut router = InputRouter::new(config.input);
    let mut power = PowerManager::new(config.power);

    loop {
        let poll = Timer::after(config.power.poll_period());
        if let Either::First(event) = select(input.receive(), poll).await {
            let outcome = router
                .handle(event, clock.now(), state, display, prefs, hal)
                .await;
            if outcome == RouteOutcome::Restarting {
                return;
            }
        }

        power.poll(clock.now(), state, display, hal).await;
    }
}

pub async fn display_loop<D, C>(
    config: &PbitConfig,
    device_name: &str,
    state: &SharedState,
    display: &SharedDisplay<D>,
    clock: &C,
) where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
    C: Clock,
{
    let mut scheduler = DisplayScheduler::new(&config.display, device_name);
    scheduler
        .run(state, display, clock, config.display.tick_period())
        .await;
}

pub async fn sampler_loop<S, W, C>(
    config: &PbitConfig,
    state: &SharedState,
    source: &mut S,
    publisher: &mut W,
    clock: &C,
) where
    S: SensorSource,
    W: WirelessPublisher,
    C: Clock,
{
    let mut sampler = SensorSampler::new(config.sampler);
    sampler.run(state, source, publisher, clock).await;
}
