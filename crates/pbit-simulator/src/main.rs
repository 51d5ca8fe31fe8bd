//! Desktop simulator for the P-Bit sensor gadget.
//!
//! Runs pbit-core's input router, power manager, sensor sampler and display
//! scheduler in an SDL2 window via `embedded-graphics-simulator`. The
//! keyboard stands in for the rotary encoder and its push button, and the
//! sensors are synthetic. Idle thresholds come from
//! [`PbitConfig::simulator`], so the warning, light sleep and deep sleep
//! are all reachable within a minute.
//!
//! # Key bindings
//!
//! | Key           | Action                                   |
//! |---------------|------------------------------------------|
//! | Left / Right  | Turn the encoder one detent              |
//! | Space / Enter | Encoder button (hold for a long press)   |
//! | C             | Connect / disconnect the simulated peer  |
//! | P             | Plug / unplug the external probe         |
//! | Q / Esc       | Quit                                     |
//!
//! Deep sleep leaves the window black until a key is pressed, which reboots
//! the core as a button wake.

use std::time::{Duration as StdDuration, Instant as StdInstant};

use embassy_futures::block_on;
use embassy_time::{Duration, Instant};
use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{debug, error, info, warn};

use pbit_core::app_state::SharedState;
use pbit_core::boot;
use pbit_core::config::PbitConfig;
use pbit_core::display::{DISPLAY_HEIGHT, DISPLAY_WIDTH, DeviceName, DisplayScheduler, SharedDisplay};
use pbit_core::hal::{
    Feedback, InputHal, LightSleepWake, PowerHal, SleepExit, Tone, WakeArmError, WakeCause,
    WakeSource,
};
use pbit_core::input::{ButtonTracker, InputEvent, InputRouter, RotaryEncoder, RouteOutcome};
use pbit_core::power::PowerManager;
use pbit_core::prefs::MemoryPreferenceStore;
use pbit_core::reading::SensorReading;
use pbit_core::sampler::{AmbientReading, FastReading, SensorError, SensorSampler, SensorSource};
use pbit_core::screen::ScreenId;
use pbit_core::tasks::InputChannel;
use pbit_core::wireless::{NotifyPayload, WirelessPublisher, device_name};

// ---------------------------------------------------------------------------
// Window constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 3;

/// Target frame duration (50 FPS, fine enough for the stopwatch).
const FRAME_DURATION: StdDuration = StdDuration::from_millis(20);

/// Made-up Bluetooth MAC for the device name.
const SIMULATED_MAC: [u8; 6] = [0x24, 0x6F, 0x28, 0x5C, 0x1A, 0x2B];

/// Every n-th ambient read fails, to exercise value substitution.
const AMBIENT_FAILURE_EVERY: u32 = 23;

type Display = SimulatorDisplay<Rgb565>;

// ---------------------------------------------------------------------------
// Mock sensors and wireless link
// ---------------------------------------------------------------------------

/// Generates synthetic sensor readings that vary over time.
struct MockSensorGenerator {
    started: StdInstant,
    probe_connected: bool,
    ambient_reads: u32,
}

impl MockSensorGenerator {
    fn new() -> Self {
        Self {
            started: StdInstant::now(),
            probe_connected: true,
            ambient_reads: 0,
        }
    }

    fn t(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }
}

impl SensorSource for MockSensorGenerator {
    async fn read_fast(&mut self) -> Result<FastReading, SensorError> {
        let t = self.t();
        Ok(FastReading {
            // Slow day/night swing across every light category
            light: 1_100.0 + 1_000.0 * (t / 20.0).sin(),
            // Background hum with bursts
            sound: 45.0 + 25.0 * (t / 3.0).sin() * (t / 11.0).cos(),
            soil: 50.0 + 35.0 * (t / 40.0).sin(),
        })
    }

    async fn read_ambient(&mut self) -> Result<AmbientReading, SensorError> {
        self.ambient_reads += 1;
        if self.ambient_reads % AMBIENT_FAILURE_EVERY == 0 {
            return Err(SensorError::ReadFailed {
                sensor: "dht11",
                details: "checksum mismatch",
            });
        }

        let t = self.t();
        Ok(AmbientReading {
            temperature: 24.0 + 8.0 * (t / 30.0).sin(),
            humidity: 50.0 + 25.0 * (t / 45.0).cos(),
        })
    }

    async fn read_probe(&mut self) -> Result<f32, SensorError> {
        if !self.probe_connected {
            return Err(SensorError::Disconnected);
        }
        Ok(12.0 + 4.0 * (self.t() / 25.0).sin())
    }
}

/// Logs the encoded notification instead of sending it.
struct SimPublisher {
    connected: bool,
}

impl WirelessPublisher for SimPublisher {
    async fn publish(&mut self, reading: &SensorReading) {
        if !self.connected {
            return;
        }
        match NotifyPayload::from_reading(reading).encode() {
            Ok(bytes) => debug!("notify {:02X?}", bytes),
            Err(e) => warn!("Failed to encode notification: {}", e),
        }
    }

    fn is_peer_connected(&self) -> bool {
        self.connected
    }
}

// ---------------------------------------------------------------------------
// Platform services
// ---------------------------------------------------------------------------

/// Indicator and buzzer go to the log; sleep calls only set flags that the
/// main loop acts on.
struct SimHal {
    indicator: Rgb888,
    deep_sleep: bool,
    restart: bool,
}

impl SimHal {
    fn new() -> Self {
        Self {
            indicator: Rgb888::BLACK,
            deep_sleep: false,
            restart: false,
        }
    }
}

impl Feedback for SimHal {
    fn set_indicator(&mut self, color: Rgb888) {
        if color != self.indicator {
            debug!(
                "indicator rgb({}, {}, {})",
                color.r(),
                color.g(),
                color.b()
            );
            self.indicator = color;
        }
    }

    async fn beep(&mut self, tone: Tone) {
        debug!("beep {} Hz for {} ms", tone.frequency_hz, tone.duration_ms);
    }

    async fn pause(&mut self, duration: Duration) {
        std::thread::sleep(StdDuration::from_millis(duration.as_millis()));
    }
}

impl PowerHal for SimHal {
    fn arm_wake(&mut self, _source: WakeSource) -> Result<(), WakeArmError> {
        Ok(())
    }

    /// The window has to keep pumping events, so a slice of light sleep is
    /// just the rest of the frame.
    async fn enter_light_sleep(&mut self, _source: WakeSource, _max: Duration) -> SleepExit {
        SleepExit {
            cause: LightSleepWake::Timer,
            at: Instant::now(),
        }
    }

    fn enter_deep_sleep(&mut self, _source: WakeSource) {
        info!("Deep sleep, press any key to wake");
        self.deep_sleep = true;
    }
}

impl InputHal for SimHal {
    fn restart(&mut self) {
        self.restart = true;
    }
}

// ---------------------------------------------------------------------------
// One boot's worth of components
// ---------------------------------------------------------------------------

/// Everything that does not survive a restart.
struct Device {
    router: InputRouter,
    power: PowerManager,
    scheduler: DisplayScheduler,
    sampler: SensorSampler,
    encoder: RotaryEncoder,
    button: ButtonTracker,
    booted_at: Instant,
    next_sample: Instant,
}

impl Device {
    fn boot(
        cause: WakeCause,
        config: &PbitConfig,
        name: &DeviceName,
        state: &SharedState,
        prefs: &mut MemoryPreferenceStore,
    ) -> Self {
        let now = Instant::now();
        let first = boot::bootstrap(cause, prefs, state, now);
        if first == ScreenId::Boot {
            info!("Boot jingle ({} notes)", Tone::JINGLE.len());
        }

        let position = ScreenId::DEFAULT.selector().unwrap_or(0);
        Self {
            router: InputRouter::new(config.input),
            power: PowerManager::new(config.power),
            scheduler: DisplayScheduler::new(&config.display, name),
            sampler: SensorSampler::new(config.sampler),
            encoder: RotaryEncoder::new(ScreenId::SELECTABLE.len(), position),
            button: ButtonTracker::new(config.input.debounce(), false),
            booted_at: now,
            next_sample: now,
        }
    }

    /// Feed one keyboard detent through the quadrature decoder.
    fn turn(&mut self, clockwise: bool) -> Option<i32> {
        let sequence = if clockwise {
            [(true, false), (true, true), (false, true), (false, false)]
        } else {
            [(false, true), (true, true), (true, false), (false, false)]
        };
        sequence
            .into_iter()
            .fold(None, |moved, (a, b)| self.encoder.update(a, b).or(moved))
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();

    let config = PbitConfig::simulator();
    if let Err(e) = config.validate() {
        error!("Invalid simulator config: {}", e);
        return;
    }

    let name = device_name(SIMULATED_MAC);
    info!("Starting P-Bit simulator as {}", name);
    info!(
        "Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH, DISPLAY_HEIGHT, WINDOW_SCALE
    );
    info!("Keys: ←/→=Turn  Space=Button  C=Peer  P=Probe  Q=Quit");
    info!(
        "Idle thresholds: warn {} s, light sleep {} s, deep sleep {} s",
        config.power.warn_after_ms / 1_000,
        config.power.light_sleep_after_ms / 1_000,
        config.power.deep_sleep_after_ms / 1_000
    );

    let state = SharedState::new();
    let display: SharedDisplay<Display> =
        SharedDisplay::new(Display::new(Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)));
    let input = InputChannel::new();
    let mut prefs = MemoryPreferenceStore::new();
    let mut hal = SimHal::new();
    let mut sensors = MockSensorGenerator::new();
    let mut publisher = SimPublisher { connected: false };

    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("P-Bit Simulator", &output_settings);

    let mut device = Device::boot(WakeCause::ColdBoot, &config, &name, &state, &mut prefs);
    let mut button_held = false;

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    window.update(&*block_on(display.lock()));

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = StdInstant::now();
        let mut any_key = false;

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown {
                    keycode, repeat, ..
                } => {
                    if keycode == Keycode::Q || keycode == Keycode::Escape {
                        break 'running;
                    }
                    if repeat {
                        continue;
                    }
                    any_key = true;

                    if keycode == Keycode::Left || keycode == Keycode::Right {
                        if let Some(position) = device.turn(keycode == Keycode::Right) {
                            let _ = input.try_send(InputEvent::Rotated { position });
                        }
                    } else if keycode == Keycode::Space || keycode == Keycode::Return {
                        button_held = true;
                    } else if keycode == Keycode::C {
                        publisher.connected = !publisher.connected;
                        info!(
                            "Peer {}",
                            if publisher.connected { "connected" } else { "disconnected" }
                        );
                    } else if keycode == Keycode::P {
                        sensors.probe_connected = !sensors.probe_connected;
                        info!(
                            "Probe {}",
                            if sensors.probe_connected { "plugged in" } else { "unplugged" }
                        );
                    }
                }

                SimulatorEvent::KeyUp { keycode, .. } => {
                    if keycode == Keycode::Space || keycode == Keycode::Return {
                        button_held = false;
                    }
                }

                _ => {}
            }
        }

        // --- Deep sleep: nothing runs until a key wakes the chip ----------
        if hal.deep_sleep {
            if any_key {
                info!("Button wake from deep sleep");
                hal.deep_sleep = false;
                button_held = false;
                while input.try_receive().is_ok() {}
                device = Device::boot(WakeCause::ButtonWake, &config, &name, &state, &mut prefs);
                device.button = ButtonTracker::new(config.input.debounce(), true);
            }
            window.update(&*block_on(display.lock()));
            pace(frame_start);
            continue;
        }

        let now = Instant::now();

        // --- Input --------------------------------------------------------
        if let Some(event) = device.button.update(button_held, now) {
            let _ = input.try_send(event);
        }
        while let Ok(event) = input.try_receive() {
            let outcome = block_on(device.router.handle(
                event,
                Instant::now(),
                &state,
                &display,
                &mut prefs,
                &mut hal,
            ));
            if outcome == RouteOutcome::Restarting {
                break;
            }
        }

        if hal.restart {
            info!("Restarting");
            window.update(&*block_on(display.lock()));
            hal.restart = false;
            button_held = false;
            while input.try_receive().is_ok() {}
            device = Device::boot(WakeCause::ColdBoot, &config, &name, &state, &mut prefs);
            continue;
        }

        // Keep the dial in step with screens picked by the wake path.
        if let Some(selector) = state.active_screen().selector() {
            if selector != device.encoder.position() {
                device.encoder.set_position(selector);
            }
        }

        // --- Splash -------------------------------------------------------
        if state.active_screen() == ScreenId::Boot
            && now.duration_since(device.booted_at) >= config.display.splash()
        {
            boot::finish_splash(&state, now);
            hal.set_indicator(ScreenId::DEFAULT.indicator_color());
        }

        // --- Sensors ------------------------------------------------------
        if now >= device.next_sample {
            block_on(
                device
                    .sampler
                    .cycle(now, &state, &mut sensors, &mut publisher),
            );
            device.next_sample = now + config.sampler.fast_period();
        }

        // --- Power --------------------------------------------------------
        block_on(device.power.poll(Instant::now(), &state, &display, &mut hal));

        // --- Render -------------------------------------------------------
        {
            let mut target = block_on(display.lock());
            if let Err(e) = device.scheduler.tick(Instant::now(), &state, &mut *target) {
                error!("Draw error: {:?}", e);
            }
            window.update(&*target);
        }

        pace(frame_start);
    }

    info!("Simulator exiting");
}

/// Sleep out the rest of the frame.
fn pace(frame_start: StdInstant) {
    let elapsed = frame_start.elapsed();
    if elapsed < FRAME_DURATION {
        std::thread::sleep(FRAME_DURATION - elapsed);
    }
}
