//! Tuning knobs for power management, sampling, display and input.
//!
//! The idle thresholds and the connection gating policy differ between
//! product revisions, so they are data rather than constants. Call
//! [`PbitConfig::validate`] once at startup before handing the config to
//! the tasks.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("warning threshold ({warn_ms} ms) must be below light sleep ({light_ms} ms)")]
    WarnNotBeforeLightSleep { warn_ms: u32, light_ms: u32 },
    #[error("light sleep threshold ({light_ms} ms) must be below deep sleep ({deep_ms} ms)")]
    LightSleepNotBeforeDeepSleep { light_ms: u32, deep_ms: u32 },
    #[error("overlay lead ({lead_ms} ms) exceeds the warning window ({window_ms} ms)")]
    OverlayLeadTooLong { lead_ms: u32, window_ms: u32 },
    #[error("{0} must be non-zero")]
    ZeroPeriod(&'static str),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerConfig {
    /// Idle time before the attention sequence plays
    pub warn_after_ms: u32,
    /// Idle time before the display and indicator are blanked
    pub light_sleep_after_ms: u32,
    /// Idle time before the CPU is powered down
    pub deep_sleep_after_ms: u32,
    /// How long before light sleep the "going to sleep" overlay appears
    pub overlay_lead_ms: u32,
    /// Longest single light-sleep call; the loop re-evaluates afterwards
    pub light_sleep_slice_ms: u32,
    /// Main loop period between power evaluations
    pub poll_period_ms: u32,
    /// Number of indicator flashes in the attention sequence
    pub attention_flashes: u8,
    /// Whether a connected peer also blocks light sleep (deep sleep is
    /// always blocked while connected)
    pub gate_light_sleep_on_connection: bool,
}

impl PowerConfig {
    pub fn warn_after(&self) -> Duration {
        Duration::from_millis(self.warn_after_ms as u64)
    }

    pub fn light_sleep_after(&self) -> Duration {
        Duration::from_millis(self.light_sleep_after_ms as u64)
    }

    pub fn deep_sleep_after(&self) -> Duration {
        Duration::from_millis(self.deep_sleep_after_ms as u64)
    }

    /// Idle time at which the sleep overlay is raised.
    pub fn overlay_after(&self) -> Duration {
        Duration::from_millis(
            self.light_sleep_after_ms
                .saturating_sub(self.overlay_lead_ms)
                .max(self.warn_after_ms) as u64,
        )
    }

    pub fn light_sleep_slice(&self) -> Duration {
        Duration::from_millis(self.light_sleep_slice_ms as u64)
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms as u64)
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            warn_after_ms: 50_000,
            light_sleep_after_ms: 60_000,
            deep_sleep_after_ms: 300_000,
            overlay_lead_ms: 2_000,
            light_sleep_slice_ms: 1_000,
            poll_period_ms: 50,
            attention_flashes: 3,
            gate_light_sleep_on_connection: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Period of the light/sound/soil cycle
    pub fast_period_ms: u32,
    /// Period of the temperature/humidity/probe reads
    pub slow_period_ms: u32,
}

impl SamplerConfig {
    pub fn fast_period(&self) -> Duration {
        Duration::from_millis(self.fast_period_ms as u64)
    }

    pub fn slow_period(&self) -> Duration {
        Duration::from_millis(self.slow_period_ms as u64)
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            fast_period_ms: 100,
            slow_period_ms: 1_000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Scheduler tick period
    pub tick_period_ms: u32,
    /// Minimum interval between stopwatch refreshes on the Timer screen
    pub timer_refresh_ms: u32,
    /// How long the boot splash stays up on a cold boot
    pub splash_ms: u32,
}

impl DisplayConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms as u64)
    }

    pub fn timer_refresh(&self) -> Duration {
        Duration::from_millis(self.timer_refresh_ms as u64)
    }

    pub fn splash(&self) -> Duration {
        Duration::from_millis(self.splash_ms as u64)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 20,
            timer_refresh_ms: 10,
            splash_ms: 2_500,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConfig {
    /// Press duration that counts as a long press
    pub long_press_ms: u32,
    /// Button contact debounce window
    pub debounce_ms: u32,
    /// How long the factory reset message stays up before restarting
    pub reset_hold_ms: u32,
}

impl InputConfig {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms as u64)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms as u64)
    }

    pub fn reset_hold(&self) -> Duration {
        Duration::from_millis(self.reset_hold_ms as u64)
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 2_000,
            debounce_ms: 30,
            reset_hold_ms: 1_500,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PbitConfig {
    pub power: PowerConfig,
    pub sampler: SamplerConfig,
    pub display: DisplayConfig,
    pub input: InputConfig,
}

impl PbitConfig {
    /// Short idle thresholds so every power state is reachable within a
    /// minute on the desktop simulator.
    pub fn simulator() -> Self {
        Self {
            power: PowerConfig {
                warn_after_ms: 8_000,
                light_sleep_after_ms: 12_000,
                deep_sleep_after_ms: 30_000,
                light_sleep_slice_ms: 250,
                ..PowerConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let power = &self.power;

        if power.warn_after_ms >= power.light_sleep_after_ms {
            return Err(ConfigError::WarnNotBeforeLightSleep {
                warn_ms: power.warn_after_ms,
                light_ms: power.light_sleep_after_ms,
            });
        }
        if power.light_sleep_after_ms >= power.deep_sleep_after_ms {
            return Err(ConfigError::LightSleepNotBeforeDeepSleep {
                light_ms: power.light_sleep_after_ms,
                deep_ms: power.deep_sleep_after_ms,
            });
        }

        let window_ms = power.light_sleep_after_ms - power.warn_after_ms;
        if power.overlay_lead_ms > window_ms {
            return Err(ConfigError::OverlayLeadTooLong {
                lead_ms: power.overlay_lead_ms,
                window_ms,
            });
        }

        let periods = [
            ("power.light_sleep_slice_ms", power.light_sleep_slice_ms),
            ("power.poll_period_ms", power.poll_period_ms),
            ("sampler.fast_period_ms", self.sampler.fast_period_ms),
            ("sampler.slow_period_ms", self.sampler.slow_period_ms),
            ("display.tick_period_ms", self.display.tick_period_ms),
            ("display.timer_refresh_ms", self.display.timer_refresh_ms),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(ConfigError::ZeroPeriod(name));
            }
        }

        Ok(())
    }
}
