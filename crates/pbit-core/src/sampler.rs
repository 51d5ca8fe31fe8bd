//! Sensor sampler: reads the board sensors on two cadences and publishes
//! the merged snapshot.
//!
//! Light, sound and soil are cheap and read every fast cycle. Temperature,
//! humidity and the external probe are slow or need settling time, so they
//! are read at most once per slow period. A failed read keeps the previous
//! value; a disconnected probe is reported as [`PROBE_ABSENT`].

use core::future::Future;

use embassy_time::{Instant, Timer};
use log::{debug, info, warn};
use thiserror_no_std::Error;

use crate::app_state::SharedState;
use crate::config::SamplerConfig;
use crate::hal::Clock;
use crate::reading::{PROBE_ABSENT, SensorReading};
use crate::wireless::WirelessPublisher;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("sensor not connected")]
    Disconnected,
    #[error("{sensor} read failed: {details}")]
    ReadFailed {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("{sensor} did not answer in time")]
    Timeout { sensor: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FastReading {
    /// Lux
    pub light: f32,
    /// dB
    pub sound: f32,
    /// Percent
    pub soil: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientReading {
    /// °C
    pub temperature: f32,
    /// Percent RH
    pub humidity: f32,
}

/// The board's sensors.
pub trait SensorSource {
    fn read_fast(&mut self) -> impl Future<Output = Result<FastReading, SensorError>>;

    fn read_ambient(&mut self) -> impl Future<Output = Result<AmbientReading, SensorError>>;

    /// External probe temperature in °C. [`SensorError::Disconnected`] when
    /// no probe is plugged in.
    fn read_probe(&mut self) -> impl Future<Output = Result<f32, SensorError>>;
}

pub struct SensorSampler {
    config: SamplerConfig,
    last: SensorReading,
    next_slow: Option<Instant>,
}

impl SensorSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            config,
            last: SensorReading::UNSPECIFIED,
            next_slow: None,
        }
    }

    /// Run one fast cycle at `now`, plus the slow reads if they are due.
    ///
    /// Publishes the merged reading to `state` and to `publisher`, then
    /// mirrors the publisher's connection status into `state`.
    pub async fn cycle<S, W>(
        &mut self,
        now: Instant,
        state: &SharedState,
        source: &mut S,
        publisher: &mut W,
    ) -> SensorReading
    where
        S: SensorSource,
        W: WirelessPublisher,
    {
        let mut reading = self.last;

        match source.read_fast().await {
            Ok(fast) => {
                reading.light = keep_previous(reading.light, fast.light);
                reading.sound = keep_previous(reading.sound, fast.sound);
                reading.soil = keep_previous(reading.soil, fast.soil);
            }
            Err(e) => warn!(" Fast sensor read failed, keeping previous values: {}", e),
        }

        if self.next_slow.is_none_or(|due| now >= due) {
            self.next_slow = Some(now + self.config.slow_period());
            Self::read_slow(source, &mut reading).await;
        }

        self.last = reading;
        state.publish_reading(reading);
        publisher.publish(&reading).await;
        state.set_peer_connected(publisher.is_peer_connected());

        reading
    }

    async fn read_slow<S: SensorSource>(source: &mut S, reading: &mut SensorReading) {
        match source.read_ambient().await {
            Ok(ambient) => {
                reading.temperature = keep_previous(reading.temperature, ambient.temperature);
                reading.humidity = keep_previous(reading.humidity, ambient.humidity);
            }
            Err(e) => warn!(" Ambient read failed, keeping previous values: {}", e),
        }

        match source.read_probe().await {
            Ok(celsius) if !celsius.is_nan() => reading.probe = celsius,
            Ok(_) | Err(SensorError::Disconnected) => {
                if reading.has_probe() {
                    info!(" External probe disconnected");
                }
                reading.probe = PROBE_ABSENT;
            }
            Err(e) => debug!(" Probe read failed, keeping previous value: {}", e),
        }
    }

    /// Run the sampler task forever.
    pub async fn run<S, W, C>(
        &mut self,
        state: &SharedState,
        source: &mut S,
        publisher: &mut W,
        clock: &C,
    ) where
        S: SensorSource,
        W: WirelessPublisher,
        C: Clock,
    {
        info!(" Sensor sampler task started");

        loop {
            self.cycle(clock.now(), state, source, publisher).await;
            Timer::after(self.config.fast_period()).await;
        }
    }
}

/// A NaN from the driver counts as a failed read.
fn keep_previous(previous: f32, fresh: f32) -> f32 {
    if fresh.is_nan() { previous } else { fresh }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::test_support::{RecordingPublisher, ScriptedSource};

    struct Rig {
        sampler: SensorSampler,
        state: SharedState,
        source: ScriptedSource,
        publisher: RecordingPublisher,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                sampler: SensorSampler::new(SamplerConfig::default()),
                state: SharedState::new(),
                source: ScriptedSource::new(),
                publisher: RecordingPublisher::new(),
            }
        }

        fn cycle(&mut self, ms: u64) -> SensorReading {
            block_on(self.sampler.cycle(
                Instant::from_millis(ms),
                &self.state,
                &mut self.source,
                &mut self.publisher,
            ))
        }
    }

    #[test]
    fn test_each_cycle_publishes_once_and_flags_data() {
        let mut rig = Rig::new();
        let reading = rig.cycle(0);

        assert!(rig.state.take_data_ready());
        assert_eq!(rig.state.reading(), reading);
        assert_eq!(rig.publisher.published.len(), 1);
        assert_eq!(reading.light, 120.0);
        assert_eq!(reading.temperature, 22.5);
    }

    #[test]
    fn test_slow_sensors_follow_their_own_period() {
        let mut rig = Rig::new();
        for ms in (0..1_000).step_by(100) {
            rig.cycle(ms);
        }
        assert_eq!(rig.source.fast_reads, 10);
        assert_eq!(rig.source.ambient_reads, 1);
        assert_eq!(rig.source.probe_reads, 1);

        rig.cycle(1_000);
        assert_eq!(rig.source.ambient_reads, 2);
        assert_eq!(rig.publisher.published.len(), 11);
    }

    #[test]
    fn test_failed_reads_keep_previous_values() {
        let mut rig = Rig::new();
        rig.cycle(0);

        rig.source.fast = Err(SensorError::Timeout { sensor: "adc" });
        rig.source.ambient = Err(SensorError::ReadFailed {
            sensor: "dht",
            details: "checksum",
        });
        let reading = rig.cycle(1_000);

        assert_eq!(reading.light, 120.0);
        assert_eq!(reading.humidity, 48.0);
        assert_eq!(reading.temperature, 22.5);
    }

    #[test]
    fn test_failure_before_any_value_leaves_sentinels() {
        let mut rig = Rig::new();
        rig.source.ambient = Ok(AmbientReading {
            temperature: f32::NAN,
            humidity: f32::NAN,
        });
        let reading = rig.cycle(0);

        assert!(reading.temperature.is_nan());
        assert!(reading.humidity.is_nan());
    }

    #[test]
    fn test_disconnected_probe_reads_as_absent() {
        let mut rig = Rig::new();
        rig.source.probe = Ok(18.25);
        assert_eq!(rig.cycle(0).probe, 18.25);

        rig.source.probe = Err(SensorError::Disconnected);
        let reading = rig.cycle(1_000);
        assert_eq!(reading.probe, PROBE_ABSENT);
        assert!(!reading.has_probe());
    }

    #[test]
    fn test_connection_status_is_mirrored() {
        let mut rig = Rig::new();
        rig.cycle(0);
        assert!(!rig.state.is_peer_connected());

        rig.publisher.connected = true;
        rig.cycle(100);
        assert!(rig.state.is_peer_connected());
    }
}
