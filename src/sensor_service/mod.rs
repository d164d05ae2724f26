//! SensorService - Environmental and Motion Sensing
//!
//! ## Responsibilities
//!
//! - Fast motion polling for the monitor loop
//! - Full environmental snapshots on admitted detections
//! - Normalizing hardware faults into per-field sentinels
//!
//! A failing read never reaches the caller: each field degrades to its own
//! sentinel independently, so a dead DHT cannot blank out a valid rain
//! reading.

mod backend;
mod types;

pub use backend::{NullSensorBank, SensorBackend, SensorPaths, SysfsSensorBank};
pub use types::{MotionState, Reading, SensorSnapshot, DEFAULT_RAIN_THRESHOLD};

use chrono::Utc;
use std::sync::Arc;

/// SensorService instance
pub struct SensorService {
    backend: Arc<dyn SensorBackend>,
    rain_threshold: f32,
}

impl SensorService {
    /// Create with an explicit backend (tests, custom adapters)
    pub fn with_backend(backend: Arc<dyn SensorBackend>, rain_threshold: f32) -> Self {
        Self {
            backend,
            rain_threshold,
        }
    }

    /// Select a backend once at startup
    ///
    /// Uses the sysfs adapter when the PIR value file exists, otherwise
    /// degrades to the stub bank so the process keeps running without
    /// hardware.
    pub fn detect(paths: &SensorPaths, rain_threshold: f32) -> Self {
        if paths.motion.exists() {
            tracing::info!(
                motion = %paths.motion.display(),
                dht_dir = %paths.dht_dir.display(),
                rain = %paths.rain.display(),
                "Sensor hardware detected, using sysfs backend"
            );
            Self::with_backend(Arc::new(SysfsSensorBank::new(paths)), rain_threshold)
        } else {
            tracing::warn!(
                motion = %paths.motion.display(),
                "Sensor hardware not found, all readings will be unavailable"
            );
            Self::with_backend(Arc::new(NullSensorBank), rain_threshold)
        }
    }

    /// True when real hardware is behind the service
    pub fn hardware_present(&self) -> bool {
        self.backend.hardware_present()
    }

    /// True when the motion source can be read
    pub fn motion_available(&self) -> bool {
        self.backend.motion_available()
    }

    /// Low-latency motion read, polled every tick
    ///
    /// Faults degrade to `Unknown` rather than failing the loop.
    pub async fn read_motion(&self) -> MotionState {
        match self.backend.read_motion().await {
            Ok(state) => state,
            Err(e) => {
                tracing::debug!(error = %e, "Motion read failed");
                MotionState::Unknown
            }
        }
    }

    /// Full environmental snapshot
    ///
    /// Each field is read and degraded independently; the call itself never
    /// fails.
    pub async fn read_snapshot(&self) -> SensorSnapshot {
        let (temperature, humidity) = match self.backend.read_temperature_humidity().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "Temperature/humidity read failed");
                (Reading::Error, Reading::Error)
            }
        };

        let rain_level = match self.backend.read_rain_level().await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::warn!(error = %e, "Rain level read failed");
                Reading::Error
            }
        };

        let raining = rain_level.value().map(|v| v > self.rain_threshold);

        SensorSnapshot {
            captured_at: Utc::now(),
            temperature,
            humidity,
            rain_level,
            raining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use async_trait::async_trait;

    /// Backend where individual fields can be forced to fail
    struct FlakyBank {
        fail_dht: bool,
        fail_rain: bool,
        rain_value: f32,
    }

    #[async_trait]
    impl SensorBackend for FlakyBank {
        async fn read_motion(&self) -> Result<MotionState> {
            Ok(MotionState::Active)
        }

        async fn read_temperature_humidity(&self) -> Result<(Reading, Reading)> {
            if self.fail_dht {
                Err(Error::SensorRead("dht timeout".into()))
            } else {
                Ok((Reading::Value(19.0), Reading::Value(55.0)))
            }
        }

        async fn read_rain_level(&self) -> Result<Reading> {
            if self.fail_rain {
                Err(Error::SensorRead("adc i/o".into()))
            } else {
                Ok(Reading::Value(self.rain_value))
            }
        }

        fn motion_available(&self) -> bool {
            true
        }

        fn hardware_present(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn snapshot_fields_degrade_independently() {
        let service = SensorService::with_backend(
            Arc::new(FlakyBank {
                fail_dht: true,
                fail_rain: false,
                rain_value: 120.0,
            }),
            DEFAULT_RAIN_THRESHOLD,
        );

        let snapshot = service.read_snapshot().await;
        assert_eq!(snapshot.temperature, Reading::Error);
        assert_eq!(snapshot.humidity, Reading::Error);
        assert_eq!(snapshot.rain_level, Reading::Value(120.0));
        assert_eq!(snapshot.raining, Some(false));
    }

    #[tokio::test]
    async fn rain_status_uses_threshold() {
        let service = SensorService::with_backend(
            Arc::new(FlakyBank {
                fail_dht: false,
                fail_rain: false,
                rain_value: 501.0,
            }),
            DEFAULT_RAIN_THRESHOLD,
        );

        let snapshot = service.read_snapshot().await;
        assert_eq!(snapshot.raining, Some(true));
        assert_eq!(snapshot.temperature, Reading::Value(19.0));
    }

    #[tokio::test]
    async fn failed_rain_read_leaves_status_unknown() {
        let service = SensorService::with_backend(
            Arc::new(FlakyBank {
                fail_dht: false,
                fail_rain: true,
                rain_value: 0.0,
            }),
            DEFAULT_RAIN_THRESHOLD,
        );

        let snapshot = service.read_snapshot().await;
        assert_eq!(snapshot.rain_level, Reading::Error);
        assert_eq!(snapshot.raining, None);
    }

    #[tokio::test]
    async fn motion_faults_degrade_to_unknown() {
        struct BrokenMotion;

        #[async_trait]
        impl SensorBackend for BrokenMotion {
            async fn read_motion(&self) -> Result<MotionState> {
                Err(Error::SensorRead("gpio gone".into()))
            }

            async fn read_temperature_humidity(&self) -> Result<(Reading, Reading)> {
                Ok((Reading::Unavailable, Reading::Unavailable))
            }

            async fn read_rain_level(&self) -> Result<Reading> {
                Ok(Reading::Unavailable)
            }

            fn motion_available(&self) -> bool {
                false
            }

            fn hardware_present(&self) -> bool {
                true
            }
        }

        let service = SensorService::with_backend(Arc::new(BrokenMotion), DEFAULT_RAIN_THRESHOLD);
        assert_eq!(service.read_motion().await, MotionState::Unknown);
    }
}
