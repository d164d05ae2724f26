//! Application state
//!
//! Holds the configuration and shared components

use crate::error::{Error, Result};
use crate::monitor_orchestrator::MonitorOrchestrator;
use crate::monitoring_session::MonitoringSession;
use crate::recording_service::{CameraSource, RecordingService};
use crate::sensor_service::{SensorPaths, SensorService, DEFAULT_RAIN_THRESHOLD};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Default notification destination (webhook URL)
    pub webhook_url: Option<String>,
    /// Directory recorded clips are written to
    pub video_dir: PathBuf,
    /// Camera sources (label -> capture device)
    pub camera_sources: Vec<CameraSource>,
    /// Suppression window between admitted detections
    pub cooldown: Duration,
    /// Motion poll tick
    pub poll_interval: Duration,
    /// Clip length
    pub record_duration: Duration,
    /// Capture frame-rate target
    pub record_fps: u32,
    /// Rain ADC threshold for the raining flag
    pub rain_threshold: f32,
    /// Sensor hardware sysfs paths
    pub sensor_paths: SensorPaths,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from the environment
    pub fn from_env() -> Result<Self> {
        let raw_sources = std::env::var("CAMERA_SOURCES")
            .unwrap_or_else(|_| "outside=/dev/video0,inside=/dev/video2".to_string());
        let camera_sources = CameraSource::parse_list(&raw_sources)
            .map_err(|e| Error::Config(format!("CAMERA_SOURCES: {}", e)))?;

        Ok(Self {
            webhook_url: std::env::var("WEBHOOK_URL").ok(),
            video_dir: std::env::var("VIDEO_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/var/lib/parcelwatch/videos")),
            camera_sources,
            cooldown: Duration::from_secs(env_or("COOLDOWN_SEC", 30)),
            poll_interval: Duration::from_millis(env_or("POLL_INTERVAL_MS", 500)),
            record_duration: Duration::from_secs(env_or("RECORD_DURATION_SEC", 10)),
            record_fps: env_or("RECORD_FPS", 20),
            rain_threshold: env_or("RAIN_THRESHOLD", DEFAULT_RAIN_THRESHOLD),
            sensor_paths: SensorPaths {
                motion: std::env::var("MOTION_GPIO_VALUE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/sys/class/gpio/gpio16/value")),
                dht_dir: std::env::var("DHT_IIO_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/sys/bus/iio/devices/iio:device0")),
                rain: std::env::var("RAIN_ADC_RAW")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| {
                        PathBuf::from("/sys/bus/iio/devices/iio:device1/in_voltage0_raw")
                    }),
            },
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 8080),
        })
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// SensorService
    pub sensors: Arc<SensorService>,
    /// RecordingService
    pub recorder: Arc<RecordingService>,
    /// MonitoringSession (session control plane)
    pub session: Arc<MonitoringSession>,
    /// MonitorOrchestrator (poll loop)
    pub monitor: Arc<MonitorOrchestrator>,
}
