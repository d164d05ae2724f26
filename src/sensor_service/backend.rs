//! Sensor hardware backends
//!
//! The monitor core treats sensors as an opaque capability set. Two
//! implementations exist: `SysfsSensorBank` reads the real hardware through
//! the kernel's GPIO/IIO sysfs attributes, `NullSensorBank` stands in when
//! the hardware is absent and reports everything as unavailable. Selection
//! happens once at startup, not scattered through conditionals.

use crate::error::{Error, Result};
use crate::sensor_service::types::{MotionState, Reading};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Capability boundary for the physical sensors
#[async_trait]
pub trait SensorBackend: Send + Sync {
    /// Fast motion read, polled every tick
    async fn read_motion(&self) -> Result<MotionState>;

    /// Temperature (deg C) and relative humidity (%)
    async fn read_temperature_humidity(&self) -> Result<(Reading, Reading)>;

    /// Raw rain ADC level
    async fn read_rain_level(&self) -> Result<Reading>;

    /// True when the motion source can be read at all
    fn motion_available(&self) -> bool;

    /// True when any real hardware is behind this backend
    fn hardware_present(&self) -> bool;
}

/// Sysfs paths for the sensor hardware
#[derive(Debug, Clone)]
pub struct SensorPaths {
    /// PIR GPIO value file (e.g. /sys/class/gpio/gpio16/value)
    pub motion: PathBuf,
    /// DHT IIO device directory holding in_temp_input / in_humidityrelative_input
    pub dht_dir: PathBuf,
    /// Rain ADC raw attribute (e.g. .../in_voltage0_raw)
    pub rain: PathBuf,
}

/// Real-hardware adapter reading the kernel GPIO/IIO sysfs attributes
pub struct SysfsSensorBank {
    motion_path: PathBuf,
    temp_path: PathBuf,
    humidity_path: PathBuf,
    rain_path: PathBuf,
}

impl SysfsSensorBank {
    pub fn new(paths: &SensorPaths) -> Self {
        Self {
            motion_path: paths.motion.clone(),
            temp_path: paths.dht_dir.join("in_temp_input"),
            humidity_path: paths.dht_dir.join("in_humidityrelative_input"),
            rain_path: paths.rain.clone(),
        }
    }

    async fn read_attr(path: &Path) -> Result<String> {
        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| Error::SensorRead(format!("{}: {}", path.display(), e)))?;
        Ok(raw.trim().to_string())
    }

    async fn read_numeric(path: &Path) -> Result<f32> {
        let raw = Self::read_attr(path).await?;
        raw.parse::<f32>()
            .map_err(|e| Error::SensorRead(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl SensorBackend for SysfsSensorBank {
    async fn read_motion(&self) -> Result<MotionState> {
        match Self::read_attr(&self.motion_path).await?.as_str() {
            "1" => Ok(MotionState::Active),
            "0" => Ok(MotionState::Inactive),
            other => Err(Error::SensorRead(format!(
                "unexpected PIR value {:?}",
                other
            ))),
        }
    }

    async fn read_temperature_humidity(&self) -> Result<(Reading, Reading)> {
        // IIO reports millidegrees / milli-percent
        let temp = Self::read_numeric(&self.temp_path)
            .await
            .map(|v| Reading::Value(v / 1000.0))?;
        let humidity = Self::read_numeric(&self.humidity_path)
            .await
            .map(|v| Reading::Value(v / 1000.0))?;
        Ok((temp, humidity))
    }

    async fn read_rain_level(&self) -> Result<Reading> {
        Self::read_numeric(&self.rain_path).await.map(Reading::Value)
    }

    fn motion_available(&self) -> bool {
        self.motion_path.exists()
    }

    fn hardware_present(&self) -> bool {
        true
    }
}

/// Stub adapter used when no sensor hardware is present
///
/// Every read succeeds with "unavailable" so the monitor keeps running
/// instead of crashing on a missing sensor stack.
pub struct NullSensorBank;

#[async_trait]
impl SensorBackend for NullSensorBank {
    async fn read_motion(&self) -> Result<MotionState> {
        Ok(MotionState::Unknown)
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
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn null_bank_reports_everything_unavailable() {
        let bank = NullSensorBank;
        assert_eq!(bank.read_motion().await.unwrap(), MotionState::Unknown);
        assert_eq!(
            bank.read_temperature_humidity().await.unwrap(),
            (Reading::Unavailable, Reading::Unavailable)
        );
        assert_eq!(bank.read_rain_level().await.unwrap(), Reading::Unavailable);
        assert!(!bank.motion_available());
        assert!(!bank.hardware_present());
    }

    #[tokio::test]
    async fn sysfs_bank_reads_and_scales_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let dht_dir = dir.path().join("iio:device0");
        std::fs::create_dir_all(&dht_dir).unwrap();

        let motion = dir.path().join("gpio16_value");
        let rain = dir.path().join("in_voltage0_raw");
        write!(std::fs::File::create(&motion).unwrap(), "1\n").unwrap();
        write!(std::fs::File::create(dht_dir.join("in_temp_input")).unwrap(), "21500\n").unwrap();
        write!(
            std::fs::File::create(dht_dir.join("in_humidityrelative_input")).unwrap(),
            "48000\n"
        )
        .unwrap();
        write!(std::fs::File::create(&rain).unwrap(), "612\n").unwrap();

        let bank = SysfsSensorBank::new(&SensorPaths {
            motion,
            dht_dir,
            rain,
        });

        assert_eq!(bank.read_motion().await.unwrap(), MotionState::Active);
        let (temp, humidity) = bank.read_temperature_humidity().await.unwrap();
        assert_eq!(temp, Reading::Value(21.5));
        assert_eq!(humidity, Reading::Value(48.0));
        assert_eq!(bank.read_rain_level().await.unwrap(), Reading::Value(612.0));
        assert!(bank.motion_available());
    }

    #[tokio::test]
    async fn sysfs_bank_missing_attribute_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let bank = SysfsSensorBank::new(&SensorPaths {
            motion: dir.path().join("missing"),
            dht_dir: dir.path().join("iio:device0"),
            rain: dir.path().join("missing_rain"),
        });

        assert!(bank.read_motion().await.is_err());
        assert!(bank.read_temperature_humidity().await.is_err());
        assert!(bank.read_rain_level().await.is_err());
        assert!(!bank.motion_available());
    }
}
