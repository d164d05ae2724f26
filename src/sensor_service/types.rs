//! Sensor data types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default rain ADC threshold: raw readings above this count as raining
pub const DEFAULT_RAIN_THRESHOLD: f32 = 500.0;

/// Single environmental reading
///
/// Missing hardware and transient read faults are normalized into the
/// sentinel variants so callers never have to handle a failing read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Reading {
    Value(f32),
    Unavailable,
    Error,
}

impl Reading {
    /// Numeric value if the reading succeeded
    pub fn value(&self) -> Option<f32> {
        match self {
            Reading::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Reading::Value(_))
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{:.1}", v),
            Reading::Unavailable => write!(f, "N/A"),
            Reading::Error => write!(f, "ERR"),
        }
    }
}

/// Motion sensor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionState {
    /// PIR reports motion
    Active,
    /// PIR reports no motion
    Inactive,
    /// Sensor absent or read failed
    Unknown,
}

/// One complete read of all environmental sensors at a single instant
///
/// Created fresh on each read, never mutated after construction. Any subset
/// of the fields may carry a sentinel while the others hold real values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub captured_at: DateTime<Utc>,
    pub temperature: Reading,
    pub humidity: Reading,
    pub rain_level: Reading,
    /// Raining iff the rain level exceeded the threshold; None when the
    /// rain level itself was not readable
    pub raining: Option<bool>,
}

impl SensorSnapshot {
    /// Weather label for notification text
    pub fn weather_label(&self) -> &'static str {
        match self.raining {
            Some(true) => "Raining",
            Some(false) => "Dry",
            None => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_display_sentinels() {
        assert_eq!(Reading::Value(21.5).to_string(), "21.5");
        assert_eq!(Reading::Unavailable.to_string(), "N/A");
        assert_eq!(Reading::Error.to_string(), "ERR");
    }

    fn snapshot_with_raining(raining: Option<bool>) -> SensorSnapshot {
        SensorSnapshot {
            captured_at: Utc::now(),
            temperature: Reading::Value(20.0),
            humidity: Reading::Value(45.0),
            rain_level: Reading::Value(612.0),
            raining,
        }
    }

    #[test]
    fn weather_label_follows_rain_status() {
        assert_eq!(snapshot_with_raining(Some(true)).weather_label(), "Raining");
        assert_eq!(snapshot_with_raining(Some(false)).weather_label(), "Dry");
        assert_eq!(snapshot_with_raining(None).weather_label(), "Unknown");
    }
}
