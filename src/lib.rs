//! parcelwatch - Delivery Box Monitor
//!
//! Watches a PIR motion sensor on a delivery box and, on each admitted
//! detection, captures synchronized clips from the configured cameras,
//! samples the environmental sensors, and pushes a webhook notification
//! with the clips attached.
//!
//! ## Architecture
//!
//! 1. SensorService - motion polling + environmental snapshots
//! 2. RecordingService - concurrent fixed-duration clip capture (ffmpeg)
//! 3. CooldownGate - detection admission control
//! 4. MonitorOrchestrator - the motion-to-notification poll loop
//! 5. DeliveryDispatcher - webhook transport, owns clip cleanup
//! 6. MonitoringSession - start/stop control plane
//! 7. WebAPI - thin HTTP command frontend
//!
//! ## Design Principles
//!
//! - The loop never dies: sensor and camera faults degrade to sentinels
//!   and per-source failures, only startup misconfiguration is fatal
//! - Single writer: the loop owns the cooldown timestamp, the frontend
//!   owns the session flag
//! - Hardware behind capability traits, selected once at startup

pub mod cooldown_gate;
pub mod delivery_dispatcher;
pub mod error;
pub mod models;
pub mod monitor_orchestrator;
pub mod monitoring_session;
pub mod recording_service;
pub mod sensor_service;
pub mod state;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
