//! MonitorOrchestrator - Motion-to-Notification Pipeline
//!
//! ## Responsibilities
//!
//! - Fixed-tick motion polling while the session is active
//! - Cooldown-gated admission of detections
//! - Concurrent snapshot + multi-camera capture per admitted detection
//! - DeliveryEvent assembly and best-effort dispatch
//!
//! The loop is the single writer of the cooldown timestamp. A capture runs
//! inline in the loop body, so at most one recording is in flight and a stop
//! request lets it finish instead of aborting it. Sensor and camera faults
//! surface as sentinel/failure values and never terminate the loop.

use crate::cooldown_gate::CooldownGate;
use crate::delivery_dispatcher::{DeliveryDispatcher, DeliveryEvent};
use crate::monitoring_session::MonitoringSession;
use crate::recording_service::ClipRecorder;
use crate::sensor_service::{MotionState, SensorService};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{interval, Instant, MissedTickBehavior};

/// Loop phase, surfaced through the status API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorPhase {
    /// Session inactive, or cooldown still pending
    Idle,
    /// Session active, cooldown cleared, polling for motion
    Watching,
    /// Admitted detection: snapshot + recording in flight
    Capturing,
}

/// Loop timing parameters
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Motion poll tick; bounds detection latency
    pub poll_interval: Duration,
    /// Wall-clock length of each recorded clip
    pub record_duration: Duration,
    /// Capture frame-rate target
    pub record_fps: u32,
}

/// MonitorOrchestrator instance
pub struct MonitorOrchestrator {
    sensors: Arc<SensorService>,
    recorder: Arc<dyn ClipRecorder>,
    dispatcher: Arc<dyn DeliveryDispatcher>,
    session: Arc<MonitoringSession>,
    gate: Arc<CooldownGate>,
    settings: MonitorSettings,
    running: Arc<RwLock<bool>>,
    phase: Arc<RwLock<MonitorPhase>>,
    last_detection: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl MonitorOrchestrator {
    /// Create new MonitorOrchestrator
    pub fn new(
        sensors: Arc<SensorService>,
        recorder: Arc<dyn ClipRecorder>,
        dispatcher: Arc<dyn DeliveryDispatcher>,
        session: Arc<MonitoringSession>,
        gate: Arc<CooldownGate>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            sensors,
            recorder,
            dispatcher,
            session,
            gate,
            settings,
            running: Arc::new(RwLock::new(false)),
            phase: Arc::new(RwLock::new(MonitorPhase::Idle)),
            last_detection: Arc::new(RwLock::new(None)),
        }
    }

    /// Current loop phase
    pub async fn phase(&self) -> MonitorPhase {
        *self.phase.read().await
    }

    /// Trigger time of the most recent admitted detection
    pub async fn last_detection(&self) -> Option<DateTime<Utc>> {
        *self.last_detection.read().await
    }

    /// Start the poll loop
    pub async fn start(&self) {
        {
            let mut running = self.running.write().await;
            if *running {
                tracing::warn!("Monitor loop already running");
                return;
            }
            *running = true;
        }

        tracing::info!(
            poll_ms = self.settings.poll_interval.as_millis() as u64,
            record_sec = self.settings.record_duration.as_secs(),
            fps = self.settings.record_fps,
            cooldown_sec = self.gate.window().as_secs(),
            "Starting monitor loop"
        );

        let sensors = self.sensors.clone();
        let recorder = self.recorder.clone();
        let dispatcher = self.dispatcher.clone();
        let session = self.session.clone();
        let gate = self.gate.clone();
        let settings = self.settings.clone();
        let running = self.running.clone();
        let phase = self.phase.clone();
        let last_detection = self.last_detection.clone();

        tokio::spawn(async move {
            let mut tick = interval(settings.poll_interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tick.tick().await;

                {
                    let is_running = running.read().await;
                    if !*is_running {
                        break;
                    }
                }

                // One consistent read of the control plane per tick; the
                // loop never mutates it
                let control = session.state().await;
                if !control.active {
                    *phase.write().await = MonitorPhase::Idle;
                    continue;
                }

                let now = Instant::now();
                let cooldown_clear = gate.admits(now, true).await;
                *phase.write().await = if cooldown_clear {
                    MonitorPhase::Watching
                } else {
                    MonitorPhase::Idle
                };

                let motion = sensors.read_motion().await;
                if motion != MotionState::Active || !cooldown_clear {
                    continue;
                }

                let destination = match control.destination {
                    Some(d) => d,
                    None => {
                        tracing::warn!("Session active without destination, skipping detection");
                        continue;
                    }
                };

                *phase.write().await = MonitorPhase::Capturing;
                let triggered_at = Utc::now();
                *last_detection.write().await = Some(triggered_at);

                Self::handle_detection(
                    &sensors,
                    recorder.as_ref(),
                    dispatcher.as_ref(),
                    &settings,
                    destination,
                    triggered_at,
                )
                .await;

                // The window is consumed only now, after the capture
                // finished - also when every source failed, so a broken
                // camera cannot cause a retry storm
                gate.mark(now).await;
                *phase.write().await = MonitorPhase::Idle;
            }

            *phase.write().await = MonitorPhase::Idle;
            tracing::info!("Monitor loop stopped");
        });
    }

    /// Stop the poll loop
    ///
    /// A request, not a preemption: a capture in flight runs to completion
    /// before the loop observes the flag.
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        tracing::info!("Stopping monitor loop");
    }

    /// Handle one admitted detection
    async fn handle_detection(
        sensors: &SensorService,
        recorder: &dyn ClipRecorder,
        dispatcher: &dyn DeliveryDispatcher,
        settings: &MonitorSettings,
        destination: String,
        triggered_at: DateTime<Utc>,
    ) {
        tracing::info!(
            triggered_at = %triggered_at.to_rfc3339(),
            "Motion detected, capturing"
        );

        // Snapshot and recording cover the same wall-clock window; the
        // event is assembled only after both completed
        let (snapshot, batch) = tokio::join!(
            sensors.read_snapshot(),
            recorder.record_all(settings.record_duration, settings.record_fps)
        );

        if !batch.is_usable() {
            tracing::warn!("Every camera source failed, sending minimal notification");
        }

        let clips = batch.success_count();
        let event = DeliveryEvent {
            triggered_at,
            snapshot,
            batch,
            destination,
        };

        match dispatcher.dispatch(event).await {
            Ok(()) => {
                tracing::info!(clips = clips, "Detection delivered");
            }
            Err(e) => {
                // Best-effort: the loop keeps polling regardless
                tracing::error!(error = %e, "Delivery failed");
            }
        }
    }
}
