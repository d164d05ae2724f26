//! API Routes

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::ApiResponse;
use crate::monitor_orchestrator::MonitorPhase;
use crate::monitoring_session::SessionState;
use crate::recording_service::RecordingService;
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/healthz", get(super::health_check))
        .route("/api/status", get(super::device_status))
        // Monitoring session
        .route("/api/monitor/start", post(start_monitor))
        .route("/api/monitor/stop", post(stop_monitor))
        .route("/api/monitor/status", get(monitor_status))
        .with_state(state)
}

#[derive(Debug, Deserialize, Default)]
struct StartMonitorRequest {
    /// Destination override; falls back to the configured webhook
    destination: Option<String>,
}

#[derive(Debug, Serialize)]
struct MonitorStatus {
    active: bool,
    phase: MonitorPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_detection: Option<DateTime<Utc>>,
}

/// Activate the monitoring session
///
/// Preflight before flipping the flag: a destination, at least one camera
/// source, a working ffmpeg, and a readable motion source. Missing pieces
/// fail the request visibly instead of silently activating.
async fn start_monitor(
    State(state): State<AppState>,
    body: Option<Json<StartMonitorRequest>>,
) -> Result<Json<ApiResponse<SessionState>>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let destination = request
        .destination
        .or_else(|| state.config.webhook_url.clone())
        .ok_or_else(|| Error::Config("no destination configured (WEBHOOK_URL unset)".to_string()))?;

    if state.recorder.sources().is_empty() {
        return Err(Error::Config("no camera sources configured".to_string()));
    }

    RecordingService::check_ffmpeg()
        .await
        .map_err(|e| Error::Config(format!("ffmpeg unavailable: {}", e)))?;

    if !state.sensors.motion_available() {
        return Err(Error::SensorUnavailable(
            "motion sensor not readable".to_string(),
        ));
    }

    state.session.start(destination).await?;
    let session = state.session.state().await;

    tracing::info!(
        destination = session.destination.as_deref().unwrap_or(""),
        "Monitoring started"
    );
    Ok(Json(ApiResponse::success(session)))
}

/// Deactivate the monitoring session
///
/// An in-flight capture finishes before the loop goes idle.
async fn stop_monitor(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let was_active = state.session.stop().await;
    tracing::info!(was_active = was_active, "Monitoring stopped");
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "was_active": was_active }),
    )))
}

/// Current session and loop state
async fn monitor_status(State(state): State<AppState>) -> Result<Json<MonitorStatus>> {
    let session = state.session.state().await;
    Ok(Json(MonitorStatus {
        active: session.active,
        phase: state.monitor.phase().await,
        destination: session.destination,
        last_detection: state.monitor.last_detection().await,
    }))
}
