//! WebAPI - Command Frontend
//!
//! ## Responsibilities
//!
//! - HTTP routes for start/stop/status
//! - Request validation
//! - Response formatting
//!
//! A thin adapter over the session control plane; swapping it out never
//! touches the monitor core.

mod routes;

pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::models::HealthResponse;
use crate::recording_service::RecordingService;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let ffmpeg_ok = RecordingService::check_ffmpeg().await.is_ok();

    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ffmpeg_available: ffmpeg_ok,
        sensors_available: state.sensors.hardware_present(),
        monitoring_active: state.session.is_active().await,
    };

    Json(response)
}

/// Device status endpoint
pub async fn device_status(State(_state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "device_type": "parcelwatch",
        "firmware_version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}
