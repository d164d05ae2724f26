//! Error handling for the delivery box monitor

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Sensor hardware absent or initialization failed (global)
    #[error("Sensors unavailable: {0}")]
    SensorUnavailable(String),

    /// Transient per-field sensor read failure
    #[error("Sensor read error: {0}")]
    SensorRead(String),

    /// Camera device could not be opened
    #[error("Camera open error ({source_label}): {message}")]
    CameraOpen {
        source_label: String,
        message: String,
    },

    /// Camera opened but recording/writing failed
    #[error("Camera write error ({source_label}): {message}")]
    CameraWrite {
        source_label: String,
        message: String,
    },

    /// Webhook delivery failed (best-effort, never re-raised into the loop)
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Startup/session misconfiguration
    #[error("Config error: {0}")]
    Config(String),

    /// Conflicting session command (e.g. start while already active)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Error::SensorUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SENSORS_UNAVAILABLE",
                msg.clone(),
            ),
            Error::SensorRead(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SENSOR_READ_ERROR",
                msg.clone(),
            ),
            Error::CameraOpen {
                source_label,
                message,
            } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CAMERA_OPEN_ERROR",
                format!("Camera {}: {}", source_label, message),
            ),
            Error::CameraWrite {
                source_label,
                message,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CAMERA_WRITE_ERROR",
                format!("Camera {}: {}", source_label, message),
            ),
            Error::Delivery(msg) => (StatusCode::BAD_GATEWAY, "DELIVERY_ERROR", msg.clone()),
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "CONFIG_ERROR", msg.clone()),
            Error::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            Error::Serialization(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERIALIZATION_ERROR",
                e.to_string(),
            ),
            Error::Http(e) => (StatusCode::BAD_GATEWAY, "HTTP_ERROR", e.to_string()),
            Error::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR", e.to_string()),
            Error::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        tracing::error!(
            status = %status,
            error_code = %error_code,
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
