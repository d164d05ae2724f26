//! DeliveryDispatcher - Webhook Notification Transport
//!
//! ## Responsibilities
//!
//! - Push one notification per admitted detection to the destination webhook
//! - Upload the recorded clips as attachments
//! - Remove clip files after a fully successful send
//!
//! Delivery is best-effort from the monitor loop's point of view: failures
//! are logged and returned as `Error::Delivery`, and the clips stay on disk
//! for operator recovery.

use crate::error::{Error, Result};
use crate::recording_service::{RecordingBatch, RecordingOutcome};
use crate::sensor_service::SensorSnapshot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

/// Immutable per-detection bundle handed off for delivery
///
/// Ownership transfers to the dispatcher, which is responsible for releasing
/// the clip files once they were transmitted.
#[derive(Debug)]
pub struct DeliveryEvent {
    pub triggered_at: DateTime<Utc>,
    pub snapshot: SensorSnapshot,
    pub batch: RecordingBatch,
    pub destination: String,
}

/// Transport seam the monitor loop dispatches through
#[async_trait]
pub trait DeliveryDispatcher: Send + Sync {
    async fn dispatch(&self, event: DeliveryEvent) -> Result<()>;
}

/// Notification message payload for a detection event
pub fn build_message(event: &DeliveryEvent) -> serde_json::Value {
    let snapshot = &event.snapshot;
    let cameras = if event.batch.recordings.is_empty() {
        "none configured".to_string()
    } else {
        event
            .batch
            .recordings
            .iter()
            .map(|r| match &r.outcome {
                RecordingOutcome::Recorded { frames, .. } => {
                    format!("{}: {} frames", r.label, frames)
                }
                RecordingOutcome::Failed { error } => {
                    format!("{}: failed ({})", r.label, error)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    json!({
        "content": "📦 **Delivery box motion detected!**",
        "embeds": [{
            "title": "Delivery Alert",
            "description": format!(
                "Motion detected at {}",
                event.triggered_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            "color": 0x00ff00,
            "fields": [
                {"name": "Temperature", "value": format!("{}°C", snapshot.temperature), "inline": true},
                {"name": "Humidity", "value": format!("{}%", snapshot.humidity), "inline": true},
                {"name": "Weather", "value": snapshot.weather_label(), "inline": true},
                {"name": "Cameras", "value": cameras, "inline": false},
            ],
            "timestamp": event.triggered_at.to_rfc3339(),
        }]
    })
}

fn clip_mime(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp4") => "video/mp4",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// Webhook-backed dispatcher (Discord-compatible payload)
pub struct WebhookDispatcher {
    client: reqwest::Client,
}

impl WebhookDispatcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    async fn post_message(&self, event: &DeliveryEvent) -> Result<()> {
        let resp = self
            .client
            .post(&event.destination)
            .json(&build_message(event))
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("webhook post failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(Error::Delivery(format!(
                "webhook returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn upload_clip(&self, destination: &str, label: &str, path: &Path) -> Result<()> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| Error::Delivery(format!("clip read failed {}: {}", path.display(), e)))?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("clip.mp4")
            .to_string();

        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str(clip_mime(path))
            .map_err(|e| Error::Delivery(format!("clip mime: {}", e)))?;
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(destination)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("clip upload failed ({}): {}", label, e)))?;

        if !resp.status().is_success() {
            return Err(Error::Delivery(format!(
                "clip upload ({}) returned {}",
                label,
                resp.status()
            )));
        }
        Ok(())
    }
}

impl Default for WebhookDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Delete the clip files of a fully delivered batch
pub async fn remove_artifacts(batch: &RecordingBatch) {
    for (label, path, _) in batch.clips() {
        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(camera = %label, path = %path.display(), "Delivered clip removed")
            }
            Err(e) => {
                tracing::warn!(
                    camera = %label,
                    path = %path.display(),
                    error = %e,
                    "Failed to remove delivered clip"
                );
            }
        }
    }
}

#[async_trait]
impl DeliveryDispatcher for WebhookDispatcher {
    async fn dispatch(&self, event: DeliveryEvent) -> Result<()> {
        self.post_message(&event).await?;

        for (label, path, frames) in event.batch.clips() {
            self.upload_clip(&event.destination, label, path).await?;
            tracing::info!(
                camera = %label,
                path = %path.display(),
                frames = frames,
                "Clip uploaded"
            );
        }

        // Artifacts are released only after the whole event went out; on any
        // earlier failure they stay on disk for operator recovery
        remove_artifacts(&event.batch).await;

        tracing::info!(
            destination = %event.destination,
            clips = event.batch.success_count(),
            "Delivery event dispatched"
        );
        Ok(())
    }
}
