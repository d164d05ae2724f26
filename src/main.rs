//! parcelwatch - Delivery Box Monitor
//!
//! Main entry point.

use parcelwatch::{
    cooldown_gate::CooldownGate,
    delivery_dispatcher::WebhookDispatcher,
    monitor_orchestrator::{MonitorOrchestrator, MonitorSettings},
    monitoring_session::MonitoringSession,
    recording_service::RecordingService,
    sensor_service::SensorService,
    state::{AppConfig, AppState},
    web_api,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parcelwatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting parcelwatch v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!(
        video_dir = %config.video_dir.display(),
        cameras = config.camera_sources.len(),
        cooldown_sec = config.cooldown.as_secs(),
        poll_ms = config.poll_interval.as_millis() as u64,
        record_sec = config.record_duration.as_secs(),
        webhook_configured = config.webhook_url.is_some(),
        "Configuration loaded"
    );

    match RecordingService::check_ffmpeg().await {
        Ok(version) => tracing::info!(version = %version, "ffmpeg available"),
        Err(e) => tracing::warn!(error = %e, "ffmpeg not available, recordings will fail"),
    }

    // Initialize components
    let sensors = Arc::new(SensorService::detect(
        &config.sensor_paths,
        config.rain_threshold,
    ));

    let recorder = Arc::new(
        RecordingService::new(config.video_dir.clone(), config.camera_sources.clone()).await?,
    );

    let dispatcher = Arc::new(WebhookDispatcher::new());
    let session = Arc::new(MonitoringSession::new());
    let gate = Arc::new(CooldownGate::new(config.cooldown));

    let monitor = Arc::new(MonitorOrchestrator::new(
        sensors.clone(),
        recorder.clone(),
        dispatcher,
        session.clone(),
        gate,
        MonitorSettings {
            poll_interval: config.poll_interval,
            record_duration: config.record_duration,
            record_fps: config.record_fps,
        },
    ));

    // The poll loop always runs; the session flag gates admissions
    monitor.start().await;
    tracing::info!("MonitorOrchestrator started");

    // Optionally activate the session right away
    if std::env::var("MONITOR_AUTOSTART").map(|v| v == "true").unwrap_or(false) {
        match config.webhook_url.clone() {
            Some(destination) if sensors.motion_available() => {
                session.start(destination).await?;
                tracing::info!("Monitoring session auto-started");
            }
            Some(_) => {
                tracing::warn!("MONITOR_AUTOSTART set but motion sensor is not readable");
            }
            None => {
                tracing::warn!("MONITOR_AUTOSTART set but WEBHOOK_URL is missing");
            }
        }
    }

    // Create application state
    let state = AppState {
        config: config.clone(),
        sensors,
        recorder,
        session,
        monitor,
    };

    let app = web_api::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
