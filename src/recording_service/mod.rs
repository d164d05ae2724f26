//! RecordingService - Fixed-Duration Clip Capture via ffmpeg
//!
//! ## Responsibilities
//!
//! - Concurrent fixed-duration recording from all configured sources
//! - Per-source failure isolation (one dead camera never aborts siblings)
//! - Collision-free clip naming under the video directory
//! - Container format selection with mjpeg/avi fallback
//!
//! All sources of a batch record the same wall-clock window so the clips
//! stay synchronized views of one physical event.

mod types;

pub use types::{CameraSource, RecordingBatch, RecordingOutcome, SourceRecording};

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;

/// Extra wall-clock allowance for ffmpeg startup and trailer writing
const RECORD_GRACE: Duration = Duration::from_secs(10);

/// Seam the monitor loop records through; lets tests run without cameras
#[async_trait]
pub trait ClipRecorder: Send + Sync {
    async fn record_all(&self, duration: Duration, fps: u32) -> RecordingBatch;
}

/// Output container format
///
/// mp4 is the primary; avi/mjpeg is the fallback when the mpeg4 encoder is
/// missing from the platform's ffmpeg build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoContainer {
    Mp4,
    Avi,
}

impl VideoContainer {
    pub fn extension(&self) -> &'static str {
        match self {
            VideoContainer::Mp4 => "mp4",
            VideoContainer::Avi => "avi",
        }
    }

    fn codec(&self) -> &'static str {
        match self {
            VideoContainer::Mp4 => "mpeg4",
            VideoContainer::Avi => "mjpeg",
        }
    }
}

/// Clip file name for one source
///
/// Label plus a second-granularity timestamp. Sub-second repeat triggers are
/// barred by the cooldown window, so seconds are collision-free across
/// invocations; the label keeps sources apart within one batch.
pub fn clip_filename(label: &str, stamp: &str, container: VideoContainer) -> String {
    format!("{}_{}.{}", label, stamp, container.extension())
}

/// Extract the captured frame count from ffmpeg progress output
///
/// ffmpeg reports `frame=  200 fps=...` on stderr; the last occurrence holds
/// the final count.
pub fn parse_frame_count(stderr: &str) -> u64 {
    match stderr.rfind("frame=") {
        Some(idx) => {
            let tail = &stderr[idx + "frame=".len()..];
            let digits: String = tail
                .trim_start()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().unwrap_or(0)
        }
        None => 0,
    }
}

/// RecordingService instance
pub struct RecordingService {
    video_dir: PathBuf,
    sources: Vec<CameraSource>,
    container: VideoContainer,
}

impl RecordingService {
    /// Create new RecordingService
    ///
    /// Creates the video directory if absent and probes the available
    /// container format once.
    pub async fn new(video_dir: PathBuf, sources: Vec<CameraSource>) -> Result<Self> {
        fs::create_dir_all(&video_dir).await?;
        let container = Self::probe_container().await;

        tracing::info!(
            video_dir = %video_dir.display(),
            sources = sources.len(),
            container = container.extension(),
            "RecordingService initialized"
        );

        Ok(Self {
            video_dir,
            sources,
            container,
        })
    }

    pub fn sources(&self) -> &[CameraSource] {
        &self.sources
    }

    pub fn container(&self) -> VideoContainer {
        self.container
    }

    /// Check if ffmpeg is available
    pub async fn check_ffmpeg() -> Result<String> {
        let output = Command::new("ffmpeg")
            .arg("-version")
            .output()
            .await
            .map_err(|e| Error::Internal(format!("ffmpeg not found: {}", e)))?;

        if !output.status.success() {
            return Err(Error::Internal("ffmpeg version check failed".to_string()));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        let first_line = version.lines().next().unwrap_or("unknown");
        Ok(first_line.to_string())
    }

    /// Pick the container format based on the encoders the local ffmpeg
    /// build offers; mp4 unless mpeg4 is missing and mjpeg is present.
    async fn probe_container() -> VideoContainer {
        let output = Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                let encoders = String::from_utf8_lossy(&out.stdout);
                if encoders.contains(" mpeg4") {
                    VideoContainer::Mp4
                } else if encoders.contains(" mjpeg") {
                    tracing::warn!("mpeg4 encoder unavailable, falling back to avi/mjpeg");
                    VideoContainer::Avi
                } else {
                    VideoContainer::Mp4
                }
            }
            _ => {
                tracing::warn!("ffmpeg encoder probe failed, assuming mp4");
                VideoContainer::Mp4
            }
        }
    }

    /// Record one clip per configured source, all over the same wall-clock
    /// window
    async fn record_batch(&self, duration: Duration, fps: u32) -> RecordingBatch {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();

        let recordings = join_all(self.sources.iter().map(|source| async {
            let outcome = self
                .record_source(source, &stamp, duration, fps)
                .await
                .unwrap_or_else(|error| {
                    tracing::warn!(
                        camera = %source.label,
                        error = %error,
                        "Source recording failed"
                    );
                    RecordingOutcome::Failed { error }
                });
            SourceRecording {
                label: source.label.clone(),
                outcome,
            }
        }))
        .await;

        let batch = RecordingBatch { recordings };
        tracing::info!(
            total = batch.recordings.len(),
            succeeded = batch.success_count(),
            "Recording batch complete"
        );
        batch
    }

    /// Record a single source
    ///
    /// Uses kill_on_drop(true) so the ffmpeg child is reaped on every exit
    /// path: when the deadline fires and the future is cancelled, the Child
    /// is dropped and SIGKILL is sent, releasing the capture device.
    async fn record_source(
        &self,
        source: &CameraSource,
        stamp: &str,
        duration: Duration,
        fps: u32,
    ) -> Result<RecordingOutcome> {
        if !Path::new(&source.device).exists() {
            return Err(Error::CameraOpen {
                source_label: source.label.clone(),
                message: format!("device {} not found", source.device),
            });
        }

        let path = self
            .video_dir
            .join(clip_filename(&source.label, stamp, self.container));

        tracing::info!(
            camera = %source.label,
            device = %source.device,
            path = %path.display(),
            duration_sec = duration.as_secs(),
            fps = fps,
            "Recording clip"
        );

        let child = Command::new("ffmpeg")
            .args([
                "-f",
                "v4l2",
                "-framerate",
                &fps.to_string(),
                "-i",
                &source.device,
                "-t",
                &duration.as_secs().to_string(),
                "-vcodec",
                self.container.codec(),
                "-loglevel",
                "info",
                "-y",
            ])
            .arg(&path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::CameraOpen {
                source_label: source.label.clone(),
                message: format!("ffmpeg spawn failed: {}", e),
            })?;

        let deadline = duration + RECORD_GRACE;
        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                Self::discard_partial(&path).await;
                return Err(Error::CameraWrite {
                    source_label: source.label.clone(),
                    message: format!("ffmpeg execution failed: {}", e),
                });
            }
            Err(_) => {
                // Deadline fired: the child was dropped and killed, the
                // device is free again
                Self::discard_partial(&path).await;
                tracing::warn!(
                    camera = %source.label,
                    deadline_sec = deadline.as_secs(),
                    "Recording deadline exceeded, ffmpeg killed via kill_on_drop"
                );
                return Err(Error::CameraWrite {
                    source_label: source.label.clone(),
                    message: format!("recording exceeded {}s deadline", deadline.as_secs()),
                });
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            Self::discard_partial(&path).await;
            return Err(Error::CameraWrite {
                source_label: source.label.clone(),
                message: format!(
                    "ffmpeg exited with {}: {}",
                    output.status,
                    stderr.lines().last().unwrap_or("").trim()
                ),
            });
        }

        let frames = parse_frame_count(&stderr);
        if frames == 0 {
            // An empty clip is a failure, not an empty success
            Self::discard_partial(&path).await;
            return Err(Error::CameraWrite {
                source_label: source.label.clone(),
                message: "zero frames captured".to_string(),
            });
        }

        tracing::info!(
            camera = %source.label,
            path = %path.display(),
            frames = frames,
            "Clip recorded"
        );

        Ok(RecordingOutcome::Recorded { path, frames })
    }

    async fn discard_partial(path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "Partial clip cleanup failed");
            }
        }
    }
}

#[async_trait]
impl ClipRecorder for RecordingService {
    async fn record_all(&self, duration: Duration, fps: u32) -> RecordingBatch {
        self.record_batch(duration, fps).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_filenames_combine_label_stamp_and_container() {
        assert_eq!(
            clip_filename("outside", "20260807_153012", VideoContainer::Mp4),
            "outside_20260807_153012.mp4"
        );
        assert_eq!(
            clip_filename("inside", "20260807_153012", VideoContainer::Avi),
            "inside_20260807_153012.avi"
        );
    }

    #[test]
    fn frame_count_takes_last_progress_line() {
        let stderr = "frame=   52 fps= 20 q=5.0 size=     256kB\r\
                      frame=  198 fps= 20 q=5.0 size=    1024kB\r\
                      frame=  200 fps= 20 q=5.0 Lsize=    1100kB\n\
                      video:1000kB audio:0kB";
        assert_eq!(parse_frame_count(stderr), 200);
    }

    #[test]
    fn frame_count_defaults_to_zero() {
        assert_eq!(parse_frame_count(""), 0);
        assert_eq!(parse_frame_count("Input/output error"), 0);
        assert_eq!(parse_frame_count("frame=garbage"), 0);
    }

    #[tokio::test]
    async fn missing_device_fails_without_touching_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let service = RecordingService::new(
            dir.path().to_path_buf(),
            vec![CameraSource {
                label: "outside".into(),
                device: dir.path().join("no_such_video0").display().to_string(),
            }],
        )
        .await
        .unwrap();

        let batch = service.record_all(Duration::from_secs(1), 20).await;
        assert_eq!(batch.recordings.len(), 1);
        assert!(!batch.is_usable());
        match &batch.recordings[0].outcome {
            RecordingOutcome::Failed { error } => {
                assert!(matches!(error, Error::CameraOpen { .. }))
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn new_creates_video_directory() {
        let dir = tempfile::tempdir().unwrap();
        let video_dir = dir.path().join("clips");
        RecordingService::new(video_dir.clone(), Vec::new())
            .await
            .unwrap();
        assert!(video_dir.is_dir());
    }
}
