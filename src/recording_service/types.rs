//! Recording data types

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Logical camera source: a label mapped to a physical capture device
///
/// Configured at startup, read-only during operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSource {
    pub label: String,
    pub device: String,
}

impl CameraSource {
    /// Parse a `label=device` comma list, e.g.
    /// `outside=/dev/video0,inside=/dev/video2`
    pub fn parse_list(raw: &str) -> Result<Vec<CameraSource>> {
        let mut sources = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (label, device) = entry.split_once('=').ok_or_else(|| {
                Error::Config(format!("invalid camera source {:?}, expected label=device", entry))
            })?;
            let (label, device) = (label.trim(), device.trim());
            if label.is_empty() || device.is_empty() {
                return Err(Error::Config(format!(
                    "invalid camera source {:?}, expected label=device",
                    entry
                )));
            }
            if sources.iter().any(|s: &CameraSource| s.label == label) {
                return Err(Error::Config(format!("duplicate camera label {:?}", label)));
            }
            sources.push(CameraSource {
                label: label.to_string(),
                device: device.to_string(),
            });
        }
        Ok(sources)
    }
}

/// Outcome of one source's recording
#[derive(Debug)]
pub enum RecordingOutcome {
    /// Clip written with at least one frame
    Recorded { path: PathBuf, frames: u64 },
    /// This source failed; sibling recordings are unaffected
    Failed { error: Error },
}

impl RecordingOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, RecordingOutcome::Recorded { .. })
    }
}

/// One source's labelled outcome within a batch
#[derive(Debug)]
pub struct SourceRecording {
    pub label: String,
    pub outcome: RecordingOutcome,
}

/// Per-detection batch of recording outcomes, one entry per source
///
/// A batch may be partially successful; it is usable as long as at least one
/// source produced a clip.
#[derive(Debug, Default)]
pub struct RecordingBatch {
    pub recordings: Vec<SourceRecording>,
}

impl RecordingBatch {
    /// Labels and paths of the clips that were written
    pub fn clips(&self) -> Vec<(&str, &PathBuf, u64)> {
        self.recordings
            .iter()
            .filter_map(|r| match &r.outcome {
                RecordingOutcome::Recorded { path, frames } => {
                    Some((r.label.as_str(), path, *frames))
                }
                RecordingOutcome::Failed { .. } => None,
            })
            .collect()
    }

    /// At least one source succeeded
    pub fn is_usable(&self) -> bool {
        self.recordings.iter().any(|r| r.outcome.is_recorded())
    }

    pub fn success_count(&self) -> usize {
        self.recordings
            .iter()
            .filter(|r| r.outcome.is_recorded())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_reads_labelled_devices() {
        let sources = CameraSource::parse_list("outside=/dev/video0, inside=/dev/video2").unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].label, "outside");
        assert_eq!(sources[0].device, "/dev/video0");
        assert_eq!(sources[1].label, "inside");
        assert_eq!(sources[1].device, "/dev/video2");
    }

    #[test]
    fn parse_list_rejects_malformed_entries() {
        assert!(CameraSource::parse_list("outside").is_err());
        assert!(CameraSource::parse_list("=/dev/video0").is_err());
        assert!(CameraSource::parse_list("outside=").is_err());
        assert!(CameraSource::parse_list("a=/dev/video0,a=/dev/video1").is_err());
    }

    #[test]
    fn parse_list_empty_is_empty() {
        assert!(CameraSource::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn batch_usable_with_one_success() {
        let batch = RecordingBatch {
            recordings: vec![
                SourceRecording {
                    label: "outside".into(),
                    outcome: RecordingOutcome::Recorded {
                        path: PathBuf::from("/tmp/outside_20260101_120000.mp4"),
                        frames: 200,
                    },
                },
                SourceRecording {
                    label: "inside".into(),
                    outcome: RecordingOutcome::Failed {
                        error: Error::CameraOpen {
                            source_label: "inside".into(),
                            message: "device not found".into(),
                        },
                    },
                },
            ],
        };

        assert!(batch.is_usable());
        assert_eq!(batch.success_count(), 1);
        let clips = batch.clips();
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].0, "outside");
        assert_eq!(clips[0].2, 200);
    }

    #[test]
    fn batch_with_no_successes_is_unusable() {
        let batch = RecordingBatch {
            recordings: vec![SourceRecording {
                label: "outside".into(),
                outcome: RecordingOutcome::Failed {
                    error: Error::CameraWrite {
                        source_label: "outside".into(),
                        message: "zero frames captured".into(),
                    },
                },
            }],
        };
        assert!(!batch.is_usable());
        assert!(batch.clips().is_empty());
    }
}
