use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::TranscodeError;
use crate::trim::{TrimRange, MIN_GAP_MS};

/// Fully resolved instructions for one conversion run.
///
/// Built fresh for every run and never mutated once handed to the supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeSpec {
    pub input: PathBuf,
    pub output: PathBuf,
    pub trim: TrimRange,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub video_bitrate_kbps: Option<u64>,
    pub audio_bitrate_kbps: Option<u64>,
    /// Container identifier, e.g. `mp4` or `mp3`.
    pub container: String,
    pub audio_only: bool,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
}

impl TranscodeSpec {
    /// Checks the conditions a run needs that resolution leaves to the caller.
    pub fn validate(&self) -> Result<(), TranscodeError> {
        if self.trim.end_ms <= self.trim.start_ms {
            return Err(TranscodeError::InvalidTrim {
                start_ms: self.trim.start_ms,
                end_ms: self.trim.end_ms,
            });
        }
        if self.trim.length_ms() < MIN_GAP_MS {
            return Err(TranscodeError::ClipTooShort {
                length_ms: self.trim.length_ms(),
                min_ms: MIN_GAP_MS,
            });
        }

        let has_dir = self
            .output
            .parent()
            .is_some_and(|p| !p.as_os_str().is_empty());
        if !has_dir {
            return Err(TranscodeError::MissingOutputDirectory {
                path: self.output.clone(),
            });
        }

        if self.output == self.input {
            return Err(TranscodeError::OutputIsInput {
                path: self.output.clone(),
            });
        }

        if self.width.is_some() != self.height.is_some() {
            return Err(TranscodeError::PartialDimensions);
        }

        Ok(())
    }

    /// [`validate`](Self::validate) plus the trim end against the probed duration.
    pub fn validate_for_duration(&self, duration_ms: u64) -> Result<(), TranscodeError> {
        self.validate()?;
        if self.trim.end_ms > duration_ms {
            return Err(TranscodeError::TrimPastEnd {
                end_ms: self.trim.end_ms,
                duration_ms,
            });
        }
        Ok(())
    }

    pub fn start_secs(&self) -> f64 {
        self.trim.start_ms as f64 / 1000.0
    }

    /// Length of the clip in seconds.
    pub fn clip_secs(&self) -> f64 {
        self.trim.length_secs()
    }
}
