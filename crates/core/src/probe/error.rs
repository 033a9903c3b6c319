//! Error types for the media prober.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while probing an input file.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Input file does not exist.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// ffprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    EngineNotFound { path: PathBuf },

    /// ffprobe could not be started.
    #[error("Failed to start ffprobe: {0}")]
    Spawn(#[from] std::io::Error),

    /// ffprobe exited with a non-zero status.
    #[error("ffprobe failed (exit code {code:?}): {stderr}")]
    EngineFailed { code: Option<i32>, stderr: String },

    /// ffprobe did not finish in time.
    #[error("ffprobe timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Output did not contain a usable descriptor.
    #[error("Failed to parse media info: {reason}")]
    Parse { reason: String },
}

impl ProbeError {
    /// Creates a new parse error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputNotFound { .. } => "input_not_found",
            Self::EngineNotFound { .. } => "engine_not_found",
            Self::Spawn(_) => "spawn",
            Self::EngineFailed { .. } => "engine_failed",
            Self::Timeout { .. } => "timeout",
            Self::Parse { .. } => "parse",
        }
    }
}
