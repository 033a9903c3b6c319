//! Error types for transcode specs.

use std::path::PathBuf;
use thiserror::Error;

/// A [`TranscodeSpec`](super::TranscodeSpec) that cannot be run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranscodeError {
    #[error("End time must be greater than start time ({start_ms} ms >= {end_ms} ms)")]
    InvalidTrim { start_ms: u64, end_ms: u64 },

    #[error("Clip must be at least {min_ms} ms long (got {length_ms} ms)")]
    ClipTooShort { length_ms: u64, min_ms: u64 },

    #[error("End time {end_ms} ms is past the end of the input ({duration_ms} ms)")]
    TrimPastEnd { end_ms: u64, duration_ms: u64 },

    #[error("No output directory selected for {path}")]
    MissingOutputDirectory { path: PathBuf },

    #[error("Output would overwrite the input: {path}")]
    OutputIsInput { path: PathBuf },

    #[error("Width and height must be set together")]
    PartialDimensions,

    #[error("Unsupported format: {container}")]
    UnsupportedContainer { container: String },

    #[error("No {kind} codecs available for format: {container}")]
    NoCodecs {
        kind: &'static str,
        container: String,
    },

    #[error("{kind} codec {codec} not allowed for format {container}")]
    CodecNotAllowed {
        kind: &'static str,
        codec: String,
        container: String,
    },
}
