//! Types for the conversion supervisor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::transcode::TranscodeError;

/// Why a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The engine process could not be started.
    Spawn,
    /// The engine exited unsuccessfully.
    Engine,
    /// The run exceeded the configured timeout and was killed.
    Timeout,
}

/// Lifecycle of one conversion run.
///
/// A run passes through `Starting`, then usually `Running`, optionally
/// `Cancelling`, and ends in exactly one terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConversionState {
    Starting,
    Running {
        pid: Option<u32>,
    },
    Cancelling,
    Succeeded {
        output_path: PathBuf,
    },
    Failed {
        kind: FailureKind,
        exit_code: Option<i32>,
        message: String,
        /// Last diagnostic lines written by the engine, oldest first.
        diagnostic: Vec<String>,
    },
    Cancelled,
}

impl ConversionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Failed { .. } | Self::Cancelled
        )
    }

    /// Short label used for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running { .. } => "running",
            Self::Cancelling => "cancelling",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed {
                kind: FailureKind::Spawn,
                ..
            } => "failed_spawn",
            Self::Failed {
                kind: FailureKind::Engine,
                ..
            } => "failed_engine",
            Self::Failed {
                kind: FailureKind::Timeout,
                ..
            } => "failed_timeout",
            Self::Cancelled => "cancelled",
        }
    }

    /// Diagnostic text for failures, joined by newlines.
    pub fn diagnostic_text(&self) -> Option<String> {
        match self {
            Self::Failed { diagnostic, .. } => Some(diagnostic.join("\n")),
            _ => None,
        }
    }
}

/// A progress signal extracted from the engine's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionProgress {
    /// Seconds of the clip processed so far.
    pub processed_secs: f64,
    /// Percentage of the clip processed, capped at 100.
    pub percent: f64,
    /// Encoding speed relative to realtime.
    pub speed: Option<f64>,
    pub fps: Option<f64>,
}

/// Event stream of a run, delivered in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversionEvent {
    /// The engine process started.
    Started { pid: Option<u32> },
    /// One line of engine output, in write order.
    Output { line: String },
    Progress(ConversionProgress),
    /// The engine was asked to stop.
    Cancelling,
    /// The run reached its terminal state. Sent exactly once.
    Finished(ConversionState),
}

/// A run that was rejected before anything was spawned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StartError {
    #[error("A conversion is already running")]
    Busy,

    #[error(transparent)]
    Invalid(#[from] TranscodeError),
}
