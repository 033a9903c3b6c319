//! Process supervisor.
//!
//! Launches the transcoding engine for a [`TranscodeSpec`](crate::transcode::TranscodeSpec),
//! reads its stderr line by line through a bounded channel, relays progress
//! and output to subscribers, and reports exactly one terminal state per run.
//!
//! # Example
//!
//! ```ignore
//! use clipwright_core::supervisor::ConversionSupervisor;
//!
//! let supervisor = ConversionSupervisor::new(EngineConfig::default());
//! let handle = supervisor.start(spec)?;
//!
//! let mut events = handle.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//! });
//!
//! match handle.wait().await {
//!     ConversionState::Succeeded { output_path } => println!("wrote {}", output_path.display()),
//!     other => println!("ended as {}", other.outcome()),
//! }
//! ```

mod handle;
mod progress;
mod runner;
mod tail;
mod types;

pub use handle::{ConversionHandle, HandleSnapshot};
pub use progress::ProgressParser;
pub use runner::ConversionSupervisor;
pub use tail::DiagnosticTail;
pub use types::{ConversionEvent, ConversionProgress, ConversionState, FailureKind, StartError};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::transcode::{TranscodeError, TranscodeSpec};
    use crate::trim::TrimRange;
    use std::path::PathBuf;

    fn spec(output: &str) -> TranscodeSpec {
        TranscodeSpec {
            input: PathBuf::from("/in/clip.mov"),
            output: PathBuf::from(output),
            trim: TrimRange::new(0, 1_000),
            width: None,
            height: None,
            fps: None,
            video_bitrate_kbps: None,
            audio_bitrate_kbps: None,
            container: "mp4".to_string(),
            audio_only: false,
            video_codec: None,
            audio_codec: None,
        }
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_spec() {
        let supervisor = ConversionSupervisor::new(EngineConfig::default());
        let err = supervisor.start(spec("clip.mp4")).unwrap_err();
        assert!(matches!(
            err,
            StartError::Invalid(TranscodeError::MissingOutputDirectory { .. })
        ));
        assert!(!supervisor.is_busy());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_terminal_failure() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("clip.mp4");
        std::fs::write(&output, b"existing").unwrap();

        let config = EngineConfig::with_paths("/nonexistent/ffmpeg", "/nonexistent/ffprobe");
        let supervisor = ConversionSupervisor::new(config);
        let handle = supervisor.start(spec(output.to_str().unwrap())).unwrap();

        match handle.wait().await {
            ConversionState::Failed {
                kind, diagnostic, ..
            } => {
                assert_eq!(kind, FailureKind::Spawn);
                assert!(diagnostic[0].contains("not found"));
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(!supervisor.is_busy());
        assert_eq!(handle.pid(), None);
        // Nothing was spawned, so nothing is cleaned up.
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_cancel_before_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("clip.mp4");
        let supervisor = ConversionSupervisor::new(EngineConfig::default());

        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        let handle = supervisor
            .start_with_cancel(spec(output.to_str().unwrap()), token)
            .unwrap();
        assert_eq!(handle.wait().await, ConversionState::Cancelled);
    }
}
