//! Engine capability detection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::config::EngineConfig;
use crate::presets::{
    audio_codecs_for_format, video_codecs_for_format, AUDIO_FORMATS, VIDEO_FORMATS,
};

const DETECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether a tool could be run, and what it reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolStatus {
    pub path: String,
    pub available: bool,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderStatus {
    pub codec: String,
    pub available: bool,
}

/// Snapshot of what the configured engine can do.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineReport {
    pub ffmpeg: ToolStatus,
    pub ffprobe: ToolStatus,
    /// Every codec named by the preset tables, with its availability.
    pub encoders: Vec<EncoderStatus>,
}

impl EngineReport {
    /// Runs `-version` on both tools and `-encoders` on ffmpeg.
    ///
    /// Never fails: anything that cannot be run is reported unavailable.
    pub async fn detect(config: &EngineConfig) -> Self {
        let ffmpeg = tool_status(&config.ffmpeg_path).await;
        let ffprobe = tool_status(&config.ffprobe_path).await;

        let listed = if ffmpeg.available {
            run_capture(&config.ffmpeg_path, &["-hide_banner", "-encoders"])
                .await
                .map(|out| parse_encoder_list(&out))
                .unwrap_or_default()
        } else {
            BTreeSet::new()
        };

        let encoders = table_codecs()
            .into_iter()
            .map(|codec| EncoderStatus {
                available: listed.contains(codec),
                codec: codec.to_string(),
            })
            .collect();

        debug!(
            ffmpeg = ffmpeg.available,
            ffprobe = ffprobe.available,
            encoders = listed.len(),
            "Engine capabilities detected"
        );

        Self {
            ffmpeg,
            ffprobe,
            encoders,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ffmpeg.available && self.ffprobe.available
    }

    pub fn has_encoder(&self, codec: &str) -> bool {
        self.encoders
            .iter()
            .any(|e| e.codec == codec && e.available)
    }
}

/// Distinct codec names across all container tables, sorted.
fn table_codecs() -> BTreeSet<&'static str> {
    VIDEO_FORMATS
        .iter()
        .chain(AUDIO_FORMATS.iter())
        .flat_map(|f| {
            video_codecs_for_format(f.value)
                .iter()
                .chain(audio_codecs_for_format(f.value).iter())
        })
        .copied()
        .collect()
}

async fn tool_status(path: &Path) -> ToolStatus {
    let version = run_capture(path, &["-version"])
        .await
        .map(|out| parse_version(&out));
    ToolStatus {
        path: path.display().to_string(),
        available: version.is_some(),
        version: version.flatten(),
    }
}

async fn run_capture(program: &Path, args: &[&str]) -> Option<String> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(DETECT_TIMEOUT, child).await {
        Ok(Ok(o)) if o.status.success() => Some(String::from_utf8_lossy(&o.stdout).to_string()),
        _ => None,
    }
}

/// Extracts "6.1.1" from "ffmpeg version 6.1.1 Copyright ...".
fn parse_version(output: &str) -> Option<String> {
    let first = output.lines().next()?;
    let mut words = first.split_whitespace();
    words.find(|w| *w == "version")?;
    words.next().map(str::to_string)
}

/// Encoder names from `ffmpeg -encoders`.
///
/// Entries look like ` V....D libx264  H.264 / AVC`; the legend above the
/// `------` separator is skipped.
fn parse_encoder_list(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .skip_while(|l| !l.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|l| {
            let mut cols = l.split_whitespace();
            let flags = cols.next()?;
            if flags.len() != 6 {
                return None;
            }
            cols.next().map(str::to_string)
        })
        .collect()
}
