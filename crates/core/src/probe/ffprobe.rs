//! ffprobe-based prober implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use super::error::ProbeError;
use super::traits::MediaProber;
use super::types::MediaInfo;
use crate::config::EngineConfig;
use crate::metrics;

const PROBE_ARGS: [&str; 6] = [
    "-v",
    "error",
    "-print_format",
    "json",
    "-show_format",
    "-show_streams",
];

/// Probes files by running `ffprobe` and reading its JSON output.
pub struct FfprobeProber {
    config: EngineConfig,
}

impl FfprobeProber {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Creates a prober with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    async fn run_probe(&self, path: &Path) -> Result<MediaInfo, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let child = Command::new(&self.config.ffprobe_path)
            .args(PROBE_ARGS)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::EngineNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    ProbeError::Spawn(e)
                }
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match timeout(self.config.probe_timeout(), child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout_secs = self.config.probe_timeout_secs, "ffprobe timed out");
                return Err(ProbeError::Timeout {
                    timeout_secs: self.config.probe_timeout_secs,
                });
            }
        };

        if !output.status.success() {
            return Err(ProbeError::EngineFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let info = parse_probe_output(&stdout)?;
        debug!(
            duration = info.duration_seconds,
            has_video = info.has_video,
            width = ?info.width,
            height = ?info.height,
            "Probe complete"
        );
        Ok(info)
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    fn name(&self) -> &str {
        "ffprobe"
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError> {
        let started = Instant::now();
        let result = self.run_probe(path).await;
        let label = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::PROBES_TOTAL.with_label_values(&[label]).inc();
        metrics::PROBE_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());
        result
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
    streams: Option<Vec<ProbeStream>>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    bit_rate: Option<String>,
    #[serde(default)]
    disposition: Disposition,
}

#[derive(Default, Deserialize)]
struct Disposition {
    #[serde(default)]
    attached_pic: u8,
}

impl ProbeStream {
    fn is(&self, kind: &str) -> bool {
        self.codec_type.as_deref() == Some(kind)
    }

    fn bitrate_kbps(&self) -> Option<u64> {
        parse_kbps(self.bit_rate.as_deref())
    }
}

fn parse_kbps(bits_per_sec: Option<&str>) -> Option<u64> {
    bits_per_sec
        .and_then(|b| b.trim().parse::<u64>().ok())
        .map(|b| b / 1000)
        .filter(|kbps| *kbps > 0)
}

/// Parses ffprobe `-print_format json -show_format -show_streams` output.
pub fn parse_probe_output(output: &str) -> Result<MediaInfo, ProbeError> {
    let probe: ProbeOutput = serde_json::from_str(output)
        .map_err(|e| ProbeError::parse(format!("Failed to parse ffprobe output: {}", e)))?;

    let duration_seconds = probe
        .format
        .duration
        .as_deref()
        .ok_or_else(|| ProbeError::parse("Missing duration"))?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| ProbeError::parse("Invalid duration"))?;

    let streams = probe
        .streams
        .as_deref()
        .ok_or_else(|| ProbeError::parse("Missing streams"))?;

    // Cover art shows up as a video stream; it does not make the file a video.
    let video_stream = streams
        .iter()
        .find(|s| s.is("video") && s.disposition.attached_pic == 0);

    let audio_stream = streams.iter().find(|s| s.is("audio"));

    let (width, height, fps) = match video_stream {
        Some(vs) => (
            vs.width.filter(|w| *w > 0),
            vs.height.filter(|h| *h > 0),
            vs.avg_frame_rate
                .as_deref()
                .and_then(parse_frame_rate)
                .or_else(|| vs.r_frame_rate.as_deref().and_then(parse_frame_rate)),
        ),
        None => (None, None, None),
    };

    let bitrate_kbps = parse_kbps(probe.format.bit_rate.as_deref())
        .or_else(|| video_stream.and_then(ProbeStream::bitrate_kbps));

    Ok(MediaInfo {
        duration_seconds,
        width,
        height,
        fps,
        bitrate_kbps,
        audio_bitrate_kbps: audio_stream.and_then(ProbeStream::bitrate_kbps),
        has_video: video_stream.is_some(),
    })
}

/// Parses a frame rate like `"24000/1001"`, `"30/1"` or `"25"`.
///
/// Zero denominators, `"0/0"` and non-positive rates yield `None`.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let fps = match rate.trim().split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse::<f64>().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}
