//! Advisory output size estimation.
//!
//! Pure arithmetic over a resolved spec. The result is for display only and
//! never decides whether a conversion may run.

use crate::transcode::TranscodeSpec;

pub const MIN_RESOLUTION_SCALE: f64 = 0.2;
pub const MAX_RESOLUTION_SCALE: f64 = 1.5;

/// Shown when no estimate can be made.
pub const UNKNOWN_SIZE: &str = "--";

/// Ratio of target to source pixel area, clamped to
/// `[MIN_RESOLUTION_SCALE, MAX_RESOLUTION_SCALE]`.
///
/// Unknown source or target dimensions mean no scaling (1.0).
pub fn resolution_scale(source: Option<(u32, u32)>, target: Option<(u32, u32)>) -> f64 {
    match (source, target) {
        (Some((sw, sh)), Some((tw, th))) if sw > 0 && sh > 0 => {
            let ratio = (tw as f64 * th as f64) / (sw as f64 * sh as f64);
            ratio.clamp(MIN_RESOLUTION_SCALE, MAX_RESOLUTION_SCALE)
        }
        _ => 1.0,
    }
}

/// Estimated output size in bytes using the requested video bitrate.
pub fn estimate(
    spec: &TranscodeSpec,
    resolution_scale: f64,
    format_multiplier: f64,
) -> Option<u64> {
    estimate_with_video_bitrate(
        spec,
        spec.video_bitrate_kbps.map(|kbps| kbps as f64),
        resolution_scale,
        format_multiplier,
    )
}

/// Estimated output size in bytes with an explicit effective video bitrate.
///
/// `None` when the clip is empty or no bitrate is known.
pub fn estimate_with_video_bitrate(
    spec: &TranscodeSpec,
    video_kbps: Option<f64>,
    resolution_scale: f64,
    format_multiplier: f64,
) -> Option<u64> {
    let clip_secs = spec.clip_secs();
    if clip_secs <= 0.0 {
        return None;
    }

    let video = if spec.audio_only {
        0.0
    } else {
        video_kbps.unwrap_or(0.0) * resolution_scale
    };
    let audio = spec.audio_bitrate_kbps.unwrap_or(0) as f64;
    let total_kbps = video + audio;
    if !(total_kbps.is_finite() && total_kbps > 0.0) {
        return None;
    }

    let bytes = total_kbps * format_multiplier * 1000.0 * clip_secs / 8.0;
    (bytes.is_finite() && bytes > 0.0).then(|| (bytes.round() as u64).max(1))
}

/// Estimate rendered for display; [`UNKNOWN_SIZE`] when it cannot be made.
pub fn estimate_size(
    spec: &TranscodeSpec,
    resolution_scale: f64,
    format_multiplier: f64,
) -> String {
    format_size(estimate(spec, resolution_scale, format_multiplier))
}

/// Formats an estimate for display, e.g. `"6.64 MB"`.
pub fn format_size(bytes: Option<u64>) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let Some(bytes) = bytes else {
        return UNKNOWN_SIZE.to_string();
    };
    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GB", b / GB)
    } else if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}
