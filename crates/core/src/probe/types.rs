use serde::{Deserialize, Serialize};

/// Characteristics of an input file, produced once per probe.
///
/// `width`, `height` and `fps` are only present when `has_video` is true.
/// An absent bitrate means unknown, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub duration_seconds: f64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    /// Overall bitrate in kbps.
    pub bitrate_kbps: Option<u64>,
    /// Bitrate of the first audio stream in kbps.
    #[serde(default)]
    pub audio_bitrate_kbps: Option<u64>,
    pub has_video: bool,
}

impl MediaInfo {
    /// Audio-only descriptor.
    pub fn audio(duration_seconds: f64, bitrate_kbps: Option<u64>) -> Self {
        Self {
            duration_seconds,
            width: None,
            height: None,
            fps: None,
            bitrate_kbps,
            audio_bitrate_kbps: bitrate_kbps,
            has_video: false,
        }
    }

    /// Video descriptor with known dimensions.
    pub fn video(
        duration_seconds: f64,
        width: u32,
        height: u32,
        fps: Option<f64>,
        bitrate_kbps: Option<u64>,
    ) -> Self {
        Self {
            duration_seconds,
            width: Some(width),
            height: Some(height),
            fps,
            bitrate_kbps,
            audio_bitrate_kbps: None,
            has_video: true,
        }
    }

    /// Duration rounded down to whole milliseconds.
    pub fn duration_ms(&self) -> u64 {
        (self.duration_seconds.max(0.0) * 1000.0) as u64
    }

    /// Source dimensions when both are known.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}
