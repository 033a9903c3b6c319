use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::resolve::{effective_audio_only, reconcile_codec, reconcile_container};
use crate::presets::{audio_codecs_for_format, codec_options, primary_format, SOURCE};
use crate::probe::MediaInfo;
use crate::trim::TrimRange;

/// A numeric option: a preset value plus the raw text typed for "custom".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSelection {
    pub preset: String,
    #[serde(default)]
    pub custom: String,
}

impl NumericSelection {
    pub fn source() -> Self {
        Self::preset(SOURCE)
    }

    pub fn preset(value: impl Into<String>) -> Self {
        Self {
            preset: value.into(),
            custom: String::new(),
        }
    }

    pub fn custom(text: impl Into<String>) -> Self {
        Self {
            preset: crate::presets::CUSTOM.to_string(),
            custom: text.into(),
        }
    }
}

impl Default for NumericSelection {
    fn default() -> Self {
        Self::source()
    }
}

/// Resolution choice: a preset value plus raw custom width/height text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSelection {
    pub preset: String,
    #[serde(default)]
    pub custom_width: String,
    #[serde(default)]
    pub custom_height: String,
}

impl ResolutionSelection {
    pub fn preset(value: impl Into<String>) -> Self {
        Self {
            preset: value.into(),
            custom_width: String::new(),
            custom_height: String::new(),
        }
    }

    pub fn custom(width: impl Into<String>, height: impl Into<String>) -> Self {
        Self {
            preset: crate::presets::CUSTOM.to_string(),
            custom_width: width.into(),
            custom_height: height.into(),
        }
    }
}

impl Default for ResolutionSelection {
    fn default() -> Self {
        Self::preset(SOURCE)
    }
}

/// Every current user choice that feeds resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selections {
    pub input: PathBuf,
    #[serde(default)]
    pub resolution: ResolutionSelection,
    #[serde(default)]
    pub fps: NumericSelection,
    #[serde(default)]
    pub video_bitrate: NumericSelection,
    #[serde(default)]
    pub audio_bitrate: NumericSelection,
    pub trim: TrimRange,
    pub container: String,
    #[serde(default)]
    pub video_codec: Option<String>,
    #[serde(default)]
    pub audio_codec: Option<String>,
    #[serde(default)]
    pub force_audio_only: bool,
    #[serde(default)]
    pub codec_selection_enabled: bool,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Output file name; any extension is replaced by the container's.
    #[serde(default)]
    pub filename: String,
}

impl Selections {
    /// Initial choices for a freshly probed file.
    pub fn for_media(input: impl Into<PathBuf>, info: &MediaInfo) -> Self {
        let input = input.into();
        let filename = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            input,
            resolution: ResolutionSelection::default(),
            fps: NumericSelection::default(),
            video_bitrate: NumericSelection::default(),
            audio_bitrate: NumericSelection::default(),
            trim: TrimRange::full(info.duration_ms()),
            container: primary_format(!info.has_video).value.to_string(),
            video_codec: None,
            audio_codec: None,
            force_audio_only: false,
            codec_selection_enabled: false,
            output_dir: None,
            filename,
        }
    }

    /// Flips the audio-only override and pulls the container and codecs back
    /// into the set valid for the new mode.
    pub fn set_force_audio_only(&mut self, on: bool, info: &MediaInfo) {
        self.force_audio_only = on;
        self.normalize(info);
    }

    /// Selects a container and re-derives the codec choice for it.
    pub fn set_container(&mut self, container: impl Into<String>, info: &MediaInfo) {
        self.container = container.into();
        self.normalize(info);
    }

    /// Reconciles container and codec choices with the effective mode.
    pub fn normalize(&mut self, info: &MediaInfo) {
        let audio_only = effective_audio_only(self, info);
        self.container = reconcile_container(&self.container, audio_only).to_string();

        if !self.codec_selection_enabled {
            self.video_codec = None;
            self.audio_codec = None;
            return;
        }

        let options = codec_options(&self.container, audio_only);
        if audio_only {
            self.audio_codec = reconcile_codec(self.audio_codec.as_deref(), options);
            self.video_codec = None;
        } else {
            self.video_codec = reconcile_codec(self.video_codec.as_deref(), options);
            let audio = audio_codecs_for_format(&self.container);
            self.audio_codec = self
                .audio_codec
                .take()
                .filter(|c| audio.contains(&c.as_str()));
        }
    }
}
