//! Preset and capability tables.
//!
//! Static data describing which containers can be produced, which codecs each
//! container permits, and the numeric presets (frame rate, bitrates,
//! resolution scales) offered next to a "Source" and a "Custom" choice.

mod tables;
mod types;

pub use tables::{
    any_format, audio_codecs_for_format, codec_options, find_format, find_numeric,
    format_multiplier, formats_for, primary_format, video_codecs_for_format,
    AUDIO_BITRATE_PRESETS, AUDIO_FORMATS, FPS_PRESETS, RESOLUTION_PRESETS, VIDEO_BITRATE_PRESETS,
    VIDEO_FORMATS,
};
pub use types::{FormatOption, NumericPreset, ResolutionPreset, CUSTOM, SOURCE};

use serde::Serialize;

/// Snapshot of every table, as served to the wizard.
#[derive(Debug, Clone, Serialize)]
pub struct PresetCatalog {
    pub video_formats: &'static [FormatOption],
    pub audio_formats: &'static [FormatOption],
    pub fps: &'static [NumericPreset],
    pub video_bitrates: &'static [NumericPreset],
    pub audio_bitrates: &'static [NumericPreset],
    pub resolutions: Vec<ResolutionEntry>,
    pub video_codecs: Vec<CodecEntry>,
    pub audio_codecs: Vec<CodecEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolutionEntry {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodecEntry {
    pub format: &'static str,
    pub codecs: &'static [&'static str],
}

impl PresetCatalog {
    pub fn new() -> Self {
        let codec_entries = |formats: &'static [FormatOption], audio: bool| {
            formats
                .iter()
                .map(|f| CodecEntry {
                    format: f.value,
                    codecs: if audio {
                        audio_codecs_for_format(f.value)
                    } else {
                        video_codecs_for_format(f.value)
                    },
                })
                .collect::<Vec<_>>()
        };

        let mut audio_codecs = codec_entries(VIDEO_FORMATS, true);
        audio_codecs.extend(codec_entries(AUDIO_FORMATS, true));

        Self {
            video_formats: VIDEO_FORMATS,
            audio_formats: AUDIO_FORMATS,
            fps: FPS_PRESETS,
            video_bitrates: VIDEO_BITRATE_PRESETS,
            audio_bitrates: AUDIO_BITRATE_PRESETS,
            resolutions: RESOLUTION_PRESETS
                .iter()
                .map(|p| ResolutionEntry {
                    label: p.label(),
                    value: p.value(),
                })
                .collect(),
            video_codecs: codec_entries(VIDEO_FORMATS, false),
            audio_codecs,
        }
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::new()
    }
}
