//! Static container, codec and numeric preset tables.

use super::types::{FormatOption, NumericPreset, ResolutionPreset};

/// Containers offered when the output keeps a video track.
pub const VIDEO_FORMATS: &[FormatOption] = &[
    FormatOption::new("MP4", "mp4", "mp4"),
    FormatOption::new("MOV", "mov", "mov"),
    FormatOption::new("MKV", "mkv", "mkv"),
    FormatOption::new("WebM", "webm", "webm"),
    FormatOption::new("AVI", "avi", "avi"),
    FormatOption::new("FLV", "flv", "flv"),
    FormatOption::new("GIF", "gif", "gif"),
];

/// Containers offered for audio-only output.
pub const AUDIO_FORMATS: &[FormatOption] = &[
    FormatOption::new("MP3", "mp3", "mp3"),
    FormatOption::new("WAV", "wav", "wav"),
    FormatOption::new("FLAC", "flac", "flac"),
    FormatOption::new("M4A", "m4a", "m4a"),
    FormatOption::new("AAC", "aac", "aac"),
    FormatOption::new("OGG", "ogg", "ogg"),
    FormatOption::new("Opus", "opus", "opus"),
];

pub const FPS_PRESETS: &[NumericPreset] = &[
    NumericPreset::source("Source"),
    NumericPreset::fixed("60 fps", "60", 60.0),
    NumericPreset::fixed("30 fps", "30", 30.0),
    NumericPreset::fixed("25 fps", "25", 25.0),
    NumericPreset::fixed("24 fps", "24", 24.0),
    NumericPreset::fixed("15 fps", "15", 15.0),
    NumericPreset::fixed("10 fps", "10", 10.0),
    NumericPreset::custom(),
];

pub const VIDEO_BITRATE_PRESETS: &[NumericPreset] = &[
    NumericPreset::source("Source"),
    NumericPreset::fixed("8 Mbps", "8000", 8000.0),
    NumericPreset::fixed("5 Mbps", "5000", 5000.0),
    NumericPreset::fixed("4 Mbps", "4000", 4000.0),
    NumericPreset::fixed("2.5 Mbps", "2500", 2500.0),
    NumericPreset::fixed("1 Mbps", "1000", 1000.0),
    NumericPreset::custom(),
];

pub const AUDIO_BITRATE_PRESETS: &[NumericPreset] = &[
    NumericPreset::source("Source"),
    NumericPreset::fixed("320 kbps", "320", 320.0),
    NumericPreset::fixed("256 kbps", "256", 256.0),
    NumericPreset::fixed("192 kbps", "192", 192.0),
    NumericPreset::fixed("128 kbps", "128", 128.0),
    NumericPreset::fixed("96 kbps", "96", 96.0),
    NumericPreset::fixed("64 kbps", "64", 64.0),
    NumericPreset::custom(),
];

/// Resolution presets in display order. Earlier entries win when two presets
/// land on the same dimensions.
pub const RESOLUTION_PRESETS: &[ResolutionPreset] = &[
    ResolutionPreset::Source,
    ResolutionPreset::Scale { percent: 125 },
    ResolutionPreset::Scale { percent: 100 },
    ResolutionPreset::Scale { percent: 75 },
    ResolutionPreset::Scale { percent: 50 },
    ResolutionPreset::Custom,
];

/// Permitted video codecs for a container, in preference order.
pub fn video_codecs_for_format(format: &str) -> &'static [&'static str] {
    match format {
        "mp4" => &["libx264", "libx265"],
        "mov" => &["libx264", "libx265", "prores_ks", "mjpeg"],
        "mkv" => &["libx264", "libx265", "libvpx-vp9", "prores_ks", "mjpeg"],
        "webm" => &["libvpx-vp9"],
        "avi" => &["libx264", "mjpeg"],
        "flv" => &["libx264"],
        "gif" => &["gif"],
        _ => &[],
    }
}

/// Permitted audio codecs for a container, in preference order.
pub fn audio_codecs_for_format(format: &str) -> &'static [&'static str] {
    match format {
        "mp4" => &["aac", "libmp3lame"],
        "mov" => &["aac"],
        "mkv" => &["aac", "libopus", "libvorbis", "libmp3lame", "flac"],
        "webm" => &["libopus", "libvorbis"],
        "avi" => &["libmp3lame"],
        "flv" => &["aac"],
        "gif" => &[],
        "mp3" => &["libmp3lame"],
        "wav" => &["pcm_s16le"],
        "flac" => &["flac"],
        "m4a" | "aac" => &["aac"],
        "ogg" => &["libvorbis"],
        "opus" => &["libopus"],
        _ => &[],
    }
}

/// Codec choices exposed to the user for `(container, audio_only)`.
///
/// Audio-only output chooses the audio codec; otherwise the video codec is
/// the choice. An empty slice means no codec choice is exposed.
pub fn codec_options(format: &str, audio_only: bool) -> &'static [&'static str] {
    if audio_only {
        audio_codecs_for_format(format)
    } else {
        video_codecs_for_format(format)
    }
}

/// Container set for the given audio-only flag.
pub fn formats_for(audio_only: bool) -> &'static [FormatOption] {
    if audio_only {
        AUDIO_FORMATS
    } else {
        VIDEO_FORMATS
    }
}

/// Container used when the current selection is not valid for the set.
pub fn primary_format(audio_only: bool) -> &'static FormatOption {
    &formats_for(audio_only)[0]
}

/// Looks up a container in the set for `audio_only`.
pub fn find_format(value: &str, audio_only: bool) -> Option<&'static FormatOption> {
    formats_for(audio_only).iter().find(|f| f.value == value)
}

/// Looks up a container across both sets.
pub fn any_format(value: &str) -> Option<&'static FormatOption> {
    find_format(value, false).or_else(|| find_format(value, true))
}

/// Per-container correction applied to the nominal bitrate when estimating
/// output size.
pub fn format_multiplier(format: &str) -> f64 {
    match format {
        // PCM is far denser than any compressed bitrate suggests.
        "wav" => 3.8,
        // Palette-based frames compress poorly compared to video codecs.
        "gif" => 2.5,
        _ => 1.0,
    }
}

pub fn find_numeric<'a>(table: &'a [NumericPreset], value: &str) -> Option<&'a NumericPreset> {
    table.iter().find(|p| p.value == value)
}
