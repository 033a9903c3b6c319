use serde::Serialize;
use std::path::{Path, PathBuf};

use super::selections::{NumericSelection, Selections};
use crate::estimate::{self, resolution_scale};
use crate::presets::{
    codec_options, find_format, find_numeric, format_multiplier, formats_for, primary_format,
    FormatOption, NumericPreset, ResolutionPreset, AUDIO_BITRATE_PRESETS, CUSTOM, FPS_PRESETS,
    RESOLUTION_PRESETS, SOURCE, VIDEO_BITRATE_PRESETS,
};
use crate::probe::MediaInfo;
use crate::transcode::TranscodeSpec;

/// One entry of the resolution picker, already applied to the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionOption {
    pub value: String,
    pub label: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A resolved spec together with the derived values shown next to it.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub spec: TranscodeSpec,
    /// Selections after container/codec reconciliation.
    pub selections: Selections,
    pub formats: &'static [FormatOption],
    pub codec_options: &'static [&'static str],
    /// Video bitrate scaled by chosen/source fps. Used only for estimation.
    pub advisory_video_bitrate_kbps: Option<f64>,
    pub resolution_scale: f64,
    pub format_multiplier: f64,
    pub estimated_bytes: Option<u64>,
    pub estimated_size: String,
}

/// Audio-only when the source has no video or the user forced it.
pub fn effective_audio_only(selections: &Selections, info: &MediaInfo) -> bool {
    !info.has_video || selections.force_audio_only
}

/// Keeps `container` when it belongs to the set for `audio_only`, otherwise
/// falls back to that set's primary container.
pub fn reconcile_container(container: &str, audio_only: bool) -> &'static str {
    find_format(container, audio_only)
        .unwrap_or_else(|| primary_format(audio_only))
        .value
}

/// Keeps `current` when permitted, otherwise picks the first option, or
/// nothing when there are no options.
pub fn reconcile_codec(current: Option<&str>, options: &[&str]) -> Option<String> {
    current
        .filter(|c| options.contains(c))
        .or_else(|| options.first().copied())
        .map(str::to_string)
}

/// Rounds a scaled dimension to the nearest even integer, ties upward.
pub fn even_dimension(value: f64) -> u32 {
    (((value / 2.0) + 0.5).floor() * 2.0).max(2.0) as u32
}

/// Parses user-typed numeric text. Non-finite and non-positive values are absent.
pub fn parse_positive(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

fn scaled(info: &MediaInfo, percent: u32) -> Option<(u32, u32)> {
    let factor = percent as f64 / 100.0;
    info.dimensions().map(|(w, h)| {
        (
            even_dimension(w as f64 * factor),
            even_dimension(h as f64 * factor),
        )
    })
}

fn preset_dimensions(preset: &ResolutionPreset, info: &MediaInfo) -> Option<(u32, u32)> {
    match preset {
        ResolutionPreset::Source => info.dimensions(),
        ResolutionPreset::Scale { percent } => scaled(info, *percent),
        ResolutionPreset::Custom => None,
    }
}

/// Resolution picker entries for `info`, with duplicate dimensions removed.
///
/// Earlier presets win. "Custom" is always offered last.
pub fn resolution_options(info: &MediaInfo) -> Vec<ResolutionOption> {
    let mut seen: Vec<(u32, u32)> = Vec::new();
    let mut options = Vec::new();

    for preset in RESOLUTION_PRESETS {
        let dims = preset_dimensions(preset, info);
        match (preset, dims) {
            (ResolutionPreset::Custom, _) => {}
            (ResolutionPreset::Scale { .. }, None) => continue,
            (_, Some(d)) if seen.contains(&d) => continue,
            (_, Some(d)) => seen.push(d),
            (_, None) => {}
        }
        options.push(ResolutionOption {
            value: preset.value(),
            label: preset.label(),
            width: dims.map(|d| d.0),
            height: dims.map(|d| d.1),
        });
    }

    options
}

fn resolve_dimensions(selections: &Selections, info: &MediaInfo) -> Option<(u32, u32)> {
    let choice = &selections.resolution;
    match ResolutionPreset::from_value(&choice.preset)? {
        ResolutionPreset::Custom => {
            let w = parse_positive(&choice.custom_width)?.round() as u32;
            let h = parse_positive(&choice.custom_height)?.round() as u32;
            (w > 0 && h > 0).then_some((w, h))
        }
        preset => preset_dimensions(&preset, info),
    }
}

fn resolve_numeric(
    selection: &NumericSelection,
    table: &[NumericPreset],
    source: Option<f64>,
) -> Option<f64> {
    match selection.preset.as_str() {
        SOURCE => source,
        CUSTOM => parse_positive(&selection.custom),
        other => find_numeric(table, other).and_then(|p| p.amount),
    }
}

fn to_kbps(value: Option<f64>) -> Option<u64> {
    value.map(|v| v.round() as u64).filter(|v| *v > 0)
}

/// Output path for a file name and container extension.
///
/// Any extension on `filename` is replaced. Without a directory the result is
/// the bare file name, which a run rejects.
pub fn output_path(dir: Option<&Path>, filename: &str, ext: &str) -> PathBuf {
    let file = Path::new(filename.trim()).with_extension(ext);
    match dir {
        Some(d) if !d.as_os_str().is_empty() => d.join(file),
        _ => file,
    }
}

fn default_filename(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "output".to_string())
}

/// Resolves `selections` against `info` into a concrete spec.
pub fn resolve(selections: &Selections, info: &MediaInfo) -> TranscodeSpec {
    let mut normalized = selections.clone();
    normalized.normalize(info);
    build_spec(&normalized, info)
}

fn build_spec(selections: &Selections, info: &MediaInfo) -> TranscodeSpec {
    let audio_only = effective_audio_only(selections, info);

    let (dims, fps, video_bitrate_kbps) = if audio_only {
        (None, None, None)
    } else {
        (
            resolve_dimensions(selections, info),
            resolve_numeric(&selections.fps, FPS_PRESETS, info.fps),
            to_kbps(resolve_numeric(
                &selections.video_bitrate,
                VIDEO_BITRATE_PRESETS,
                info.bitrate_kbps.map(|b| b as f64),
            )),
        )
    };

    let audio_source = info.audio_bitrate_kbps.or(info.bitrate_kbps);
    let audio_bitrate_kbps = to_kbps(resolve_numeric(
        &selections.audio_bitrate,
        AUDIO_BITRATE_PRESETS,
        audio_source.map(|b| b as f64),
    ));

    let ext = find_format(&selections.container, audio_only)
        .map(|f| f.ext)
        .unwrap_or(selections.container.as_str());
    let filename = if selections.filename.trim().is_empty() {
        default_filename(&selections.input)
    } else {
        selections.filename.clone()
    };

    TranscodeSpec {
        input: selections.input.clone(),
        output: output_path(selections.output_dir.as_deref(), &filename, ext),
        trim: selections.trim,
        width: dims.map(|d| d.0),
        height: dims.map(|d| d.1),
        fps,
        video_bitrate_kbps,
        audio_bitrate_kbps,
        container: selections.container.clone(),
        audio_only,
        video_codec: selections.video_codec.clone(),
        audio_codec: selections.audio_codec.clone(),
    }
}

/// Resolves and also derives the advisory values shown next to the transcode spec.
pub fn resolve_detailed(selections: &Selections, info: &MediaInfo) -> Resolution {
    let mut normalized = selections.clone();
    normalized.normalize(info);
    let spec = build_spec(&normalized, info);

    // Fewer frames per second need proportionally less bitrate for the same
    // quality. This only feeds the estimate, never the engine.
    let advisory_video_bitrate_kbps = spec.video_bitrate_kbps.map(|kbps| {
        let kbps = kbps as f64;
        match (info.fps, spec.fps) {
            (Some(source), Some(chosen)) if source > 0.0 => kbps * chosen / source,
            _ => kbps,
        }
    });

    let scale = if spec.audio_only {
        1.0
    } else {
        resolution_scale(info.dimensions(), spec.width.zip(spec.height))
    };
    let multiplier = format_multiplier(&spec.container);
    let estimated_bytes = estimate::estimate_with_video_bitrate(
        &spec,
        advisory_video_bitrate_kbps,
        scale,
        multiplier,
    );

    Resolution {
        codec_options: if normalized.codec_selection_enabled {
            codec_options(&spec.container, spec.audio_only)
        } else {
            &[]
        },
        formats: formats_for(spec.audio_only),
        selections: normalized,
        advisory_video_bitrate_kbps,
        resolution_scale: scale,
        format_multiplier: multiplier,
        estimated_size: estimate::format_size(estimated_bytes),
        estimated_bytes,
        spec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolutionSelection;
    use crate::trim::TrimRange;

    fn hd() -> MediaInfo {
        MediaInfo::video(120.0, 1920, 1080, Some(30.0), Some(5000))
    }

    fn selections(info: &MediaInfo) -> Selections {
        let mut sel = Selections::for_media("/media/clip.mov", info);
        sel.output_dir = Some(PathBuf::from("/exports"));
        sel
    }

    #[test]
    fn test_source_preset_is_idempotent() {
        let info = hd();
        let sel = selections(&info);
        let first = resolve(&sel, &info);
        let second = resolve(&sel, &info);
        assert_eq!((first.width, first.height), (Some(1920), Some(1080)));
        assert_eq!(first, second);
    }

    #[test]
    fn test_half_resolution() {
        let info = hd();
        let mut sel = selections(&info);
        sel.resolution = ResolutionSelection::preset("50%");
        let spec = resolve(&sel, &info);
        assert_eq!((spec.width, spec.height), (Some(960), Some(540)));
    }

    #[test]
    fn test_scaled_presets_are_even() {
        for (w, h) in [(1921, 1081), (3, 5), (1, 1), (853, 479), (4095, 2161)] {
            let info = MediaInfo::video(1.0, w, h, None, None);
            for percent in [125, 100, 75, 50] {
                let (sw, sh) = scaled(&info, percent).unwrap();
                assert_eq!(sw % 2, 0, "{}x{} at {}%", w, h, percent);
                assert_eq!(sh % 2, 0, "{}x{} at {}%", w, h, percent);
            }
        }
    }

    #[test]
    fn test_even_dimension_rounds_ties_up() {
        assert_eq!(even_dimension(960.0), 960);
        assert_eq!(even_dimension(961.0), 962);
        assert_eq!(even_dimension(960.9), 960);
        assert_eq!(even_dimension(0.4), 2);
    }

    #[test]
    fn test_resolution_options_drop_duplicates() {
        let options = resolution_options(&hd());
        let values: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
        // 100% of an even source equals "source" and is dropped.
        assert_eq!(values, vec!["source", "125%", "75%", "50%", "custom"]);

        let mut pairs: Vec<_> = options
            .iter()
            .filter_map(|o| o.width.zip(o.height))
            .collect();
        let before = pairs.len();
        pairs.dedup();
        assert_eq!(pairs.len(), before);
    }

    #[test]
    fn test_resolution_options_tiny_source_collapses() {
        let info = MediaInfo::video(1.0, 2, 2, None, None);
        let options = resolution_options(&info);
        let values: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["source", "custom"]);
    }

    #[test]
    fn test_resolution_options_without_dimensions() {
        let info = MediaInfo::audio(10.0, None);
        let options = resolution_options(&info);
        assert_eq!(options.len(), 2);
        assert!(options.iter().all(|o| o.width.is_none()));
    }

    #[test]
    fn test_custom_dimensions() {
        let info = hd();
        let mut sel = selections(&info);
        sel.resolution = ResolutionSelection::custom(" 1280 ", "720");
        let spec = resolve(&sel, &info);
        assert_eq!((spec.width, spec.height), (Some(1280), Some(720)));

        sel.resolution = ResolutionSelection::custom("1280", "-720");
        let spec = resolve(&sel, &info);
        assert_eq!((spec.width, spec.height), (None, None));

        sel.resolution = ResolutionSelection::custom("inf", "720");
        assert_eq!(resolve(&sel, &info).width, None);
    }

    #[test]
    fn test_custom_fps_garbage_is_absent() {
        let info = hd();
        let mut sel = selections(&info);
        sel.fps = NumericSelection::custom("abc");
        assert_eq!(resolve(&sel, &info).fps, None);

        sel.fps = NumericSelection::custom("NaN");
        assert_eq!(resolve(&sel, &info).fps, None);

        sel.fps = NumericSelection::custom("12.5");
        assert_eq!(resolve(&sel, &info).fps, Some(12.5));
    }

    #[test]
    fn test_numeric_presets() {
        let info = hd();
        let mut sel = selections(&info);
        sel.fps = NumericSelection::preset("24");
        sel.video_bitrate = NumericSelection::preset("2500");
        sel.audio_bitrate = NumericSelection::preset("96");
        let spec = resolve(&sel, &info);
        assert_eq!(spec.fps, Some(24.0));
        assert_eq!(spec.video_bitrate_kbps, Some(2500));
        assert_eq!(spec.audio_bitrate_kbps, Some(96));
    }

    #[test]
    fn test_unknown_preset_is_absent() {
        let info = hd();
        let mut sel = selections(&info);
        sel.fps = NumericSelection::preset("42");
        sel.resolution = ResolutionSelection::preset("huge");
        let spec = resolve(&sel, &info);
        assert_eq!(spec.fps, None);
        assert_eq!(spec.width, None);
    }

    #[test]
    fn test_source_bitrates() {
        let mut info = hd();
        let sel = selections(&info);
        let spec = resolve(&sel, &info);
        assert_eq!(spec.video_bitrate_kbps, Some(5000));
        // Audio "source" falls back to the overall bitrate.
        assert_eq!(spec.audio_bitrate_kbps, Some(5000));

        info.audio_bitrate_kbps = Some(192);
        assert_eq!(resolve(&sel, &info).audio_bitrate_kbps, Some(192));

        info.bitrate_kbps = None;
        info.audio_bitrate_kbps = None;
        let spec = resolve(&sel, &info);
        assert_eq!(spec.video_bitrate_kbps, None);
        assert_eq!(spec.audio_bitrate_kbps, None);
    }

    #[test]
    fn test_fps_ratio_is_advisory_only() {
        let info = hd();
        let mut sel = selections(&info);
        sel.fps = NumericSelection::preset("15");
        sel.video_bitrate = NumericSelection::preset("4000");
        let resolution = resolve_detailed(&sel, &info);
        assert_eq!(resolution.spec.video_bitrate_kbps, Some(4000));
        assert_eq!(resolution.advisory_video_bitrate_kbps, Some(2000.0));
    }

    #[test]
    fn test_audio_only_drops_video_fields() {
        let info = hd();
        let mut sel = selections(&info);
        sel.resolution = ResolutionSelection::preset("50%");
        sel.fps = NumericSelection::preset("30");
        sel.set_force_audio_only(true, &info);
        let spec = resolve(&sel, &info);
        assert!(spec.audio_only);
        assert_eq!(spec.container, "mp3");
        assert_eq!((spec.width, spec.height, spec.fps), (None, None, None));
        assert_eq!(spec.video_bitrate_kbps, None);
        assert_eq!(spec.output, PathBuf::from("/exports/clip.mp3"));
    }

    #[test]
    fn test_no_video_source_is_audio_only() {
        let info = MediaInfo::audio(60.0, Some(256));
        let sel = Selections::for_media("/music/track.flac", &info);
        let spec = resolve(&sel, &info);
        assert!(spec.audio_only);
        assert_eq!(spec.audio_bitrate_kbps, Some(256));
    }

    #[test]
    fn test_resolve_reconciles_stale_container() {
        let info = hd();
        let mut sel = selections(&info);
        sel.container = "wav".to_string();
        let resolution = resolve_detailed(&sel, &info);
        assert_eq!(resolution.spec.container, "mp4");
        assert_eq!(resolution.selections.container, "mp4");
    }

    #[test]
    fn test_codec_selection() {
        let info = hd();
        let mut sel = selections(&info);
        sel.codec_selection_enabled = true;
        sel.container = "mov".to_string();
        sel.video_codec = Some("libvpx-vp9".to_string());
        let resolution = resolve_detailed(&sel, &info);
        assert_eq!(resolution.spec.video_codec.as_deref(), Some("libx264"));
        assert_eq!(
            resolution.codec_options,
            &["libx264", "libx265", "prores_ks", "mjpeg"]
        );

        sel.codec_selection_enabled = false;
        let resolution = resolve_detailed(&sel, &info);
        assert_eq!(resolution.spec.video_codec, None);
        assert!(resolution.codec_options.is_empty());
    }

    #[test]
    fn test_reconcile_codec_empty_list_clears() {
        assert_eq!(reconcile_codec(Some("aac"), &[]), None);
        assert_eq!(reconcile_codec(None, &["gif"]).as_deref(), Some("gif"));
        assert_eq!(
            reconcile_codec(Some("libx265"), &["libx264", "libx265"]).as_deref(),
            Some("libx265")
        );
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Some(Path::new("/out")), "holiday.final.mov", "mp4"),
            PathBuf::from("/out/holiday.final.mp4")
        );
        assert_eq!(
            output_path(Some(Path::new("/out")), "clip", "gif"),
            PathBuf::from("/out/clip.gif")
        );
        assert_eq!(output_path(None, "clip.mov", "mp3"), PathBuf::from("clip.mp3"));
    }

    #[test]
    fn test_missing_output_dir_yields_bare_filename() {
        let info = hd();
        let mut sel = selections(&info);
        sel.output_dir = None;
        let spec = resolve(&sel, &info);
        assert_eq!(spec.output, PathBuf::from("clip.mp4"));
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_empty_filename_uses_input_stem() {
        let info = hd();
        let mut sel = selections(&info);
        sel.filename = "  ".to_string();
        assert_eq!(resolve(&sel, &info).output, PathBuf::from("/exports/clip.mp4"));
    }

    #[test]
    fn test_trim_copied_verbatim() {
        let info = hd();
        let mut sel = selections(&info);
        sel.trim = TrimRange::new(2_000, 9_000);
        assert_eq!(resolve(&sel, &info).trim, TrimRange::new(2_000, 9_000));
    }

    #[test]
    fn test_detailed_estimate() {
        let info = hd();
        let mut sel = selections(&info);
        sel.resolution = ResolutionSelection::preset("50%");
        sel.video_bitrate = NumericSelection::preset("4000");
        sel.audio_bitrate = NumericSelection::preset("128");
        sel.trim = TrimRange::new(0, 60_000);
        let resolution = resolve_detailed(&sel, &info);
        assert!((resolution.resolution_scale - 0.25).abs() < 1e-12);
        assert_eq!(resolution.format_multiplier, 1.0);
        // (4000 * 0.25 + 128) kbps for 60 s.
        assert_eq!(resolution.estimated_bytes, Some(8_460_000));
        assert_eq!(resolution.estimated_size, "8.07 MB");
    }
}
