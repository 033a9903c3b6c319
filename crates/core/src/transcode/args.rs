//! Engine argument vector for a [`TranscodeSpec`].

use std::ffi::OsString;

use super::error::TranscodeError;
use super::types::TranscodeSpec;
use crate::config::EngineConfig;
use crate::presets::{audio_codecs_for_format, video_codecs_for_format};

/// Builds the ffmpeg argument vector for `spec`.
///
/// Progress is requested as `key=value` blocks on stderr (`-progress pipe:2`)
/// so the supervisor can read it from the same stream as diagnostics.
/// Input and output paths are passed through as-is, so non-UTF-8 names survive.
pub fn build_transcode_args(
    spec: &TranscodeSpec,
    config: &EngineConfig,
) -> Result<Vec<OsString>, TranscodeError> {
    let mut head: Vec<String> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        config.log_level.clone(),
        "-progress".into(),
        "pipe:2".into(),
        "-nostats".into(),
    ];

    let start_secs = spec.start_secs();
    if start_secs > 0.0 {
        head.extend(["-ss".into(), format!("{:.3}", start_secs)]);
    }
    head.push("-i".into());

    let mut tail: Vec<String> = vec!["-t".into(), format!("{:.3}", spec.clip_secs())];
    if spec.audio_only {
        push_audio_only(&mut tail, spec)?;
    } else {
        push_video(&mut tail, spec)?;
    }
    tail.extend(config.extra_args.iter().cloned());

    let mut args: Vec<OsString> = head.into_iter().map(OsString::from).collect();
    args.push(spec.input.clone().into_os_string());
    args.extend(tail.into_iter().map(OsString::from));
    args.push(spec.output.clone().into_os_string());

    Ok(args)
}

/// Picks the explicit codec when permitted, else the first permitted one.
fn pick_codec<'a>(
    kind: &'static str,
    explicit: Option<&'a str>,
    allowed: &'static [&'static str],
    container: &str,
) -> Result<&'a str, TranscodeError> {
    let first = allowed.first().ok_or_else(|| TranscodeError::NoCodecs {
        kind,
        container: container.to_string(),
    })?;
    match explicit {
        Some(codec) if allowed.contains(&codec) => Ok(codec),
        Some(codec) => Err(TranscodeError::CodecNotAllowed {
            kind,
            codec: codec.to_string(),
            container: container.to_string(),
        }),
        None => Ok(*first),
    }
}

fn push_audio_only(args: &mut Vec<String>, spec: &TranscodeSpec) -> Result<(), TranscodeError> {
    let allowed = audio_codecs_for_format(&spec.container);
    let codec = pick_codec(
        "audio",
        spec.audio_codec.as_deref(),
        allowed,
        &spec.container,
    )?;

    args.extend(["-vn".into(), "-c:a".into(), codec.to_string()]);
    if let Some(ab) = spec.audio_bitrate_kbps {
        args.extend(["-b:a".into(), format!("{}k", ab)]);
    }
    Ok(())
}

fn push_video(args: &mut Vec<String>, spec: &TranscodeSpec) -> Result<(), TranscodeError> {
    let container = spec.container.as_str();

    let mut filters = Vec::new();
    if let (Some(w), Some(h)) = (spec.width, spec.height) {
        filters.push(format!("scale={}:{}", w, h));
    }
    if let Some(fps) = spec.fps {
        filters.push(format!("fps={}", fps));
    }
    if !filters.is_empty() {
        args.extend(["-vf".into(), filters.join(",")]);
    }

    let mut video_codec = pick_codec(
        "video",
        spec.video_codec.as_deref(),
        video_codecs_for_format(container),
        container,
    )?;

    // Audio in a video container never fails the run; an unknown choice falls
    // back to the container default.
    let allowed_audio = audio_codecs_for_format(container);
    let mut audio_codec: Option<&str> = spec
        .audio_codec
        .as_deref()
        .filter(|c| allowed_audio.contains(c))
        .or_else(|| allowed_audio.first().copied());

    let mut x264_preset = true;
    let mut pix_fmt = "yuv420p";
    let mut extra: Vec<String> = Vec::new();

    match video_codec {
        "prores_ks" => {
            pix_fmt = "yuv422p10le";
            extra.extend(["-profile:v".into(), "3".into()]);
        }
        "mjpeg" => pix_fmt = "yuvj422p",
        _ => {}
    }

    match container {
        "mp4" | "mov" => extra.extend(["-movflags".into(), "+faststart".into()]),
        "mkv" => {}
        "webm" => {
            video_codec = "libvpx-vp9";
            audio_codec = Some("libopus");
            x264_preset = false;
        }
        "avi" => audio_codec = Some("mp3"),
        "flv" => audio_codec = Some("aac"),
        "gif" => {
            video_codec = "gif";
            audio_codec = None;
            x264_preset = false;
            pix_fmt = "rgb8";
            extra.extend(["-an".into(), "-loop".into(), "0".into()]);
        }
        other => {
            return Err(TranscodeError::UnsupportedContainer {
                container: other.to_string(),
            })
        }
    }

    args.extend(["-c:v".into(), video_codec.to_string()]);
    if x264_preset && video_codec == "libx264" {
        args.extend(["-preset".into(), "medium".into()]);
    }

    // GIF has no bitrate control; the palette decides.
    if let Some(vb) = spec.video_bitrate_kbps.filter(|_| video_codec != "gif") {
        args.extend(["-b:v".into(), format!("{}k", vb)]);
    }

    if let Some(ac) = audio_codec {
        args.extend(["-c:a".into(), ac.to_string()]);
        if let Some(ab) = spec.audio_bitrate_kbps {
            args.extend(["-b:a".into(), format!("{}k", ab)]);
        }
    }

    args.extend(extra);
    args.extend(["-pix_fmt".into(), pix_fmt.into()]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trim::TrimRange;
    use std::path::PathBuf;

    fn video_spec(container: &str) -> TranscodeSpec {
        TranscodeSpec {
            input: PathBuf::from("/in/source.mov"),
            output: PathBuf::from(format!("/out/source.{}", container)),
            trim: TrimRange::new(0, 60_000),
            width: Some(960),
            height: Some(540),
            fps: Some(30.0),
            video_bitrate_kbps: Some(4000),
            audio_bitrate_kbps: Some(128),
            container: container.to_string(),
            audio_only: false,
            video_codec: None,
            audio_codec: None,
        }
    }

    fn audio_spec(container: &str) -> TranscodeSpec {
        TranscodeSpec {
            audio_only: true,
            width: None,
            height: None,
            fps: None,
            video_bitrate_kbps: None,
            output: PathBuf::from(format!("/out/source.{}", container)),
            ..video_spec(container)
        }
    }

    fn build(spec: &TranscodeSpec) -> Vec<String> {
        build_transcode_args(spec, &EngineConfig::default())
            .unwrap()
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect()
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_mp4_full_vector() {
        let args = build(&video_spec("mp4"));
        let expected: Vec<String> = [
            "-y",
            "-hide_banner",
            "-loglevel",
            "warning",
            "-progress",
            "pipe:2",
            "-nostats",
            "-i",
            "/in/source.mov",
            "-t",
            "60.000",
            "-vf",
            "scale=960:540,fps=30",
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-b:v",
            "4000k",
            "-c:a",
            "aac",
            "-b:a",
            "128k",
            "-movflags",
            "+faststart",
            "-pix_fmt",
            "yuv420p",
            "/out/source.mp4",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn test_seek_only_when_start_positive() {
        let mut spec = video_spec("mkv");
        assert!(!build(&spec).contains(&"-ss".to_string()));

        spec.trim = TrimRange::new(1_250, 3_750);
        let args = build(&spec);
        assert_eq!(value_after(&args, "-ss"), Some("1.250"));
        assert_eq!(value_after(&args, "-t"), Some("2.500"));
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let i = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < i);
    }

    #[test]
    fn test_audio_only_vector() {
        let args = build(&audio_spec("mp3"));
        assert!(args.contains(&"-vn".to_string()));
        assert_eq!(value_after(&args, "-c:a"), Some("libmp3lame"));
        assert_eq!(value_after(&args, "-b:a"), Some("128k"));
        assert!(!args.contains(&"-c:v".to_string()));
        assert!(!args.contains(&"-vf".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/out/source.mp3"));
    }

    #[test]
    fn test_audio_only_rejects_foreign_codec() {
        let mut spec = audio_spec("flac");
        spec.audio_codec = Some("libmp3lame".to_string());
        let err = build_transcode_args(&spec, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, TranscodeError::CodecNotAllowed { .. }));
    }

    #[test]
    fn test_audio_only_rejects_container_without_codecs() {
        let spec = audio_spec("gif");
        let err = build_transcode_args(&spec, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, TranscodeError::NoCodecs { kind: "audio", .. }));
    }

    #[test]
    fn test_video_rejects_foreign_codec() {
        let mut spec = video_spec("mp4");
        spec.video_codec = Some("prores_ks".to_string());
        assert!(build_transcode_args(&spec, &EngineConfig::default()).is_err());
    }

    #[test]
    fn test_video_unknown_audio_codec_falls_back() {
        let mut spec = video_spec("mkv");
        spec.audio_codec = Some("pcm_s16le".to_string());
        assert_eq!(value_after(&build(&spec), "-c:a"), Some("aac"));
    }

    #[test]
    fn test_unsupported_container() {
        let spec = video_spec("wmv");
        let err = build_transcode_args(&spec, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, TranscodeError::NoCodecs { kind: "video", .. }));
    }

    #[test]
    fn test_webm_forces_vp9_and_opus() {
        let args = build(&video_spec("webm"));
        assert_eq!(value_after(&args, "-c:v"), Some("libvpx-vp9"));
        assert_eq!(value_after(&args, "-c:a"), Some("libopus"));
        assert!(!args.contains(&"-preset".to_string()));
        assert!(!args.contains(&"-movflags".to_string()));
    }

    #[test]
    fn test_gif_drops_audio_and_bitrate() {
        let args = build(&video_spec("gif"));
        assert_eq!(value_after(&args, "-c:v"), Some("gif"));
        assert!(!args.contains(&"-c:a".to_string()));
        assert!(!args.contains(&"-b:v".to_string()));
        assert!(!args.contains(&"-b:a".to_string()));
        assert_eq!(value_after(&args, "-loop"), Some("0"));
        assert!(args.contains(&"-an".to_string()));
        assert_eq!(value_after(&args, "-pix_fmt"), Some("rgb8"));
    }

    #[test]
    fn test_avi_and_flv_force_audio() {
        assert_eq!(value_after(&build(&video_spec("avi")), "-c:a"), Some("mp3"));
        assert_eq!(value_after(&build(&video_spec("flv")), "-c:a"), Some("aac"));
    }

    #[test]
    fn test_prores_pixel_format_and_profile() {
        let mut spec = video_spec("mov");
        spec.video_codec = Some("prores_ks".to_string());
        let args = build(&spec);
        assert_eq!(value_after(&args, "-pix_fmt"), Some("yuv422p10le"));
        assert_eq!(value_after(&args, "-profile:v"), Some("3"));
        assert!(!args.contains(&"-preset".to_string()));
    }

    #[test]
    fn test_mjpeg_pixel_format() {
        let mut spec = video_spec("avi");
        spec.video_codec = Some("mjpeg".to_string());
        assert_eq!(value_after(&build(&spec), "-pix_fmt"), Some("yuvj422p"));
    }

    #[test]
    fn test_no_filters_without_dimensions_or_fps() {
        let mut spec = video_spec("mp4");
        spec.width = None;
        spec.height = None;
        spec.fps = None;
        assert!(!build(&spec).contains(&"-vf".to_string()));

        spec.fps = Some(23.976);
        assert_eq!(value_after(&build(&spec), "-vf"), Some("fps=23.976"));
    }

    #[test]
    fn test_extra_args_precede_output() {
        let config = EngineConfig {
            extra_args: vec!["-threads".into(), "2".into()],
            log_level: "error".into(),
            ..Default::default()
        };
        let args: Vec<String> = build_transcode_args(&video_spec("mkv"), &config)
            .unwrap()
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        let n = args.len();
        assert_eq!(&args[n - 3..n - 1], &["-threads".to_string(), "2".to_string()]);
        assert_eq!(value_after(&args, "-loglevel"), Some("error"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_paths_pass_through_unchanged() {
        use std::os::unix::ffi::OsStrExt;

        let mut spec = video_spec("mp4");
        spec.input = PathBuf::from(std::ffi::OsStr::from_bytes(b"/in/clip-\xff.mov"));
        spec.output = PathBuf::from(std::ffi::OsStr::from_bytes(b"/out/clip-\xfe.mp4"));

        let args = build_transcode_args(&spec, &EngineConfig::default()).unwrap();
        let i = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[i + 1], spec.input.as_os_str());
        assert_eq!(args.last().map(OsString::as_os_str), Some(spec.output.as_os_str()));
    }
}
