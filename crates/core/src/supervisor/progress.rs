//! Incremental parsing of engine progress output.
//!
//! With `-progress pipe:2` the engine writes `key=value` blocks terminated by
//! `progress=continue` or `progress=end`. Classic stats lines
//! (`frame=  42 fps=... time=00:00:01.68 ... speed=1.2x`) are understood too.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::ConversionProgress;

const PROGRESS_KEYS: &[&str] = &[
    "frame",
    "fps",
    "bitrate",
    "total_size",
    "out_time_us",
    "out_time_ms",
    "out_time",
    "dup_frames",
    "drop_frames",
    "speed",
    "progress",
];

static STATS_TIME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"time=\s*(-?\d+):(\d+):(\d+(?:\.\d+)?)").ok());
static STATS_SPEED: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"speed=\s*(\d+(?:\.\d+)?)x").ok());
static STATS_FPS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"fps=\s*(\d+(?:\.\d+)?)").ok());

/// Stateful parser fed one line at a time.
pub struct ProgressParser {
    clip_secs: f64,
    processed_secs: f64,
    speed: Option<f64>,
    fps: Option<f64>,
    finished: bool,
}

impl ProgressParser {
    /// `clip_secs` is the length of the output clip, used for percentages.
    pub fn new(clip_secs: f64) -> Self {
        Self {
            clip_secs,
            processed_secs: 0.0,
            speed: None,
            fps: None,
            finished: false,
        }
    }

    /// Whether `line` belongs to a `-progress` key/value block.
    pub fn is_progress_line(line: &str) -> bool {
        match line.trim().split_once('=') {
            Some((key, value)) => PROGRESS_KEYS.contains(&key) && !value.contains('='),
            None => false,
        }
    }

    /// Whether the engine reported `progress=end`.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Feeds one line. Returns a progress signal when the line completes one.
    pub fn parse_line(&mut self, line: &str) -> Option<ConversionProgress> {
        let line = line.trim();

        if Self::is_progress_line(line) {
            let (key, value) = line.split_once('=')?;
            let value = value.trim();
            match key {
                "out_time_us" | "out_time_ms" => {
                    // Both keys carry microseconds.
                    if let Some(us) = value.parse::<i64>().ok().filter(|us| *us >= 0) {
                        self.processed_secs = us as f64 / 1_000_000.0;
                    }
                }
                "out_time" => {
                    if let Some(secs) = parse_clock(value) {
                        self.processed_secs = secs;
                    }
                }
                "speed" => {
                    self.speed = value.trim_end_matches('x').trim().parse::<f64>().ok();
                }
                "fps" => {
                    self.fps = value.parse::<f64>().ok();
                }
                "progress" => {
                    if value == "end" {
                        self.finished = true;
                    }
                    return Some(self.snapshot());
                }
                _ => {}
            }
            return None;
        }

        let caps = STATS_TIME.as_ref()?.captures(line)?;
        let h: f64 = caps.get(1)?.as_str().parse().ok()?;
        let m: f64 = caps.get(2)?.as_str().parse().ok()?;
        let s: f64 = caps.get(3)?.as_str().parse().ok()?;
        if h < 0.0 {
            return None;
        }
        self.processed_secs = h * 3600.0 + m * 60.0 + s;
        self.speed = capture_f64(&STATS_SPEED, line);
        self.fps = capture_f64(&STATS_FPS, line);
        Some(self.snapshot())
    }

    fn snapshot(&self) -> ConversionProgress {
        let percent = if self.finished {
            100.0
        } else if self.clip_secs > 0.0 {
            (self.processed_secs / self.clip_secs * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        ConversionProgress {
            processed_secs: self.processed_secs,
            percent,
            speed: self.speed,
            fps: self.fps,
        }
    }
}

fn capture_f64(re: &Lazy<Option<Regex>>, line: &str) -> Option<f64> {
    re.as_ref()?.captures(line)?.get(1)?.as_str().parse().ok()
}

/// Parses `HH:MM:SS(.frac)`.
fn parse_clock(value: &str) -> Option<f64> {
    let mut parts = value.splitn(3, ':');
    let h: f64 = parts.next()?.parse().ok()?;
    let m: f64 = parts.next()?.parse().ok()?;
    let s: f64 = parts.next()?.parse().ok()?;
    (h >= 0.0).then(|| h * 3600.0 + m * 60.0 + s)
}
