use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    7878
}

/// External transcoding engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to the ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// ffmpeg `-loglevel` (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound for a single probe, in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Upper bound for a single conversion, in seconds. 0 disables the limit.
    #[serde(default)]
    pub timeout_secs: u64,

    /// How long a cancelled engine gets to exit on its own before it is killed.
    #[serde(default = "default_cancel_grace")]
    pub cancel_grace_ms: u64,

    /// Number of trailing diagnostic lines kept for failure reports.
    #[serde(default = "default_tail_lines")]
    pub diagnostic_tail_lines: usize,

    /// Capacity of the channel between the stderr reader and the supervisor.
    #[serde(default = "default_line_buffer")]
    pub line_buffer: usize,

    /// Capacity of the per-run event broadcast.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Remove partially written output after a failed or cancelled run.
    #[serde(default = "default_true")]
    pub cleanup_partial_output: bool,

    /// Extra arguments placed right before the output path.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_log_level() -> String {
    "warning".to_string()
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_cancel_grace() -> u64 {
    3000
}

fn default_tail_lines() -> usize {
    20
}

fn default_line_buffer() -> usize {
    256
}

fn default_event_buffer() -> usize {
    1024
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            log_level: default_log_level(),
            probe_timeout_secs: default_probe_timeout(),
            timeout_secs: 0,
            cancel_grace_ms: default_cancel_grace(),
            diagnostic_tail_lines: default_tail_lines(),
            line_buffer: default_line_buffer(),
            event_buffer: default_event_buffer(),
            cleanup_partial_output: true,
            extra_args: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Creates a config pointing at custom ffmpeg/ffprobe binaries.
    pub fn with_paths(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            ..Default::default()
        }
    }

    /// Sets the conversion timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the cancellation grace period in milliseconds.
    pub fn with_cancel_grace(mut self, cancel_grace_ms: u64) -> Self {
        self.cancel_grace_ms = cancel_grace_ms;
        self
    }

    /// Sets the diagnostic tail size.
    pub fn with_tail_lines(mut self, lines: usize) -> Self {
        self.diagnostic_tail_lines = lines;
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }

    /// `None` when conversions are unbounded.
    pub fn run_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Preference store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreferencesConfig {
    #[serde(default = "default_preferences_path")]
    pub path: PathBuf,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("clipwright-preferences.json")
}

/// Config view safe to hand to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub engine: SanitizedEngineConfig,
    pub preferences_path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEngineConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub log_level: String,
    pub probe_timeout_secs: u64,
    pub timeout_secs: u64,
    pub cancel_grace_ms: u64,
    pub diagnostic_tail_lines: usize,
    pub cleanup_partial_output: bool,
    pub extra_args_count: usize,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let engine = &config.engine;
        Self {
            server: config.server.clone(),
            engine: SanitizedEngineConfig {
                ffmpeg_path: engine.ffmpeg_path.clone(),
                ffprobe_path: engine.ffprobe_path.clone(),
                log_level: engine.log_level.clone(),
                probe_timeout_secs: engine.probe_timeout_secs,
                timeout_secs: engine.timeout_secs,
                cancel_grace_ms: engine.cancel_grace_ms,
                diagnostic_tail_lines: engine.diagnostic_tail_lines,
                cleanup_partial_output: engine.cleanup_partial_output,
                extra_args_count: engine.extra_args.len(),
            },
            preferences_path: config.preferences.path.clone(),
        }
    }
}
