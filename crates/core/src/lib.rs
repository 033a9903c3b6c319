pub mod capabilities;
pub mod config;
pub mod estimate;
pub mod metrics;
pub mod preferences;
pub mod presets;
pub mod probe;
pub mod resolver;
pub mod supervisor;
pub mod testing;
pub mod transcode;
pub mod trim;

pub use capabilities::{EncoderStatus, EngineReport, ToolStatus};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, EngineConfig,
    SanitizedConfig,
};
pub use estimate::{estimate, estimate_size, format_size, resolution_scale};
pub use preferences::{
    JsonFilePreferenceStore, MemoryPreferenceStore, PreferenceError, PreferenceStore, Preferences,
};
pub use presets::PresetCatalog;
pub use probe::{FfprobeProber, MediaInfo, MediaProber, ProbeError};
pub use resolver::{resolve, resolve_detailed, Resolution, Selections};
pub use supervisor::{
    ConversionEvent, ConversionHandle, ConversionProgress, ConversionState, ConversionSupervisor,
    FailureKind, StartError,
};
pub use transcode::{build_transcode_args, TranscodeError, TranscodeSpec};
pub use trim::{Handle, TrimEditor, TrimRange};
