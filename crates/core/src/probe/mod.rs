//! Media prober.
//!
//! Runs the engine in inspection mode (`ffprobe`) against an input file and
//! maps its JSON descriptor onto a [`MediaInfo`] record. The [`MediaProber`]
//! trait is the seam used by callers so tests can substitute canned results.

mod error;
mod ffprobe;
mod traits;
mod types;

pub use error::ProbeError;
pub use ffprobe::{parse_frame_rate, parse_probe_output, FfprobeProber};
pub use traits::MediaProber;
pub use types::MediaInfo;
