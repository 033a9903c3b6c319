//! Option resolver.
//!
//! Turns the user's current choices (often relative to the source, such as
//! "Source" or "50%") plus the probed [`MediaInfo`](crate::probe::MediaInfo)
//! into a concrete [`TranscodeSpec`](crate::transcode::TranscodeSpec).
//! Resolution is an explicit pure function; callers re-run it whenever an
//! input changes.

mod resolve;
mod selections;

pub use resolve::{
    effective_audio_only, even_dimension, output_path, parse_positive, reconcile_codec,
    reconcile_container, resolution_options, resolve, resolve_detailed, Resolution,
    ResolutionOption,
};
pub use selections::{NumericSelection, ResolutionSelection, Selections};
