//! Resolved transcode instructions and their engine argument vector.

mod args;
mod error;
mod types;

pub use args::build_transcode_args;
pub use error::TranscodeError;
pub use types::TranscodeSpec;
