//! Test doubles for the probe port and the external engine.
//!
//! # Example
//!
//! ```rust,ignore
//! use clipwright_core::testing::{write_engine_script, MockProber};
//!
//! let prober = MockProber::new();
//! prober.set_result("/media/clip.mp4", MediaInfo::video(60.0, 1920, 1080, Some(30.0), Some(5000))).await;
//!
//! let ffmpeg = write_engine_script(dir.path(), "ffmpeg", "echo progress=end >&2");
//! ```

mod engine_script;
mod mock_prober;

#[cfg(unix)]
pub use engine_script::write_engine_script;
pub use mock_prober::{MockProber, ProbeFailure};
