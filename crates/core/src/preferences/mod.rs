//! Remembered user preferences.
//!
//! A small key/value port owned by the caller. The resolver and supervisor
//! never read it; callers pass the resolved values in.

mod json_file;
mod memory;
mod traits;
mod types;

pub use json_file::JsonFilePreferenceStore;
pub use memory::MemoryPreferenceStore;
pub use traits::{PreferenceError, PreferenceStore};
pub use types::{keys, Preferences};
