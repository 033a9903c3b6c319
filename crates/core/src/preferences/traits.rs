use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Failed to read preferences from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write preferences to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Preferences file {path} is not a JSON object: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Key/value store for remembered preferences.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&mut self, key: &str, value: Value);

    /// Persists pending changes.
    fn save(&self) -> Result<(), PreferenceError>;

    /// Every stored entry.
    fn entries(&self) -> Map<String, Value>;
}
