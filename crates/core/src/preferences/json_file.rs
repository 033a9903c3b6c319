use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::traits::{PreferenceError, PreferenceStore};

/// Store backed by a JSON object on disk.
#[derive(Debug)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFilePreferenceStore {
    /// Opens `path`. A missing file starts empty; a malformed one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PreferenceError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Map::new(),
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(PreferenceError::Parse {
                        path,
                        reason: "top-level value is not an object".to_string(),
                    })
                }
                Err(e) => {
                    return Err(PreferenceError::Parse {
                        path,
                        reason: e.to_string(),
                    })
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => return Err(PreferenceError::Read { path, source }),
        };
        debug!(path = %path.display(), entries = values.len(), "Loaded preferences");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn save(&self) -> Result<(), PreferenceError> {
        let write_err = |source| PreferenceError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let text = serde_json::to_string_pretty(&self.values)
            .map_err(|e| write_err(std::io::Error::other(e)))?;

        // Write then rename so a crash never leaves a truncated file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }

    fn entries(&self) -> Map<String, Value> {
        self.values.clone()
    }
}
