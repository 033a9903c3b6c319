use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use super::traits::PreferenceStore;

/// Known preference keys.
pub mod keys {
    pub const LAST_OUTPUT_DIR: &str = "last_output_dir";
    pub const ADVANCED_MODE: &str = "advanced_mode";
    pub const AUTO_REVEAL_AND_EXIT: &str = "auto_reveal_and_exit";
    pub const CODEC_SELECTION_ENABLED: &str = "codec_selection_enabled";
}

/// Typed view over the known keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub last_output_dir: Option<PathBuf>,
    #[serde(default)]
    pub advanced_mode: bool,
    #[serde(default)]
    pub auto_reveal_and_exit: bool,
    #[serde(default)]
    pub codec_selection_enabled: bool,
}

fn flag(store: &dyn PreferenceStore, key: &str) -> bool {
    store
        .get(key)
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

impl Preferences {
    /// Reads the known keys; missing or mistyped values take defaults.
    pub fn load(store: &dyn PreferenceStore) -> Self {
        Self {
            last_output_dir: store
                .get(keys::LAST_OUTPUT_DIR)
                .and_then(|v| v.as_str().map(PathBuf::from))
                .filter(|p| !p.as_os_str().is_empty()),
            advanced_mode: flag(store, keys::ADVANCED_MODE),
            auto_reveal_and_exit: flag(store, keys::AUTO_REVEAL_AND_EXIT),
            codec_selection_enabled: flag(store, keys::CODEC_SELECTION_ENABLED),
        }
    }

    /// Writes the known keys into `store`. Call `save` to persist.
    pub fn apply(&self, store: &mut dyn PreferenceStore) {
        let dir = match &self.last_output_dir {
            Some(p) => Value::String(p.to_string_lossy().to_string()),
            None => Value::Null,
        };
        store.set(keys::LAST_OUTPUT_DIR, dir);
        store.set(keys::ADVANCED_MODE, Value::Bool(self.advanced_mode));
        store.set(
            keys::AUTO_REVEAL_AND_EXIT,
            Value::Bool(self.auto_reveal_and_exit),
        );
        store.set(
            keys::CODEC_SELECTION_ENABLED,
            Value::Bool(self.codec_selection_enabled),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::MemoryPreferenceStore;
    use serde_json::json;

    #[test]
    fn test_defaults_when_empty() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(Preferences::load(&store), Preferences::default());
    }

    #[test]
    fn test_apply_then_load() {
        let mut store = MemoryPreferenceStore::new();
        let prefs = Preferences {
            last_output_dir: Some(PathBuf::from("/exports")),
            advanced_mode: true,
            auto_reveal_and_exit: false,
            codec_selection_enabled: true,
        };
        prefs.apply(&mut store);
        assert_eq!(Preferences::load(&store), prefs);
        assert_eq!(store.get(keys::ADVANCED_MODE), Some(json!(true)));
    }

    #[test]
    fn test_mistyped_values_fall_back() {
        let mut store = MemoryPreferenceStore::new();
        store.set(keys::ADVANCED_MODE, json!("yes"));
        store.set(keys::LAST_OUTPUT_DIR, json!(42));
        let prefs = Preferences::load(&store);
        assert!(!prefs.advanced_mode);
        assert_eq!(prefs.last_output_dir, None);
    }
}
