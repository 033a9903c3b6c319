use serde_json::{Map, Value};

use super::traits::{PreferenceError, PreferenceStore};

/// Store that keeps everything in memory. `save` is a no-op.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferenceStore {
    values: Map<String, Value>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn save(&self) -> Result<(), PreferenceError> {
        Ok(())
    }

    fn entries(&self) -> Map<String, Value> {
        self.values.clone()
    }
}
