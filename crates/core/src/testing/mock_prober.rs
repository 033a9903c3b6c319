//! Mock prober for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::probe::{MediaInfo, MediaProber, ProbeError};

/// Failure the mock can be told to produce.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeFailure {
    NotFound,
    Parse(String),
    Timeout,
}

impl ProbeFailure {
    fn into_error(self, path: &Path) -> ProbeError {
        match self {
            Self::NotFound => ProbeError::InputNotFound {
                path: path.to_path_buf(),
            },
            Self::Parse(reason) => ProbeError::parse(reason),
            Self::Timeout => ProbeError::Timeout { timeout_secs: 0 },
        }
    }
}

/// In-memory `MediaProber` with per-path results and call recording.
///
/// Paths without a configured result fall back to the default info if one
/// is set, and to `InputNotFound` otherwise.
#[derive(Debug, Clone, Default)]
pub struct MockProber {
    results: Arc<RwLock<HashMap<PathBuf, MediaInfo>>>,
    default_info: Arc<RwLock<Option<MediaInfo>>>,
    next_failure: Arc<RwLock<Option<ProbeFailure>>>,
    calls: Arc<RwLock<Vec<PathBuf>>>,
}

impl MockProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_result(&self, path: impl AsRef<Path>, info: MediaInfo) {
        self.results
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), info);
    }

    pub async fn set_default_info(&self, info: MediaInfo) {
        *self.default_info.write().await = Some(info);
    }

    /// The next probe fails with `failure`, then behaviour returns to normal.
    pub async fn fail_next(&self, failure: ProbeFailure) {
        *self.next_failure.write().await = Some(failure);
    }

    pub async fn calls(&self) -> Vec<PathBuf> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl MediaProber for MockProber {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError> {
        self.calls.write().await.push(path.to_path_buf());

        if let Some(failure) = self.next_failure.write().await.take() {
            return Err(failure.into_error(path));
        }

        if let Some(info) = self.results.read().await.get(path) {
            return Ok(info.clone());
        }

        match self.default_info.read().await.as_ref() {
            Some(info) => Ok(info.clone()),
            None => Err(ProbeFailure::NotFound.into_error(path)),
        }
    }
}
