use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use clipwright_core::{
    Config, ConversionHandle, ConversionState, ConversionSupervisor, MediaInfo, MediaProber,
    PreferenceStore, SanitizedConfig,
};

use crate::api::WsBroadcaster;

/// Extra time allowed past the cancel grace period when shutting down.
const SHUTDOWN_SLACK: Duration = Duration::from_secs(5);

/// Shared application state
pub struct AppState {
    config: Config,
    prober: Arc<dyn MediaProber>,
    supervisor: ConversionSupervisor,
    /// Media info for every path probed in this session.
    probed: RwLock<HashMap<PathBuf, MediaInfo>>,
    /// Most recent conversion; kept after it finishes until reset.
    active: RwLock<Option<ConversionHandle>>,
    preferences: Mutex<Box<dyn PreferenceStore>>,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        prober: Arc<dyn MediaProber>,
        preferences: Box<dyn PreferenceStore>,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        let supervisor = ConversionSupervisor::new(config.engine.clone());
        Self {
            config,
            prober,
            supervisor,
            probed: RwLock::new(HashMap::new()),
            active: RwLock::new(None),
            preferences: Mutex::new(preferences),
            ws_broadcaster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn prober(&self) -> &dyn MediaProber {
        self.prober.as_ref()
    }

    pub fn supervisor(&self) -> &ConversionSupervisor {
        &self.supervisor
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }

    pub fn preferences(&self) -> &Mutex<Box<dyn PreferenceStore>> {
        &self.preferences
    }

    pub async fn remember_probe(&self, path: PathBuf, info: MediaInfo) {
        self.probed.write().await.insert(path, info);
    }

    pub async fn probed(&self, path: &Path) -> Option<MediaInfo> {
        self.probed.read().await.get(path).cloned()
    }

    pub async fn active(&self) -> Option<ConversionHandle> {
        self.active.read().await.clone()
    }

    pub async fn set_active(&self, handle: ConversionHandle) {
        *self.active.write().await = Some(handle);
    }

    /// Forgets a finished conversion. Returns false while one is still running.
    pub async fn reset_active(&self) -> bool {
        let mut active = self.active.write().await;
        if active.as_ref().is_some_and(|h| !h.is_finished()) {
            return false;
        }
        *active = None;
        true
    }

    /// Cancels a running conversion and waits for it to settle.
    pub async fn shutdown_active_conversion(&self) {
        let Some(handle) = self.active().await else {
            return;
        };
        if handle.is_finished() {
            return;
        }

        info!(conversion_id = %handle.id(), "Cancelling active conversion for shutdown");
        handle.cancel();
        let limit = self.config.engine.cancel_grace() + SHUTDOWN_SLACK;
        match tokio::time::timeout(limit, handle.wait()).await {
            Ok(ConversionState::Cancelled) => info!("Active conversion cancelled"),
            Ok(state) => info!(outcome = state.outcome(), "Active conversion settled"),
            Err(_) => warn!("Active conversion did not stop in time"),
        }
    }
}
