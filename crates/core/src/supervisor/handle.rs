//! Observable, cancellable handle to one conversion run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::types::{ConversionEvent, ConversionProgress, ConversionState};
use crate::transcode::TranscodeSpec;

/// Caller side of a conversion run.
///
/// Cheap to clone. The supervisor is the only writer of the lifecycle state;
/// every clone observes the same run.
#[derive(Clone)]
pub struct ConversionHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    id: Uuid,
    spec: TranscodeSpec,
    started_at: DateTime<Utc>,
    pid: Arc<OnceLock<u32>>,
    state: watch::Receiver<ConversionState>,
    progress: watch::Receiver<Option<ConversionProgress>>,
    events: broadcast::Sender<ConversionEvent>,
    // Created before the run task starts so the first subscriber misses nothing.
    first_subscriber: Mutex<Option<broadcast::Receiver<ConversionEvent>>>,
    cancel: CancellationToken,
}

/// Point-in-time view of a handle, for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct HandleSnapshot {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub pid: Option<u32>,
    pub state: ConversionState,
    pub progress: Option<ConversionProgress>,
    pub spec: TranscodeSpec,
}

impl ConversionHandle {
    pub(crate) fn new(
        spec: TranscodeSpec,
        pid: Arc<OnceLock<u32>>,
        state: watch::Receiver<ConversionState>,
        progress: watch::Receiver<Option<ConversionProgress>>,
        events: broadcast::Sender<ConversionEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let first = events.subscribe();
        Self {
            inner: Arc::new(HandleInner {
                id: Uuid::new_v4(),
                spec,
                started_at: Utc::now(),
                pid,
                state,
                progress,
                events,
                first_subscriber: Mutex::new(Some(first)),
                cancel,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn spec(&self) -> &TranscodeSpec {
        &self.inner.spec
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConversionState {
        self.inner.state.borrow().clone()
    }

    /// Engine process id once it has been spawned.
    pub fn pid(&self) -> Option<u32> {
        self.inner.pid.get().copied()
    }

    /// Most recent progress signal.
    pub fn progress(&self) -> Option<ConversionProgress> {
        self.inner.progress.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.state.borrow().is_terminal()
    }

    /// Requests cooperative cancellation. Idempotent; a no-op once finished.
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Subscribes to the run's events.
    ///
    /// The first subscriber receives every event since the run started; later
    /// subscribers receive events sent after they subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<ConversionEvent> {
        let first = self
            .inner
            .first_subscriber
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        first.unwrap_or_else(|| self.inner.events.subscribe())
    }

    /// Watch channel over the lifecycle state.
    pub fn watch_state(&self) -> watch::Receiver<ConversionState> {
        self.inner.state.clone()
    }

    /// Waits for the terminal state and returns it.
    pub async fn wait(&self) -> ConversionState {
        let mut rx = self.inner.state.clone();
        if let Ok(state) = rx.wait_for(ConversionState::is_terminal).await {
            return state.clone();
        }
        // Sender gone without a terminal value; report whatever was last seen.
        let last = rx.borrow().clone();
        last
    }

    pub fn snapshot(&self) -> HandleSnapshot {
        HandleSnapshot {
            id: self.id(),
            started_at: self.started_at(),
            pid: self.pid(),
            state: self.state(),
            progress: self.progress(),
            spec: self.inner.spec.clone(),
        }
    }
}

impl std::fmt::Debug for ConversionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionHandle")
            .field("id", &self.inner.id)
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}
