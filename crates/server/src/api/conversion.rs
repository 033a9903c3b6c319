//! Conversion lifecycle handlers.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use clipwright_core::preferences::keys;
use clipwright_core::supervisor::HandleSnapshot;
use clipwright_core::{ConversionEvent, ConversionHandle, StartError, TranscodeSpec};

use super::handlers::{api_error, ApiError};
use super::ws::WsBroadcaster;
use crate::state::AppState;

/// POST /api/v1/conversion
///
/// Starts converting `spec`. Rejected with 409 while another run is active,
/// and with 422 when the trim does not fit a previously probed input.
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<TranscodeSpec>,
) -> Result<(StatusCode, Json<HandleSnapshot>), ApiError> {
    if let Some(info) = state.probed(&spec.input).await {
        if let Err(e) = spec.validate_for_duration(info.duration_ms()) {
            return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()));
        }
    }
    let output_dir = spec.output.parent().map(|p| p.to_path_buf());

    let handle = match state.supervisor().start(spec) {
        Ok(handle) => handle,
        Err(StartError::Busy) => {
            return Err(api_error(StatusCode::CONFLICT, StartError::Busy.to_string()))
        }
        Err(e @ StartError::Invalid(_)) => {
            return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
    };
    info!(conversion_id = %handle.id(), "Conversion started");

    forward_events(&handle, state.ws_broadcaster().clone());
    let snapshot = handle.snapshot();
    state.set_active(handle).await;

    if let Some(dir) = output_dir.filter(|d| !d.as_os_str().is_empty()) {
        let mut store = state.preferences().lock().await;
        store.set(
            keys::LAST_OUTPUT_DIR,
            serde_json::Value::String(dir.to_string_lossy().into_owned()),
        );
        if let Err(e) = store.save() {
            warn!(error = %e, "Failed to remember output directory");
        }
    }

    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// GET /api/v1/conversion
///
/// Snapshot of the current or last conversion; `null` when idle.
pub async fn get_current(State(state): State<Arc<AppState>>) -> Json<Option<HandleSnapshot>> {
    Json(state.active().await.map(|h| h.snapshot()))
}

/// DELETE /api/v1/conversion
///
/// Requests cancellation. A no-op for a run that already finished.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<HandleSnapshot>), ApiError> {
    let Some(handle) = state.active().await else {
        return Err(api_error(StatusCode::NOT_FOUND, "No conversion to cancel"));
    };
    if !handle.is_finished() {
        info!(conversion_id = %handle.id(), "Cancel requested");
        handle.cancel();
    }
    Ok((StatusCode::ACCEPTED, Json(handle.snapshot())))
}

/// POST /api/v1/conversion/reset
///
/// Returns to idle after a run has finished.
pub async fn reset(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    if state.reset_active().await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(
            StatusCode::CONFLICT,
            "A conversion is still running",
        ))
    }
}

/// Relays every event of `handle` to WebSocket clients until it finishes.
fn forward_events(handle: &ConversionHandle, ws: WsBroadcaster) {
    let mut rx = handle.subscribe();
    let id = handle.id().to_string();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let done = matches!(event, ConversionEvent::Finished(_));
                    ws.conversion_event(&id, event);
                    if done {
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    warn!(conversion_id = %id, skipped = n, "Event relay fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!(conversion_id = %id, "Event relay finished");
    });
}
