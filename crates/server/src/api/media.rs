//! Probe and option-resolution handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use clipwright_core::resolver::{resolution_options, ResolutionOption};
use clipwright_core::trim::MIN_GAP_MS;
use clipwright_core::{
    resolve_detailed, MediaInfo, ProbeError, Preferences, Resolution, Selections, TrimRange,
};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProbeBody {
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub path: PathBuf,
    pub info: MediaInfo,
    /// Resolution choices for this file, de-duplicated, "custom" last.
    pub resolution_options: Vec<ResolutionOption>,
    /// Full-length trim range.
    pub trim: TrimRange,
    /// Starting selections, seeded from remembered preferences.
    pub selections: Selections,
}

fn probe_error_status(error: &ProbeError) -> StatusCode {
    match error {
        ProbeError::InputNotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// POST /api/v1/probe
///
/// Probes a file and remembers the result for later resolve calls.
pub async fn probe(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProbeBody>,
) -> Result<Json<ProbeResponse>, ApiError> {
    let info = match state.prober().probe(&body.path).await {
        Ok(info) => info,
        Err(e) => {
            warn!(path = %body.path.display(), error = %e, "Probe failed");
            return Err(api_error(probe_error_status(&e), e.to_string()));
        }
    };
    info!(
        path = %body.path.display(),
        duration = info.duration_seconds,
        has_video = info.has_video,
        "Probed input"
    );

    let prefs = {
        let store = state.preferences().lock().await;
        Preferences::load(&**store)
    };
    let mut selections = Selections::for_media(body.path.clone(), &info);
    selections.codec_selection_enabled = prefs.codec_selection_enabled;
    selections.output_dir = prefs.last_output_dir;

    let response = ProbeResponse {
        path: body.path.clone(),
        resolution_options: resolution_options(&info),
        trim: TrimRange::full(info.duration_ms()),
        selections,
        info: info.clone(),
    };
    state.remember_probe(body.path, info).await;

    Ok(Json(response))
}

/// POST /api/v1/resolve
///
/// Resolves selections against the probed info for `selections.input`.
/// The trim must keep the minimum clip length and end within the input.
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Json(selections): Json<Selections>,
) -> Result<Json<Resolution>, ApiError> {
    let Some(info) = state.probed(&selections.input).await else {
        return Err(api_error(
            StatusCode::CONFLICT,
            format!("Input has not been probed: {}", selections.input.display()),
        ));
    };
    let duration_ms = info.duration_ms();
    if !selections.trim.is_valid_for(duration_ms) {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!(
                "Trim {}..{} ms must be at least {} ms long and end within {} ms",
                selections.trim.start_ms, selections.trim.end_ms, MIN_GAP_MS, duration_ms
            ),
        ));
    }
    Ok(Json(resolve_detailed(&selections, &info)))
}
