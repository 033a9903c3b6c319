use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::{info, warn};

use clipwright_core::Preferences;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

/// GET /api/v1/preferences
pub async fn get_preferences(State(state): State<Arc<AppState>>) -> Json<Preferences> {
    let store = state.preferences().lock().await;
    Json(Preferences::load(&**store))
}

/// PUT /api/v1/preferences
///
/// Replaces the known preferences and persists them.
pub async fn put_preferences(
    State(state): State<Arc<AppState>>,
    Json(prefs): Json<Preferences>,
) -> Result<Json<Preferences>, ApiError> {
    let mut store = state.preferences().lock().await;
    prefs.apply(&mut **store);
    if let Err(e) = store.save() {
        warn!(error = %e, "Failed to save preferences");
        return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
    }
    info!("Preferences updated");
    Ok(Json(Preferences::load(&**store)))
}
