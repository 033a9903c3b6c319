use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::{conversion, handlers, media, middleware::metrics_middleware, preferences, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and engine
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/engine", get(handlers::get_engine))
        .route("/presets", get(handlers::get_presets))
        // Media
        .route("/probe", post(media::probe))
        .route("/resolve", post(media::resolve))
        // Conversion
        .route(
            "/conversion",
            post(conversion::start)
                .get(conversion::get_current)
                .delete(conversion::cancel),
        )
        .route("/conversion/reset", post(conversion::reset))
        // Preferences
        .route(
            "/preferences",
            get(preferences::get_preferences).put(preferences::put_preferences),
        )
        // Live events
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(metrics_middleware)),
        )
}
