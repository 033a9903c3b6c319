use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipwright_core::{
    load_config, validate_config, EngineReport, FfprobeProber, JsonFilePreferenceStore,
    MediaProber, PreferenceStore,
};
use clipwright_server::api::{create_router, WsBroadcaster};
use clipwright_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("CLIPWRIGHT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    let report = EngineReport::detect(&config.engine).await;
    if report.is_ready() {
        info!(
            ffmpeg = report.ffmpeg.version.as_deref().unwrap_or("unknown"),
            ffprobe = report.ffprobe.version.as_deref().unwrap_or("unknown"),
            "Engine found"
        );
    } else {
        // The service still starts so callers can see the engine report.
        warn!(
            ffmpeg = %report.ffmpeg.path,
            ffprobe = %report.ffprobe.path,
            "Engine not available; probes and conversions will fail"
        );
    }

    let preferences: Box<dyn PreferenceStore> = Box::new(
        JsonFilePreferenceStore::open(&config.preferences.path)
            .context("Failed to open preferences")?,
    );
    let prober: Arc<dyn MediaProber> = Arc::new(FfprobeProber::new(config.engine.clone()));
    let ws_broadcaster = WsBroadcaster::new(config.engine.event_buffer);

    let state = Arc::new(AppState::new(
        config.clone(),
        prober,
        preferences,
        ws_broadcaster,
    ));
    let app = create_router(Arc::clone(&state));

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let shutdown_state = Arc::clone(&state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            shutdown_state.shutdown_active_conversion().await;
        })
        .await
        .context("Server error")?;

    // Covers a run started while connections were draining.
    state.shutdown_active_conversion().await;
    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
