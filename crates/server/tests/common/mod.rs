//! Test fixture running the router in-process with a mock prober.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use clipwright_core::testing::MockProber;
use clipwright_core::{Config, EngineConfig, MediaProber, MemoryPreferenceStore};
use clipwright_server::api::{create_router, WsBroadcaster};
use clipwright_server::state::AppState;

/// In-process server with a controllable prober and a scratch directory.
///
/// ```rust,ignore
/// let fixture = TestFixture::new().await;
/// fixture.prober.set_result(&input, MediaInfo::video(..)).await;
/// let response = fixture.post("/api/v1/probe", json!({ "path": input })).await;
/// ```
pub struct TestFixture {
    pub router: Router,
    pub state: Arc<AppState>,
    pub prober: Arc<MockProber>,
    pub temp_dir: TempDir,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture whose engine binary does not exist.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self::build(temp_dir, PathBuf::from("/nonexistent/clipwright-ffmpeg"))
    }

    /// Fixture running `body` as a fake ffmpeg script.
    #[cfg(unix)]
    pub async fn with_engine_script(body: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let ffmpeg = clipwright_core::testing::write_engine_script(temp_dir.path(), "ffmpeg", body);
        Self::build(temp_dir, ffmpeg)
    }

    fn build(temp_dir: TempDir, ffmpeg: PathBuf) -> Self {
        let mut config = Config::default();
        config.engine = EngineConfig::with_paths(ffmpeg, "/nonexistent/clipwright-ffprobe")
            .with_cancel_grace(200);
        config.preferences.path = temp_dir.path().join("prefs.json");

        let prober = Arc::new(MockProber::new());
        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&prober) as Arc<dyn MediaProber>,
            Box::new(MemoryPreferenceStore::new()),
            WsBroadcaster::default(),
        ));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            state,
            prober,
            temp_dir,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Creates an empty file in the scratch directory.
    pub fn touch(&self, name: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, b"").expect("Failed to create file");
        path
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Raw text of a GET response.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Polls the current conversion until it reports a terminal state.
    pub async fn wait_for_terminal(&self) -> Value {
        for _ in 0..200 {
            let response = self.get("/api/v1/conversion").await;
            let state = response.body["state"]["state"].as_str().unwrap_or_default();
            if matches!(state, "succeeded" | "failed" | "cancelled") {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("conversion did not finish in time");
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
