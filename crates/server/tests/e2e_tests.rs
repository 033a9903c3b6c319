//! End-to-end API tests with a mocked prober and scripted engines.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use clipwright_core::MediaInfo;
use common::TestFixture;

fn hd_clip() -> MediaInfo {
    MediaInfo::video(60.0, 1920, 1080, Some(30.0), Some(8000))
}

/// Probes `name` (created in the scratch dir) as a 60s 1080p clip.
async fn probe_clip(fixture: &TestFixture, name: &str) -> Value {
    let input = fixture.touch(name);
    fixture.prober.set_result(&input, hd_clip()).await;
    let response = fixture.post("/api/v1/probe", json!({ "path": input })).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    response.body
}

fn spec_for(fixture: &TestFixture, output: &str) -> Value {
    json!({
        "input": fixture.path("input.mov"),
        "output": fixture.path(output),
        "trim": { "start_ms": 0, "end_ms": 2000 },
        "width": null,
        "height": null,
        "fps": null,
        "video_bitrate_kbps": null,
        "audio_bitrate_kbps": null,
        "container": "mp4",
        "audio_only": false,
        "video_codec": null,
        "audio_codec": null
    })
}

// =============================================================================
// Service information
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_endpoint_is_sanitized() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["engine"]["ffmpeg_path"],
        "/nonexistent/clipwright-ffmpeg"
    );
    assert_eq!(response.body["engine"]["cancel_grace_ms"], 200);
    assert!(response.body["engine"]["extra_args"].is_null());
}

#[tokio::test]
async fn test_presets_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/presets").await;
    assert_eq!(response.status, StatusCode::OK);

    let body = &response.body;
    assert_eq!(body["video_formats"][0]["value"], "mp4");
    assert_eq!(body["audio_formats"][0]["value"], "mp3");
    let webm = body["video_codecs"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["format"] == "webm")
        .unwrap();
    assert_eq!(webm["codecs"], json!(["libvpx-vp9"]));
    assert_eq!(body["resolutions"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_engine_report_without_engine() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/engine").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["ffmpeg"]["available"], false);
    assert_eq!(response.body["ffprobe"]["available"], false);
    assert!(!response.body["encoders"].as_array().unwrap().is_empty());
}

// =============================================================================
// Probe and resolve
// =============================================================================

#[tokio::test]
async fn test_probe_returns_options_and_full_trim() {
    let fixture = TestFixture::new().await;
    let body = probe_clip(&fixture, "input.mov").await;

    assert_eq!(body["info"]["width"], 1920);
    assert_eq!(body["trim"]["start_ms"], 0);
    assert_eq!(body["trim"]["end_ms"], 60_000);

    let values: Vec<&str> = body["resolution_options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["value"].as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["source", "125%", "75%", "50%", "custom"]);

    assert_eq!(body["selections"]["container"], "mp4");
    assert_eq!(body["selections"]["filename"], "input");
}

#[tokio::test]
async fn test_probe_missing_input_is_not_found() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post("/api/v1/probe", json!({ "path": "/nowhere/clip.mov" }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_resolve_requires_probe() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post(
            "/api/v1/resolve",
            json!({
                "input": "/media/never-probed.mov",
                "trim": { "start_ms": 0, "end_ms": 1000 },
                "container": "mp4"
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_resolve_half_resolution() {
    let fixture = TestFixture::new().await;
    let probed = probe_clip(&fixture, "input.mov").await;

    let mut selections = probed["selections"].clone();
    selections["resolution"] = json!({ "preset": "50%" });
    selections["output_dir"] = json!(fixture.temp_dir.path());
    selections["filename"] = json!("half.mkv");

    let response = fixture.post("/api/v1/resolve", selections).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    let spec = &response.body["spec"];
    assert_eq!(spec["width"], 960);
    assert_eq!(spec["height"], 540);
    assert_eq!(spec["container"], "mp4");
    assert_eq!(
        spec["output"].as_str().unwrap(),
        fixture.path("half.mp4").to_str().unwrap()
    );
    assert!(response.body["estimated_size"].as_str().unwrap().ends_with("MB"));
}

#[tokio::test]
async fn test_resolve_rejects_trim_outside_invariants() {
    let fixture = TestFixture::new().await;
    let probed = probe_clip(&fixture, "input.mov").await;

    for trim in [
        json!({ "start_ms": 0, "end_ms": 50 }),
        json!({ "start_ms": 0, "end_ms": 999_000 }),
        json!({ "start_ms": u64::MAX, "end_ms": u64::MAX }),
    ] {
        let mut selections = probed["selections"].clone();
        selections["trim"] = trim.clone();
        let response = fixture.post("/api/v1/resolve", selections).await;
        assert_eq!(
            response.status,
            StatusCode::UNPROCESSABLE_ENTITY,
            "{trim}: {}",
            response.body
        );
    }
}

#[tokio::test]
async fn test_start_rejects_trim_past_probed_duration() {
    let fixture = TestFixture::new().await;
    probe_clip(&fixture, "input.mov").await;

    let mut spec = spec_for(&fixture, "out.mp4");
    spec["trim"] = json!({ "start_ms": 0, "end_ms": 999_000 });
    let response = fixture.post("/api/v1/conversion", spec).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["error"].as_str().unwrap().contains("past the end"));

    let mut spec = spec_for(&fixture, "out.mp4");
    spec["trim"] = json!({ "start_ms": 0, "end_ms": 50 });
    let response = fixture.post("/api/v1/conversion", spec).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!fixture.state.supervisor().is_busy());
}

#[tokio::test]
async fn test_probe_seeds_selections_from_preferences() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .put(
            "/api/v1/preferences",
            json!({
                "last_output_dir": "/exports",
                "advanced_mode": true,
                "codec_selection_enabled": true
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let probed = probe_clip(&fixture, "input.mov").await;
    assert_eq!(probed["selections"]["output_dir"], "/exports");
    assert_eq!(probed["selections"]["codec_selection_enabled"], true);
}

// =============================================================================
// Conversion lifecycle
// =============================================================================

#[tokio::test]
async fn test_start_rejects_invalid_spec() {
    let fixture = TestFixture::new().await;
    let mut spec = spec_for(&fixture, "out.mp4");
    spec["output"] = json!("out.mp4");

    let response = fixture.post("/api/v1/conversion", spec).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!fixture.state.supervisor().is_busy());
}

#[tokio::test]
async fn test_missing_engine_fails_run() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post("/api/v1/conversion", spec_for(&fixture, "out.mp4"))
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    let done = fixture.wait_for_terminal().await;
    assert_eq!(done["state"]["state"], "failed");
    assert_eq!(done["state"]["kind"], "spawn");
}

#[tokio::test]
async fn test_cancel_without_conversion_is_not_found() {
    let fixture = TestFixture::new().await;
    let response = fixture.delete("/api/v1/conversion").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let idle = fixture.get("/api/v1/conversion").await;
    assert_eq!(idle.status, StatusCode::OK);
    assert!(idle.body.is_null());
}

#[cfg(unix)]
#[tokio::test]
async fn test_successful_conversion_then_reset() {
    let fixture = TestFixture::with_engine_script(
        "for last; do :; done\necho data > \"$last\"\nprintf 'out_time_us=2000000\\nprogress=end\\n' >&2\nexit 0",
    )
    .await;

    let response = fixture
        .post("/api/v1/conversion", spec_for(&fixture, "out.mp4"))
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED, "{}", response.body);
    assert!(response.body["id"].is_string());

    let done = fixture.wait_for_terminal().await;
    assert_eq!(done["state"]["state"], "succeeded");
    assert!(fixture.path("out.mp4").exists());

    // The output directory is remembered.
    let prefs = fixture.get("/api/v1/preferences").await;
    assert_eq!(
        prefs.body["last_output_dir"].as_str().unwrap(),
        fixture.temp_dir.path().to_str().unwrap()
    );

    let reset = fixture.post("/api/v1/conversion/reset", json!({})).await;
    assert_eq!(reset.status, StatusCode::NO_CONTENT);
    assert!(fixture.get("/api/v1/conversion").await.body.is_null());
}

#[cfg(unix)]
#[tokio::test]
async fn test_busy_then_cancel() {
    let fixture = TestFixture::with_engine_script("exec sleep 30").await;

    let first = fixture
        .post("/api/v1/conversion", spec_for(&fixture, "first.mp4"))
        .await;
    assert_eq!(first.status, StatusCode::ACCEPTED);

    let second = fixture
        .post("/api/v1/conversion", spec_for(&fixture, "second.mp4"))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);

    let reset = fixture.post("/api/v1/conversion/reset", json!({})).await;
    assert_eq!(reset.status, StatusCode::CONFLICT);

    let cancel = fixture.delete("/api/v1/conversion").await;
    assert_eq!(cancel.status, StatusCode::ACCEPTED);

    let done = fixture.wait_for_terminal().await;
    assert_eq!(done["state"]["state"], "cancelled");
    assert_eq!(done["id"], first.body["id"]);
}

// =============================================================================
// Preferences and metrics
// =============================================================================

#[tokio::test]
async fn test_preferences_round_trip() {
    let fixture = TestFixture::new().await;

    let initial = fixture.get("/api/v1/preferences").await;
    assert_eq!(initial.body["advanced_mode"], false);
    assert!(initial.body["last_output_dir"].is_null());

    let updated = fixture
        .put(
            "/api/v1/preferences",
            json!({ "advanced_mode": true, "auto_reveal_and_exit": true }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["auto_reveal_and_exit"], true);

    let fetched = fixture.get("/api/v1/preferences").await;
    assert_eq!(fetched.body, updated.body);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let (status, text) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("clipwright_http_requests_total"));
    assert!(text.contains("/api/v1/health"));
}
