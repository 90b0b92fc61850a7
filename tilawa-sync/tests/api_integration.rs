//! Integration tests for the tilawa-sync HTTP API
//!
//! Requests go through the full router in-process; the engine behind it runs
//! on the simulated device with the demo library.

mod helpers;

use axum::http::StatusCode;
use helpers::TestServer;
use serde_json::json;
use tilawa_sync::content::memory::{DEMO_CONTINUOUS_VOICE, DEMO_SEGMENTED_VOICE};

async fn server_with_section(section_id: u32) -> TestServer {
    let server = TestServer::start();
    let (status, _) = server
        .post(
            "/section",
            json!({ "section_id": section_id, "voice_id": DEMO_SEGMENTED_VOICE }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    server
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::start();
    let (status, body) = server.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "tilawa-sync");
}

#[tokio::test]
async fn test_list_sections_and_voices() {
    let server = TestServer::start();

    let (status, body) = server.get("/sections").await;
    assert_eq!(status, StatusCode::OK);
    let sections = body.unwrap()["sections"].as_array().unwrap().clone();
    assert_eq!(sections.len(), 3);
    assert_eq!(sections[0]["number"], 1);

    let (status, body) = server.get("/voices").await;
    assert_eq!(status, StatusCode::OK);
    let voices = body.unwrap()["voices"].as_array().unwrap().clone();
    assert_eq!(voices.len(), 2);
}

#[tokio::test]
async fn test_load_section_and_read_state() {
    let server = server_with_section(112).await;

    let (status, body) = server.get("/playback/state").await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["playback"]["section_id"], 112);
    assert_eq!(body["playback"]["unit_count"], 4);
    assert_eq!(body["playback"]["active_unit_index"], 0);
    assert_eq!(body["voice"], DEMO_SEGMENTED_VOICE);
    assert_eq!(body["now_playing"]["title"], "Al-Ikhlaas");
}

#[tokio::test]
async fn test_unknown_section_is_404() {
    let server = TestServer::start();
    let (status, body) = server
        .post(
            "/section",
            json!({ "section_id": 2, "voice_id": DEMO_SEGMENTED_VOICE }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.unwrap()["status"].as_str().unwrap().starts_with("error"));

    // Engine untouched
    let (_, body) = server.get("/playback/state").await;
    assert!(body.unwrap()["playback"]["section_id"].is_null());
}

#[tokio::test]
async fn test_unknown_voice_is_404() {
    let server = TestServer::start();
    let (status, _) = server
        .post("/section", json!({ "section_id": 1, "voice_id": "nobody" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_voice_defaults_to_current() {
    let server = server_with_section(1).await;

    let (status, _) = server.post("/section", json!({ "section_id": 108 })).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = server.get("/playback/state").await;
    let body = body.unwrap();
    assert_eq!(body["playback"]["section_id"], 108);
    assert_eq!(body["voice"], DEMO_SEGMENTED_VOICE);
}

#[tokio::test]
async fn test_navigation_endpoints() {
    let server = server_with_section(1).await;

    let (status, _) = server.post("/playback/select", json!({ "index": 4 })).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.post("/playback/next", json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = server.get("/playback/state").await;
    assert_eq!(body.unwrap()["playback"]["active_unit_index"], 5);

    let (status, _) = server.post("/playback/previous", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = server.get("/playback/state").await;
    assert_eq!(body.unwrap()["playback"]["active_unit_index"], 4);
}

#[tokio::test]
async fn test_continuous_voice_disables_navigation() {
    let server = server_with_section(1).await;
    let (status, _) = server
        .post(
            "/section",
            json!({ "section_id": 1, "voice_id": DEMO_CONTINUOUS_VOICE }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    server.post("/playback/next", json!({})).await;
    let (_, body) = server.get("/playback/state").await;
    let body = body.unwrap();
    assert_eq!(body["playback"]["mode"], "continuous");
    assert_eq!(body["playback"]["active_unit_index"], 0);
}

#[tokio::test]
async fn test_toggle_reports_playing() {
    let server = server_with_section(1).await;

    let (status, body) = server.post("/playback/toggle", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["status"], "ok");

    let (_, body) = server.get("/playback/state").await;
    assert_eq!(body.unwrap()["playback"]["is_playing"], true);
}

#[tokio::test]
async fn test_seek_validates_fraction() {
    let server = server_with_section(1).await;

    let (status, _) = server.post("/playback/seek", json!({ "fraction": 1.5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.post("/playback/seek", json!({ "fraction": 0.5 })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_manual_scroll_sets_override() {
    let server = server_with_section(1).await;

    // Echo of the initial centering, then a listener scroll
    server
        .post(
            "/scroll",
            json!({ "scroll_top": 0.0, "scrollable_height": 1200.0, "programmatic": true }),
        )
        .await;
    let (status, _) = server.post("/scroll", json!({ "scroll_top": 450.0 })).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = server.get("/playback/state").await;
    let scroll = body.unwrap()["scroll"].clone();
    assert_eq!(scroll["manual_override_active"], true);
    assert_eq!(scroll["last_known_scroll_top"], 450.0);
    assert_eq!(scroll["scrollable_height"], 1200.0);
}

#[tokio::test]
async fn test_media_action_endpoint() {
    let server = server_with_section(1).await;

    let (status, _) = server
        .post("/media/action", json!({ "action": "next_track" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = server.get("/playback/state").await;
    assert_eq!(body.unwrap()["playback"]["active_unit_index"], 1);

    let (status, _) = server
        .post("/media/action", json!({ "action": "rewind" }))
        .await;
    assert!(status.is_client_error());
}
