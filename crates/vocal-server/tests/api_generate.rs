mod common;

use axum::http::StatusCode;
use common::setup_app;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn health_reports_version() {
    let app = setup_app().await;
    let (status, body) = app.send("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn ip_echoes_forwarded_address() {
    let app = setup_app().await;

    let (status, body) = app
        .send_as("GET", "/ip", None, Some("192.0.2.44, 10.1.1.1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ip": "192.0.2.44" }));

    let (_, body) = app.send_as("GET", "/ip", None, None, None).await;
    assert_eq!(body, json!({ "ip": null }));
}

#[tokio::test]
async fn generate_returns_signed_url_and_persists_both_turns() {
    let app = setup_app().await;
    let session = Uuid::new_v4();

    let (status, body) = app
        .send(
            "POST",
            "/generate",
            Some(json!({ "base64Audio": "QUJD", "session": session })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["url"]
        .as_str()
        .unwrap()
        .contains("/storage/v1/object/sign/audio/"));

    let (_, entries) = app
        .send("GET", &format!("/api/sessions/{session}/entries"), None)
        .await;
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["audioUrl"], body["url"]);

    // No prior context on the one-shot route.
    let sent = app.providers.response_requests.lock().unwrap()[0].clone();
    assert_eq!(sent["instructions"], common::SYSTEM_PROMPT);
}

#[tokio::test]
async fn generate_without_session_mints_one() {
    let app = setup_app().await;

    let (status, _) = app
        .send("POST", "/generate", Some(json!({ "base64Audio": "QUJD" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.count_entries(), 2);
}

#[tokio::test]
async fn generate_with_empty_transcript_is_internal_error() {
    let app = setup_app().await;
    app.providers.transcript.lock().unwrap().clear();

    let (status, body) = app
        .send("POST", "/generate", Some(json!({ "base64Audio": "QUJD" })))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal Server Error");
    assert!(!app.providers.calls().contains(&"respond".to_string()));
}

#[tokio::test]
async fn generate_maps_missing_voice_to_not_found() {
    let app = setup_app().await;
    app.providers.voices.lock().unwrap().clear();

    let (status, body) = app
        .send("POST", "/generate", Some(json!({ "base64Audio": "QUJD" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn generate_rejects_missing_audio_field() {
    let app = setup_app().await;

    let (status, _) = app.send("POST", "/generate", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.providers.calls().is_empty());
}

#[tokio::test]
async fn flags_are_listed_and_validated() {
    let app = setup_app().await;

    let (status, flags) = app.send("GET", "/api/flags", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flags, json!([{ "id": "usePlayHT", "enabled": false }]));

    let (status, _) = app
        .send("PUT", "/api/flags/useMagic", Some(json!({ "enabled": true })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send("PUT", "/api/flags/usePlayHT", Some(json!({ "enabled": "yes" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn toggling_an_unseeded_flag_is_not_found() {
    let app = setup_app().await;
    app.pool
        .get()
        .unwrap()
        .execute("DELETE FROM flags", [])
        .unwrap();

    let (status, _) = app
        .send("PUT", "/api/flags/usePlayHT", Some(json!({ "enabled": true })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_listing_rejects_bad_ids_and_isolates_sessions() {
    let app = setup_app().await;

    let (status, _) = app.send("GET", "/api/sessions/nope/entries", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, entries) = app
        .send("GET", &format!("/api/sessions/{}/entries", Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries, json!([]));
}
