use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;
use vocal_client::{ClientError, HttpBackend, VoiceBackend};
use vocal_types::{ConversationContext, ResponseRef, Role, TranscriptRef};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn backend(base: &str) -> HttpBackend {
    HttpBackend::new(reqwest::Client::new(), format!("{base}/"))
}

#[tokio::test]
async fn transcript_request_uses_camel_case_body() {
    let app = Router::new().route(
        "/api/audio/transcript",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["base64Audio"], "QUJD");
            Json(json!({
                "id": Uuid::new_v4(),
                "sessionId": body["session"],
                "role": "user",
                "text": "hi",
                "createdAt": "2026-03-01T10:00:00.000Z",
                "userIp": "127.0.0.1",
                "sourceId": null,
                "audioUrl": null,
                "audioUrlExpiresAt": null
            }))
        }),
    );
    let base = spawn(app).await;
    let session = Uuid::new_v4();

    let entry = backend(&base).transcript_audio("QUJD", session).await.unwrap();
    assert_eq!(entry.session_id, session);
    assert_eq!(entry.role, Role::User);
    assert_eq!(entry.text, "hi");
}

#[tokio::test]
async fn response_request_sends_context_as_turn_list() {
    let app = Router::new().route(
        "/api/audio/response",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(
                body["context"],
                json!([{ "role": "user", "text": "hello" }])
            );
            assert_eq!(body["transcript"]["createdAt"], "2026-03-01T10:00:00.000Z");
            Json(json!({ "id": Uuid::new_v4(), "text": "hey" }))
        }),
    );
    let base = spawn(app).await;

    let mut context = ConversationContext::new();
    context.push(Role::User, "hello");
    let transcript = TranscriptRef {
        id: Uuid::new_v4(),
        text: "hello".to_string(),
        created_at: "2026-03-01T10:00:00.000Z".to_string(),
    };

    let response = backend(&base)
        .generate_response(&transcript, &context, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(response.text, "hey");
}

#[tokio::test]
async fn error_bodies_become_api_errors() {
    let app = Router::new().route(
        "/api/audio/speech",
        post(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "no voice available to generate audio" })),
            )
        }),
    );
    let base = spawn(app).await;

    let err = backend(&base)
        .generate_audio(&ResponseRef {
            id: Uuid::new_v4(),
            text: "x".to_string(),
        })
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "no voice available to generate audio");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn session_entries_hit_session_path() {
    let app = Router::new().route(
        "/api/sessions/{session}/entries",
        get(|Path(session): Path<Uuid>, _headers: HeaderMap| async move {
            Json(json!([{
                "id": Uuid::new_v4(),
                "sessionId": session,
                "role": "agent",
                "text": "stored",
                "createdAt": "2026-03-01T10:00:00.000Z",
                "userIp": null,
                "sourceId": null,
                "audioUrl": null,
                "audioUrlExpiresAt": null
            }]))
        }),
    );
    let base = spawn(app).await;
    let session = Uuid::new_v4();

    let entries = backend(&base).session_entries(session).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].session_id, session);
    assert_eq!(entries[0].role, Role::Agent);
}
