//! Shared setup: a migrated on-disk database and one local axum server
//! standing in for every remote provider.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;
use vocal_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use vocal_server::{app, config::Config, AppState};
use vocal_voice::{ElevenLabsConfig, OpenAiConfig, PlayHtConfig, StorageConfig};

pub const SYSTEM_PROMPT: &str = "You are a test assistant.";

/// What the fake providers answer and what they were asked.
#[derive(Default)]
pub struct Providers {
    /// Ordered log of provider calls, e.g. `"transcribe"`, `"playht"`.
    pub calls: Mutex<Vec<String>>,
    pub transcript: Mutex<String>,
    pub voices: Mutex<Vec<String>>,
    /// JSON bodies sent to the responses endpoint.
    pub response_requests: Mutex<Vec<Value>>,
    /// Bytes uploaded to storage, by object key.
    pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
}

impl Providers {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub providers: Arc<Providers>,
    pub provider_url: String,
    _dir: TempDir,
}

async fn transcribe(State(p): State<Arc<Providers>>) -> Json<Value> {
    p.log("transcribe");
    let text = p.transcript.lock().unwrap().clone();
    Json(json!({ "text": text }))
}

async fn respond(State(p): State<Arc<Providers>>, Json(body): Json<Value>) -> Json<Value> {
    p.log("respond");
    let reply = format!("reply to {}", body["input"].as_str().unwrap_or_default());
    p.response_requests.lock().unwrap().push(body);
    Json(json!({ "output_text": reply }))
}

async fn voices(State(p): State<Arc<Providers>>) -> Json<Value> {
    p.log("voices");
    let voices: Vec<Value> = p
        .voices
        .lock()
        .unwrap()
        .iter()
        .map(|id| json!({ "voice_id": id }))
        .collect();
    Json(json!({ "voices": voices }))
}

async fn elevenlabs(State(p): State<Arc<Providers>>, Path(voice_id): Path<String>) -> Bytes {
    p.log(&format!("elevenlabs:{voice_id}"));
    Bytes::from_static(b"elevenlabs-audio")
}

async fn playht(State(p): State<Arc<Providers>>) -> Bytes {
    p.log("playht");
    Bytes::from_static(b"playht-audio")
}

async fn upload(
    State(p): State<Arc<Providers>>,
    Path((_bucket, key)): Path<(String, String)>,
    body: Bytes,
) -> StatusCode {
    p.log("upload");
    p.uploads.lock().unwrap().push((key, body.to_vec()));
    StatusCode::OK
}

async fn sign(
    State(p): State<Arc<Providers>>,
    Path((bucket, key)): Path<(String, String)>,
) -> Json<Value> {
    p.log("sign");
    let n = p.calls.lock().unwrap().len();
    Json(json!({ "signedURL": format!("/object/sign/{bucket}/{key}?token=tok{n}") }))
}

async fn spawn_providers(providers: Arc<Providers>) -> String {
    let router = Router::new()
        .route("/v1/audio/transcriptions", post(transcribe))
        .route("/v1/responses", post(respond))
        .route("/v1/voices", get(voices))
        .route("/v1/text-to-speech/{voice_id}/stream", post(elevenlabs))
        .route("/api/v1/tts/stream", post(playht))
        .route("/storage/v1/object/{bucket}/{key}", post(upload))
        .route("/storage/v1/object/sign/{bucket}/{key}", post(sign))
        .with_state(providers);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn setup_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("vocal.db");
    let pool = create_pool(db_path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
    }

    let providers = Arc::new(Providers::default());
    *providers.transcript.lock().unwrap() = "hello there".to_string();
    *providers.voices.lock().unwrap() = vec!["voice-1".to_string(), "voice-2".to_string()];
    let provider_url = spawn_providers(providers.clone()).await;

    let config = Config {
        openai: OpenAiConfig {
            api_key: "sk-test".to_string(),
            base_url: provider_url.clone(),
            ..Default::default()
        },
        elevenlabs: ElevenLabsConfig {
            api_key: "xi-test".to_string(),
            base_url: provider_url.clone(),
            ..Default::default()
        },
        playht: PlayHtConfig {
            api_key: "ph-test".to_string(),
            user_id: "ph-user".to_string(),
            base_url: provider_url.clone(),
            ..Default::default()
        },
        storage: StorageConfig {
            project_url: provider_url.clone(),
            api_key: "service-key".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let state = AppState::new(pool.clone(), &config, Arc::from(SYSTEM_PROMPT));

    TestApp {
        router: app(state),
        pool,
        providers,
        provider_url,
        _dir: dir,
    }
}

impl TestApp {
    /// Sends a JSON request as a browser behind a proxy at `ip`.
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_as(method, uri, body, Some("198.51.100.20"), Some("test-agent/1.0"))
            .await
    }

    pub async fn send_as(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(ip) = ip {
            request = request.header("x-forwarded-for", ip);
        }
        if let Some(user_agent) = user_agent {
            request = request.header("user-agent", user_agent);
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub fn count_entries(&self) -> i64 {
        let conn = self.pool.get().unwrap();
        conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))
            .unwrap()
    }
}
