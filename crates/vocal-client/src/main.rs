//! Command-line driver: plays audio files as recording turns of one session.
//!
//! ```text
//! vocal-client [--session <uuid>] [--forwarded-for <ip>] <server-url> <audio-file>...
//! ```

use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use vocal_client::{HttpBackend, LogEventSink, LogPlayback, Orchestrator, QueuedCapture};

const USAGE: &str =
    "usage: vocal-client [--session <uuid>] [--forwarded-for <ip>] <server-url> <audio-file>...";

struct Args {
    session: Option<Uuid>,
    forwarded_for: String,
    server_url: String,
    files: Vec<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut session = None;
    // The server identifies callers by their forwarded address; without a
    // proxy in front, the client supplies one.
    let mut forwarded_for = "127.0.0.1".to_string();
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--session" => {
                let value = args.next().ok_or("--session needs a value")?;
                session = Some(
                    Uuid::parse_str(&value).map_err(|e| format!("invalid session: {e}"))?,
                );
            }
            "--forwarded-for" => {
                forwarded_for = args.next().ok_or("--forwarded-for needs a value")?;
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let server_url = positional.next().ok_or(USAGE)?;
    let files: Vec<String> = positional.collect();
    if files.is_empty() {
        return Err(USAGE.to_string());
    }

    Ok(Args {
        session,
        forwarded_for,
        server_url,
        files,
    })
}

fn build_client(forwarded_for: &str) -> Result<reqwest::Client, String> {
    let mut headers = reqwest::header::HeaderMap::new();
    let value = reqwest::header::HeaderValue::from_str(forwarded_for)
        .map_err(|e| format!("invalid --forwarded-for value: {e}"))?;
    headers.insert("x-forwarded-for", value);

    reqwest::Client::builder()
        .user_agent(concat!("vocal-client/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .build()
        .map_err(|e| format!("failed to build HTTP client: {e}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("VOCAL_LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let mut clips = Vec::with_capacity(args.files.len());
    for path in &args.files {
        match std::fs::read(path) {
            Ok(bytes) => clips.push(bytes),
            Err(e) => {
                eprintln!("failed to read {path}: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let client = match build_client(&args.forwarded_for) {
        Ok(client) => client,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let mut orchestrator = Orchestrator::new(
        Arc::new(HttpBackend::new(client, args.server_url)),
        Box::new(QueuedCapture::new(clips)),
        Box::new(LogPlayback::default()),
        Arc::new(LogEventSink),
    );

    if let Some(session) = args.session {
        if let Err(e) = orchestrator.resume(session).await {
            eprintln!("failed to resume session {session}: {e}");
            return ExitCode::FAILURE;
        }
    }
    println!("session {}", orchestrator.session());

    let mut failures = 0;
    for path in &args.files {
        if let Err(e) = orchestrator.start_recording() {
            eprintln!("{path}: {e}");
            failures += 1;
            continue;
        }
        match orchestrator.stop_recording().await {
            Ok(turn) => {
                println!("{path}");
                println!("  user:  {}", turn.transcript.text);
                println!("  agent: {}", turn.response.text);
                println!("  audio: {} (expires {})", turn.audio.url, turn.audio.expires_at);
                orchestrator.playback_finished();
            }
            Err(e) => {
                eprintln!("{path}: {e}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
