//! Server side of a recording turn.
//!
//! Each operation ties one remote adapter to the conversation store:
//!
//! 1. [`transcript_audio`]: decode, resolve the caller, transcribe, persist a
//!    `user` entry.
//! 2. [`generate_response`]: check the transcript exists, complete with the
//!    system instructions and the client's context, persist an `agent` entry.
//! 3. [`generate_audio`]: check the response exists, read the provider flag,
//!    synthesize, upload, sign, attach the URL to the response.
//!
//! The operations are independent requests. Nothing here rolls back an
//! earlier stage when a later one fails.

use crate::api::{with_conn, ApiError, Caller};
use crate::AppState;
use std::sync::Arc;
use uuid::Uuid;
use vocal_conversations::{AudioLink, NewEntry};
use vocal_flags::FlagKey;
use vocal_types::{
    ConversationContext, ConversationEntry, ResponseRef, Role, SignedAudio, TranscriptRef,
};
use vocal_voice::{decode_base64_audio, VoiceProvider};

/// Transcribes a base64 recording and stores it as the session's next user turn.
pub async fn transcript_audio(
    state: &Arc<AppState>,
    caller: Caller,
    base64_audio: &str,
    session: Uuid,
) -> Result<ConversationEntry, ApiError> {
    let audio = decode_base64_audio(base64_audio).map_err(ApiError::from)?;

    let user = with_conn(state, move |conn| {
        Ok(vocal_identity::resolve_user(
            conn,
            caller.ip.as_deref(),
            caller.user_agent.as_deref(),
        )?)
    })
    .await?;

    let text = state.stt.transcribe(&audio).await.map_err(|e| {
        tracing::warn!(session = %session, "transcription failed: {}", e);
        ApiError::from(e)
    })?;

    let entry = with_conn(state, move |conn| {
        Ok(vocal_conversations::create_entry(
            conn,
            &NewEntry {
                session_id: session,
                role: Role::User,
                text: &text,
                user_ip: Some(&user.ip),
                source_id: None,
            },
        )?)
    })
    .await?;

    tracing::info!(session = %session, id = %entry.id, bytes = audio.len(), "transcript recorded");
    Ok(entry)
}

/// Generates the agent's reply to a stored transcript.
///
/// `instructions` replaces the configured system prompt when given; the
/// context lines are appended to whichever prompt is used.
pub async fn generate_response(
    state: &Arc<AppState>,
    transcript: TranscriptRef,
    context: ConversationContext,
    instructions: Option<String>,
    session: Uuid,
) -> Result<ResponseRef, ApiError> {
    let transcript_id = transcript.id;
    let source = with_conn(state, move |conn| {
        match vocal_conversations::find_entry(conn, transcript_id)? {
            Some(entry) if entry.role == Role::User => Ok(entry),
            _ => Err(ApiError::NotFound(format!(
                "transcript not found: {}",
                transcript_id
            ))),
        }
    })
    .await?;

    let prompt = instructions.unwrap_or_else(|| state.system_prompt.to_string());
    let rendered = context.render(&prompt);

    let text = state
        .responder
        .respond(&source.text, &rendered)
        .await
        .map_err(|e| {
            tracing::warn!(session = %session, transcript = %transcript_id, "response generation failed: {}", e);
            ApiError::from(e)
        })?;

    let entry = with_conn(state, move |conn| {
        Ok(vocal_conversations::create_entry(
            conn,
            &NewEntry {
                session_id: session,
                role: Role::Agent,
                text: &text,
                user_ip: None,
                source_id: Some(transcript_id),
            },
        )?)
    })
    .await?;

    tracing::info!(
        session = %session,
        id = %entry.id,
        context_turns = context.len(),
        "response recorded"
    );
    Ok(entry.as_response())
}

/// Synthesizes a stored response and returns a signed URL to its audio.
///
/// The response must exist and the provider flag must be seeded before any
/// provider is contacted.
pub async fn generate_audio(
    state: &Arc<AppState>,
    response: ResponseRef,
) -> Result<SignedAudio, ApiError> {
    let response_id = response.id;
    let (entry, use_alternate) = with_conn(state, move |conn| {
        let entry = vocal_conversations::find_entry(conn, response_id)?
            .filter(|entry| entry.role == Role::Agent)
            .ok_or_else(|| ApiError::NotFound(format!("response not found: {}", response_id)))?;
        let enabled = vocal_flags::get_flag(conn, FlagKey::UsePlayHt)?;
        Ok((entry, enabled))
    })
    .await?;

    let provider = VoiceProvider::from_flag(use_alternate);
    let blob = state
        .tts
        .synthesize(provider, &entry.text)
        .await
        .map_err(|e| {
            tracing::warn!(response = %response_id, provider = %provider, "speech synthesis failed: {}", e);
            ApiError::from(e)
        })?;

    let stored = state.storage.store(&blob).await?;

    let link_key = stored.object_key.clone();
    let signed = stored.signed.clone();
    with_conn(state, move |conn| {
        vocal_conversations::attach_audio(
            conn,
            response_id,
            &AudioLink {
                object_key: &link_key,
                url: &signed.url,
                expires_at: &signed.expires_at,
            },
        )?;
        Ok(())
    })
    .await?;

    tracing::info!(
        response = %response_id,
        provider = %provider,
        key = %stored.object_key,
        "audio ready"
    );
    Ok(SignedAudio {
        url: stored.signed.url,
        expires_at: stored.signed.expires_at,
    })
}

/// Mints a new signed URL for a response's existing audio.
pub async fn refresh_audio(
    state: &Arc<AppState>,
    response_id: Uuid,
) -> Result<SignedAudio, ApiError> {
    let object_key = with_conn(state, move |conn| {
        vocal_conversations::audio_object_key(conn, response_id)?.ok_or_else(|| {
            ApiError::NotFound(format!("no audio stored for response {}", response_id))
        })
    })
    .await?;

    let signed = state.storage.create_signed_url(&object_key).await?;

    let link = signed.clone();
    with_conn(state, move |conn| {
        vocal_conversations::attach_audio(
            conn,
            response_id,
            &AudioLink {
                object_key: &object_key,
                url: &link.url,
                expires_at: &link.expires_at,
            },
        )?;
        Ok(())
    })
    .await?;

    tracing::debug!(response = %response_id, "signed url refreshed");
    Ok(SignedAudio {
        url: signed.url,
        expires_at: signed.expires_at,
    })
}

/// Runs all three stages for one recording with no prior context.
///
/// A session is minted when the caller has none. Empty intermediate text is
/// an internal error.
pub async fn run_generate(
    state: &Arc<AppState>,
    caller: Caller,
    base64_audio: &str,
    session: Option<Uuid>,
) -> Result<SignedAudio, ApiError> {
    let session = session.unwrap_or_else(Uuid::new_v4);

    let transcript = transcript_audio(state, caller, base64_audio, session).await?;
    if transcript.text.is_empty() {
        return Err(ApiError::InternalServerError(
            "Internal Server Error".to_string(),
        ));
    }

    let response = generate_response(
        state,
        transcript.as_transcript(),
        ConversationContext::new(),
        None,
        session,
    )
    .await?;
    if response.text.is_empty() {
        return Err(ApiError::InternalServerError(
            "Internal Server Error".to_string(),
        ));
    }

    generate_audio(state, response).await
}
