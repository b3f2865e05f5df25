//! Audio payload handling shared by transcription and synthesis.

use crate::error::VoiceError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Maximum decoded audio size accepted for transcription (25 MiB, the
/// transcription API's own upload limit).
pub const MAX_AUDIO_INPUT_BYTES: usize = 25 * 1024 * 1024;

/// MIME type of recorded microphone audio.
pub const RECORDING_CONTENT_TYPE: &str = "audio/webm";

/// MIME type of synthesized speech from either provider.
pub const SPEECH_CONTENT_TYPE: &str = "audio/mpeg";

/// A binary audio blob with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl AudioBlob {
    pub fn new(bytes: Vec<u8>, content_type: &'static str) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Removes a leading `data:<mime>;base64,` header, if present.
///
/// Payloads without the header are returned unchanged.
pub fn strip_data_uri_prefix(payload: &str) -> &str {
    let Some(rest) = payload.strip_prefix("data:") else {
        return payload;
    };
    match rest.find(";base64,") {
        // The media type must be non-empty.
        Some(idx) if idx > 0 => &rest[idx + ";base64,".len()..],
        _ => payload,
    }
}

/// Decodes a base64 recording, with or without a data-URI header.
///
/// # Errors
///
/// Returns `VoiceError::Decode` for invalid base64, `VoiceError::EmptyAudio`
/// when nothing is left after decoding, and `VoiceError::AudioTooLarge` above
/// [`MAX_AUDIO_INPUT_BYTES`].
pub fn decode_base64_audio(payload: &str) -> Result<AudioBlob, VoiceError> {
    let bytes = STANDARD.decode(strip_data_uri_prefix(payload).trim())?;
    if bytes.is_empty() {
        return Err(VoiceError::EmptyAudio);
    }
    if bytes.len() > MAX_AUDIO_INPUT_BYTES {
        return Err(VoiceError::AudioTooLarge {
            size: bytes.len(),
            limit: MAX_AUDIO_INPUT_BYTES,
        });
    }
    Ok(AudioBlob::new(bytes, RECORDING_CONTENT_TYPE))
}
