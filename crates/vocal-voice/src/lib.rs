//! Remote voice services for the vocal front end.
//!
//! Wraps the external collaborators of a recording turn:
//!
//! - [`SttService`]: speech-to-text over the OpenAI transcription API.
//! - [`ResponderService`]: reply generation over the OpenAI Responses API.
//! - [`TtsService`]: text-to-speech over two interchangeable providers,
//!   selected per request through [`VoiceProvider`].
//! - [`ObjectStorage`]: upload of synthesized audio and signed-URL minting.
//!
//! Every service takes a shared `reqwest::Client` and its configuration at
//! construction; none of them hold global state, retry, or time out on
//! their own.

pub mod audio;
pub mod config;
pub mod error;
pub mod responder;
pub mod storage;
pub mod stt;
pub mod tts;

pub use audio::{decode_base64_audio, strip_data_uri_prefix, AudioBlob};
pub use config::{ElevenLabsConfig, OpenAiConfig, PlayHtConfig, StorageConfig};
pub use error::VoiceError;
pub use responder::ResponderService;
pub use storage::{ObjectStorage, SignedUrl, StoredAudio};
pub use stt::SttService;
pub use tts::{TtsService, VoiceProvider};
