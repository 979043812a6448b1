//! Speech Synthesizer Port - Interface for persona narration audio.
//!
//! Narration renders the persona's pre-authored voice lines (opening,
//! closing, context brief). It is independent of turn processing.

use async_trait::async_trait;

/// Rendered audio for one voice line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    /// MIME type of `bytes`, e.g. `audio/mpeg`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Errors from the speech service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpeechError {
    #[error("unknown voice: {0}")]
    UnknownVoice(String),

    #[error("speech service unavailable: {0}")]
    Unavailable(String),
}

/// Port for text-to-speech.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Renders `text` with the given voice.
    async fn synthesize(&self, voice_id: &str, text: &str) -> Result<SynthesizedAudio, SpeechError>;
}
