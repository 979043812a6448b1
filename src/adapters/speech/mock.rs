//! Mock speech synthesizer for tests and offline runs.
//!
//! Returns the UTF-8 text itself as `text/plain` "audio" and records every
//! request. Voices can be restricted to exercise the unknown-voice path.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::ports::{SpeechError, SpeechSynthesizer, SynthesizedAudio};

/// A recorded synthesis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisCall {
    pub voice_id: String,
    pub text: String,
}

/// Mock synthesizer.
#[derive(Debug, Clone, Default)]
pub struct MockSpeechSynthesizer {
    /// Accepted voices; empty accepts any voice.
    voices: BTreeSet<String>,
    unavailable: bool,
    calls: Arc<Mutex<Vec<SynthesisCall>>>,
}

impl MockSpeechSynthesizer {
    /// Creates a synthesizer accepting any voice.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts accepted voices.
    pub fn with_voices<S: Into<String>>(mut self, voices: impl IntoIterator<Item = S>) -> Self {
        self.voices = voices.into_iter().map(Into::into).collect();
        self
    }

    /// Makes every request fail as unavailable.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<SynthesisCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeechSynthesizer {
    async fn synthesize(&self, voice_id: &str, text: &str) -> Result<SynthesizedAudio, SpeechError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SynthesisCall {
                voice_id: voice_id.to_string(),
                text: text.to_string(),
            });

        if self.unavailable {
            return Err(SpeechError::Unavailable("mock configured unavailable".to_string()));
        }
        if !self.voices.is_empty() && !self.voices.contains(voice_id) {
            return Err(SpeechError::UnknownVoice(voice_id.to_string()));
        }

        Ok(SynthesizedAudio {
            content_type: "text/plain".to_string(),
            bytes: text.as_bytes().to_vec(),
        })
    }
}
