//! NarrateVoiceLineHandler - Render a persona's authored line as audio.
//!
//! Narration never touches session state; it only reads the vignette.

use std::sync::Arc;

use crate::domain::foundation::VignetteId;
use crate::domain::vignette::VoiceLine;
use crate::ports::{SpeechError, SpeechSynthesizer, SynthesizedAudio, VignetteLookupError, VignetteStore};

/// Command to narrate a voice line
#[derive(Debug, Clone)]
pub struct NarrateVoiceLineCommand {
    pub vignette_id: VignetteId,
    pub line: VoiceLine,
}

/// Error type for narration
#[derive(Debug, thiserror::Error)]
pub enum NarrateVoiceLineError {
    #[error(transparent)]
    Vignette(#[from] VignetteLookupError),

    #[error("Vignette {0} has no voice configured")]
    NoVoice(VignetteId),

    #[error("Voice line {0:?} is not authored")]
    LineNotAuthored(VoiceLine),

    #[error(transparent)]
    Speech(#[from] SpeechError),
}

/// Handler for persona narration
pub struct NarrateVoiceLineHandler {
    vignettes: Arc<dyn VignetteStore>,
    speech: Arc<dyn SpeechSynthesizer>,
}

impl NarrateVoiceLineHandler {
    pub fn new(vignettes: Arc<dyn VignetteStore>, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { vignettes, speech }
    }

    pub async fn handle(
        &self,
        cmd: NarrateVoiceLineCommand,
    ) -> Result<SynthesizedAudio, NarrateVoiceLineError> {
        let vignette = self.vignettes.get_vignette(&cmd.vignette_id).await?;

        let voice = vignette
            .persona
            .voice
            .as_ref()
            .ok_or_else(|| NarrateVoiceLineError::NoVoice(cmd.vignette_id.clone()))?;
        let text = voice
            .line(cmd.line)
            .ok_or(NarrateVoiceLineError::LineNotAuthored(cmd.line))?;

        tracing::debug!(
            vignette_id = %cmd.vignette_id,
            line = ?cmd.line,
            voice_id = %voice.voice_id,
            "Narrating voice line"
        );

        Ok(self.speech.synthesize(&voice.voice_id, text).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::speech::MockSpeechSynthesizer;
    use crate::adapters::storage::InMemoryVignetteStore;
    use crate::domain::foundation::PhaseId;
    use crate::domain::vignette::{
        ExitCondition, ModelConfig, ModelId, Persona, PersonaEmotion, Phase, VignetteConfig,
        VoiceConfig,
    };

    fn vignette(id: &str, voice: Option<VoiceConfig>) -> VignetteConfig {
        let mut persona = Persona::new("Maria", "Daughter", PersonaEmotion::Upset);
        persona.voice = voice;
        VignetteConfig::new(
            VignetteId::new(id).unwrap(),
            "Delayed diagnosis",
            persona,
            vec![Phase::new(
                PhaseId::new("open").unwrap(),
                1,
                "Open",
                ExitCondition::after_turns(3),
            )],
            ModelConfig::new(ModelId::Scripted),
        )
    }

    async fn setup(speech: MockSpeechSynthesizer) -> NarrateVoiceLineHandler {
        let store = Arc::new(InMemoryVignetteStore::new());
        store
            .insert(vignette(
                "voiced",
                Some(VoiceConfig::new("maria-voice").with_opening_line("Where is the doctor?")),
            ))
            .await
            .unwrap();
        store.insert(vignette("silent", None)).await.unwrap();
        NarrateVoiceLineHandler::new(store, Arc::new(speech))
    }

    fn command(id: &str, line: VoiceLine) -> NarrateVoiceLineCommand {
        NarrateVoiceLineCommand {
            vignette_id: VignetteId::new(id).unwrap(),
            line,
        }
    }

    #[tokio::test]
    async fn synthesizes_authored_line() {
        let speech = MockSpeechSynthesizer::new().with_voices(["maria-voice"]);
        let handler = setup(speech.clone()).await;

        let audio = handler
            .handle(command("voiced", VoiceLine::Opening))
            .await
            .unwrap();

        assert!(!audio.bytes.is_empty());
        let calls = speech.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].text, "Where is the doctor?");
    }

    #[tokio::test]
    async fn missing_line_is_reported() {
        let handler = setup(MockSpeechSynthesizer::new().with_voices(["maria-voice"])).await;

        let result = handler.handle(command("voiced", VoiceLine::Closing)).await;

        assert!(matches!(
            result,
            Err(NarrateVoiceLineError::LineNotAuthored(VoiceLine::Closing))
        ));
    }

    #[tokio::test]
    async fn vignette_without_voice_is_reported() {
        let handler = setup(MockSpeechSynthesizer::new()).await;

        let result = handler.handle(command("silent", VoiceLine::Opening)).await;

        assert!(matches!(result, Err(NarrateVoiceLineError::NoVoice(_))));
    }

    #[tokio::test]
    async fn speech_outage_surfaces() {
        let handler = setup(MockSpeechSynthesizer::new().unavailable()).await;

        let result = handler.handle(command("voiced", VoiceLine::Opening)).await;

        assert!(matches!(
            result,
            Err(NarrateVoiceLineError::Speech(SpeechError::Unavailable(_)))
        ));
    }
}
