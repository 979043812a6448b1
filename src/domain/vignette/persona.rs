//! The AI-portrayed character a trainee converses with.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Difficulty;

/// Authored starting emotion of a persona.
///
/// The numeric scale runs from -1.0 (fully calm) to 1.0 (maximally
/// distressed); 0.0 is neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaEmotion {
    Calm,
    Neutral,
    Concerned,
    Anxious,
    Upset,
    Angry,
    Distraught,
}

impl PersonaEmotion {
    /// Returns the numeric baseline this emotion maps to.
    pub fn baseline(&self) -> f64 {
        match self {
            PersonaEmotion::Calm => -0.4,
            PersonaEmotion::Neutral => 0.0,
            PersonaEmotion::Concerned => 0.2,
            PersonaEmotion::Anxious => 0.4,
            PersonaEmotion::Upset => 0.6,
            PersonaEmotion::Angry => 0.8,
            PersonaEmotion::Distraught => 0.9,
        }
    }
}

/// Pre-authored narration lines for an external text-to-speech service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Voice identifier understood by the speech service.
    pub voice_id: String,
    #[serde(default)]
    pub opening_line: Option<String>,
    #[serde(default)]
    pub closing_line: Option<String>,
    #[serde(default)]
    pub context_brief: Option<String>,
}

/// Which narration line to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceLine {
    Opening,
    Closing,
    ContextBrief,
}

impl VoiceConfig {
    /// Creates a voice with no authored lines.
    pub fn new(voice_id: impl Into<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            opening_line: None,
            closing_line: None,
            context_brief: None,
        }
    }

    /// Sets the opening line.
    pub fn with_opening_line(mut self, line: impl Into<String>) -> Self {
        self.opening_line = Some(line.into());
        self
    }

    /// Sets the closing line.
    pub fn with_closing_line(mut self, line: impl Into<String>) -> Self {
        self.closing_line = Some(line.into());
        self
    }

    /// Sets the context brief.
    pub fn with_context_brief(mut self, brief: impl Into<String>) -> Self {
        self.context_brief = Some(brief.into());
        self
    }

    /// Returns the text of a narration line, if authored.
    pub fn line(&self, line: VoiceLine) -> Option<&str> {
        match line {
            VoiceLine::Opening => self.opening_line.as_deref(),
            VoiceLine::Closing => self.closing_line.as_deref(),
            VoiceLine::ContextBrief => self.context_brief.as_deref(),
        }
    }
}

/// The character the model portrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    /// Relationship to the case, e.g. "daughter of the patient in bed 4".
    pub role: String,
    pub initial_emotion: PersonaEmotion,
    /// Behavioural notes keyed by the difficulty they apply to.
    #[serde(default)]
    pub traits: BTreeMap<Difficulty, String>,
    #[serde(default)]
    pub voice: Option<VoiceConfig>,
}

impl Persona {
    /// Creates a persona with no traits or voice.
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        initial_emotion: PersonaEmotion,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            initial_emotion,
            traits: BTreeMap::new(),
            voice: None,
        }
    }

    /// Adds traits for a difficulty.
    pub fn with_traits(mut self, difficulty: Difficulty, traits: impl Into<String>) -> Self {
        self.traits.insert(difficulty, traits.into());
        self
    }

    /// Sets the narration voice.
    pub fn with_voice(mut self, voice: VoiceConfig) -> Self {
        self.voice = Some(voice);
        self
    }

    /// Returns the traits for a difficulty, if any were authored.
    pub fn traits_for(&self, difficulty: Difficulty) -> Option<&str> {
        self.traits.get(&difficulty).map(String::as_str)
    }
}
