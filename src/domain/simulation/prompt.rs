//! System prompt composition for the persona.
//!
//! The prompt is rebuilt every turn from the vignette, the active phase and
//! the persona's emotional state. The emotional *delta* is spelled out more
//! prominently than the absolute value.

use crate::domain::vignette::{Difficulty, Phase, VignetteConfig};

use super::emotion::{EmotionalBand, EmotionalTrend};

/// Longest reply, in sentences, the persona is asked to give.
pub const MAX_REPLY_SENTENCES: usize = 4;

/// Everything the composer needs for one turn.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub vignette: &'a VignetteConfig,
    pub phase: &'a Phase,
    pub difficulty: Difficulty,
    pub emotional_value: f64,
    pub emotional_delta: f64,
    /// True when this reply closes the encounter.
    pub closing: bool,
}

/// Builds the persona system prompt.
pub fn compose_system_prompt(ctx: &PromptContext<'_>) -> String {
    let persona = &ctx.vignette.persona;

    let mut prompt = format!(
        "You are {}, {}. You are speaking with a medical trainee in a role-play called \"{}\".\n",
        persona.name, persona.role, ctx.vignette.title
    );

    if let Some(traits) = persona.traits_for(ctx.difficulty) {
        prompt.push_str(&format!("\nHow you behave: {}\n", traits));
    }

    prompt.push_str(&format!("\nCurrent stage of the conversation: {}\n", ctx.phase.goal));

    let band = EmotionalBand::for_value(ctx.emotional_value);
    let trend = EmotionalTrend::for_delta(ctx.emotional_delta);
    prompt.push_str(&format!(
        "\nEMOTIONAL SHIFT THIS TURN: {}\n",
        trend_instruction(trend, ctx.emotional_delta)
    ));
    prompt.push_str(&format!(
        "Overall you are {} (intensity {:.2} on a scale from -1 calm to 1 distressed).\n",
        band.description(),
        ctx.emotional_value
    ));

    if !ctx.vignette.facts.is_empty() {
        prompt.push_str("\nWhat you know about the situation:\n");
        for fact in &ctx.vignette.facts {
            prompt.push_str(&format!("- {}\n", fact));
        }
    }

    prompt.push_str("\nRules:\n");
    prompt.push_str("- Stay in character. Never mention being an AI or a simulation.\n");
    prompt.push_str(&format!(
        "- Keep each reply to at most {} sentences of natural speech.\n",
        MAX_REPLY_SENTENCES
    ));
    prompt.push_str("- If the trainee uses medical jargon, ask them what it means.\n");
    prompt.push_str("- Only rely on the facts above; do not invent new medical details.\n");

    if ctx.closing {
        prompt.push_str(
            "\nThis is the end of the conversation. Respond in a way that brings it to a natural close.\n",
        );
    }

    prompt
}

fn trend_instruction(trend: EmotionalTrend, delta: f64) -> String {
    match trend {
        EmotionalTrend::Escalating => format!(
            "the trainee's last message made you MORE upset (+{:.2}). Let that show.",
            delta
        ),
        EmotionalTrend::Easing => format!(
            "the trainee's last message helped you feel a little better ({:.2}). Soften slightly.",
            delta
        ),
        EmotionalTrend::Steady => "your feelings have not changed.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{PhaseId, VignetteId};
    use crate::domain::vignette::{ExitCondition, ModelConfig, ModelId, Persona, PersonaEmotion};

    fn vignette() -> VignetteConfig {
        VignetteConfig::new(
            VignetteId::new("upset-daughter").unwrap(),
            "Delayed diagnosis",
            Persona::new("Maria", "daughter of the patient in bed 4", PersonaEmotion::Upset)
                .with_traits(Difficulty::Advanced, "Interrupts and demands a supervisor"),
            vec![Phase::new(
                PhaseId::new("open").unwrap(),
                1,
                "Introduce yourself and acknowledge the wait",
                ExitCondition::after_turns(3),
            )],
            ModelConfig::new(ModelId::Scripted),
        )
        .with_facts(["Her father waited six hours", "The CT scan showed a small bleed"])
    }

    fn compose(difficulty: Difficulty, delta: f64, closing: bool) -> String {
        let v = vignette();
        let phase = v.phases[0].clone();
        compose_system_prompt(&PromptContext {
            vignette: &v,
            phase: &phase,
            difficulty,
            emotional_value: 0.6,
            emotional_delta: delta,
            closing,
        })
    }

    #[test]
    fn includes_identity_goal_and_facts() {
        let prompt = compose(Difficulty::Beginner, 0.0, false);
        assert!(prompt.contains("You are Maria, daughter of the patient in bed 4"));
        assert!(prompt.contains("acknowledge the wait"));
        assert!(prompt.contains("- Her father waited six hours"));
        assert!(prompt.contains("- The CT scan showed a small bleed"));
    }

    #[test]
    fn traits_depend_on_difficulty() {
        assert!(compose(Difficulty::Advanced, 0.0, false).contains("demands a supervisor"));
        assert!(!compose(Difficulty::Beginner, 0.0, false).contains("demands a supervisor"));
    }

    #[test]
    fn delta_direction_is_emphasised() {
        assert!(compose(Difficulty::Beginner, 0.2, false).contains("MORE upset (+0.20)"));
        assert!(compose(Difficulty::Beginner, -0.05, false).contains("feel a little better"));
        assert!(compose(Difficulty::Beginner, 0.0, false).contains("have not changed"));
    }

    #[test]
    fn includes_response_rules() {
        let prompt = compose(Difficulty::Beginner, 0.0, false);
        assert!(prompt.contains("Stay in character"));
        assert!(prompt.contains("at most 4 sentences"));
        assert!(prompt.contains("jargon"));
    }

    #[test]
    fn sections_are_separated_by_blank_lines() {
        let prompt = compose(Difficulty::Advanced, 0.0, false);
        assert!(prompt.starts_with("You are Maria"));
        assert!(prompt.contains("\n\nHow you behave: Interrupts"));
        assert!(prompt.contains("\n\nWhat you know about the situation:\n- Her father"));
        assert!(prompt.contains("\n\nRules:\n- Stay in character."));
        assert!(prompt.ends_with("new medical details.\n"));
    }

    #[test]
    fn closing_note_only_when_closing() {
        assert!(compose(Difficulty::Beginner, 0.0, true).contains("natural close"));
        assert!(!compose(Difficulty::Beginner, 0.0, false).contains("natural close"));
    }
}
