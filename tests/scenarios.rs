//! End-to-end conversation scenarios against the scripted backend.

use std::sync::Arc;

use encounter_sim::adapters::ai::{MockError, MockModelProvider};
use encounter_sim::domain::foundation::{PhaseId, UserId, VignetteId};
use encounter_sim::domain::simulation::{
    ConversationEngine, EngineError, EngineSettings, SessionState, SessionStatus,
    TransitionReason,
};
use encounter_sim::domain::vignette::{
    CriticalErrorFlag, Difficulty, EmotionThreshold, ExitCondition, ModelConfig, ModelId,
    Persona, PersonaEmotion, Phase, RubricDimension, VignetteConfig,
};
use encounter_sim::ports::{ChatRole, GenerationFailure};

fn pid(s: &str) -> PhaseId {
    PhaseId::new(s).unwrap()
}

/// Two phases: three turns to acknowledge, two turns to close.
fn two_phase_vignette() -> VignetteConfig {
    VignetteConfig::new(
        VignetteId::new("upset-daughter").unwrap(),
        "Delayed diagnosis",
        Persona::new("Maria", "Daughter of the patient", PersonaEmotion::Upset),
        vec![
            Phase::new(pid("acknowledge"), 1, "Acknowledge", ExitCondition::after_turns(3))
                .with_rubric_focus([RubricDimension::Empathy]),
            Phase::new(pid("close"), 2, "Close", ExitCondition::after_turns(2))
                .with_rubric_focus([RubricDimension::Clarity]),
        ],
        ModelConfig::new(ModelId::Scripted),
    )
    .with_escalation_triggers(["calm down", "policy"])
    .with_deescalation_cues(["i'm sorry"])
    .with_disallowed_phrases(["you're overreacting"])
    .with_facts(["The scan was delayed by a lab error."])
}

/// The two-phase vignette with no escalation triggers or cues.
fn quiet_vignette() -> VignetteConfig {
    VignetteConfig::new(
        VignetteId::new("quiet-daughter").unwrap(),
        "Delayed diagnosis",
        Persona::new("Maria", "Daughter of the patient", PersonaEmotion::Upset),
        vec![
            Phase::new(pid("acknowledge"), 1, "Acknowledge", ExitCondition::after_turns(3)),
            Phase::new(pid("close"), 2, "Close", ExitCondition::after_turns(2)),
        ],
        ModelConfig::new(ModelId::Scripted),
    )
}

fn engine(provider: MockModelProvider) -> ConversationEngine<MockModelProvider> {
    ConversationEngine::new(Arc::new(provider), EngineSettings::default())
}

fn start(engine: &ConversationEngine<MockModelProvider>, vignette: &VignetteConfig) -> SessionState {
    engine
        .start_session(vignette, Difficulty::Intermediate, UserId::new("trainee-1").unwrap())
        .unwrap()
}

#[tokio::test]
async fn basic_flow_advances_then_completes() {
    let vignette = two_phase_vignette();
    let engine = engine(MockModelProvider::new());
    let mut state = start(&engine, &vignette);

    let messages = [
        "Hello, I'm the resident.",
        "I can see this has been hard.",
        "Tell me what happened.",
        "First we will review the scan.",
        "Then I will come back to you.",
    ];

    let mut transitions = Vec::new();
    for (i, message) in messages.iter().enumerate() {
        let result = engine.process_message(&vignette, &state, message).await.unwrap();
        if let Some(transition) = &result.phase_transition {
            transitions.push((i + 1, transition.to.clone()));
        }
        let done = result.session_complete();
        state = result.state;
        assert_eq!(done, i == messages.len() - 1);
    }

    assert_eq!(transitions, vec![(3, pid("close"))]);
    assert_eq!(state.status, SessionStatus::Complete);
    assert_eq!(state.turn_count, 5);
    assert_eq!(state.revision, 5);
    assert_eq!(state.history.len(), 10);
    assert!(matches!(
        state.completion_reason,
        Some(TransitionReason::TurnCeiling { turns: 2 })
    ));

    let after = engine.process_message(&vignette, &state, "One more thing").await;
    assert!(matches!(after, Err(EngineError::SessionComplete { .. })));
}

#[tokio::test]
async fn without_triggers_emotion_only_decays() {
    let vignette = quiet_vignette();
    let engine = engine(MockModelProvider::new());
    let mut state = start(&engine, &vignette);
    let baseline = state.emotional_state.value;

    let messages = [
        "Hello, I'm the resident.",
        "You must be worried. Calm down, please.",
        "Tell me what happened.",
        "First we will review the scan.",
        "Then I will come back to you.",
    ];

    let mut phases = Vec::new();
    for message in messages {
        let result = engine.process_message(&vignette, &state, message).await.unwrap();
        state = result.state;
        phases.push(state.current_phase_id.clone());
    }

    assert_eq!(
        phases,
        vec![
            pid("acknowledge"),
            pid("acknowledge"),
            pid("close"),
            pid("close"),
            pid("close"),
        ]
    );
    assert_eq!(state.status, SessionStatus::Complete);

    let expected: Vec<f64> = (0..=5).map(|turn| baseline - 0.05 * turn as f64).collect();
    assert_eq!(state.emotional_state.history.len(), expected.len());
    for (actual, expected) in state.emotional_state.history.iter().zip(&expected) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }
}

#[tokio::test]
async fn trigger_escalates_persona() {
    let vignette = two_phase_vignette();
    let engine = engine(MockModelProvider::new());
    let state = start(&engine, &vignette);
    let baseline = state.emotional_state.value;

    let result = engine
        .process_message(&vignette, &state, "You need to calm down.")
        .await
        .unwrap();

    // decay 0.05 toward neutral, then one trigger at +0.25
    assert!((result.emotional_value - (baseline - 0.05 + 0.25)).abs() < 1e-9);
    assert!(result.emotional_delta > 0.0);
}

#[tokio::test]
async fn stacked_triggers_clamp_at_ceiling() {
    let vignette = two_phase_vignette();
    let engine = engine(MockModelProvider::new());
    let mut state = start(&engine, &vignette);

    for _ in 0..2 {
        let result = engine
            .process_message(&vignette, &state, "Calm down, that's policy.")
            .await
            .unwrap();
        assert!(result.emotional_value <= 1.0);
        state = result.state;
    }

    assert_eq!(state.emotional_state.value, 1.0);
}

#[tokio::test]
async fn empathy_deescalates_persona() {
    let vignette = two_phase_vignette();
    let engine = engine(MockModelProvider::new());
    let state = start(&engine, &vignette);

    let result = engine
        .process_message(&vignette, &state, "I'm sorry this happened.")
        .await
        .unwrap();

    assert!(result.emotional_delta < 0.0);
    assert!(result.assessment_update.contributions[&RubricDimension::Empathy] > 1.0);
}

#[tokio::test]
async fn critical_flag_persists() {
    let vignette = two_phase_vignette();
    let engine = engine(MockModelProvider::new());
    let state = start(&engine, &vignette);

    let flagged = engine
        .process_message(&vignette, &state, "Honestly, you're overreacting.")
        .await
        .unwrap();
    assert!(flagged
        .assessment_update
        .new_flags
        .contains(&CriticalErrorFlag::DisallowedLanguage));

    let later = engine
        .process_message(&vignette, &flagged.state, "I'm sorry, that came out wrong.")
        .await
        .unwrap();

    assert!(later.assessment_update.new_flags.is_empty());
    assert!(later
        .state
        .assessment
        .flags
        .contains(&CriticalErrorFlag::DisallowedLanguage));
}

#[tokio::test]
async fn ended_session_rejects_turns() {
    let vignette = two_phase_vignette();
    let engine = engine(MockModelProvider::new());
    let state = start(&engine, &vignette);

    let ended = engine.end_session(&state, &vignette).unwrap();
    assert_eq!(ended.status, SessionStatus::Ended);
    assert_eq!(ended.revision, state.revision + 1);

    let result = engine.process_message(&vignette, &ended, "Hello?").await;
    assert!(matches!(
        result,
        Err(EngineError::SessionComplete {
            status: SessionStatus::Ended,
            ..
        })
    ));
}

#[tokio::test]
async fn failed_generation_can_be_retried() {
    let vignette = two_phase_vignette();
    let engine = engine(
        MockModelProvider::new()
            .with_error(MockError::Unavailable {
                message: "overloaded".to_string(),
            })
            .with_response("Who are you?"),
    );
    let state = start(&engine, &vignette);
    let snapshot = state.clone();

    let failed = engine
        .process_message(&vignette, &state, "Please calm down.")
        .await;
    match failed {
        Err(EngineError::Generation(failure)) => assert!(failure.is_retryable()),
        other => panic!("expected a generation failure, got {:?}", other),
    }
    assert_eq!(state, snapshot);

    let expected = engine.prepare_turn(&vignette, &state, "Please calm down.").unwrap();
    let retried = engine
        .process_message(&vignette, &state, "Please calm down.")
        .await
        .unwrap();

    assert_eq!(retried.response_text, "Who are you?");
    assert_eq!(retried.state.assessment, expected.state.assessment);
    assert_eq!(retried.state.emotional_state, expected.state.emotional_state);
    assert_eq!(retried.state.turn_count, 1);
    assert_eq!(retried.state.revision, 1);
}

#[tokio::test]
async fn empty_reply_is_a_failure() {
    let vignette = two_phase_vignette();
    let engine = engine(MockModelProvider::new().with_response("   "));
    let state = start(&engine, &vignette);

    let result = engine.process_message(&vignette, &state, "Hello").await;

    assert!(matches!(
        result,
        Err(EngineError::Generation(GenerationFailure::EmptyResponse))
    ));
}

#[tokio::test]
async fn emotion_threshold_ends_phase_early() {
    let vignette = VignetteConfig::new(
        VignetteId::new("anxious-father").unwrap(),
        "Waiting room",
        Persona::new("Tom", "Father", PersonaEmotion::Concerned),
        vec![
            Phase::new(
                pid("settle"),
                1,
                "Settle him",
                ExitCondition::after_turns(5).with_emotion_threshold(EmotionThreshold::Below(-0.05)),
            ),
            Phase::new(pid("explain"), 2, "Explain", ExitCondition::after_turns(5)),
        ],
        ModelConfig::new(ModelId::Scripted),
    )
    .with_deescalation_cues(["i'm sorry"]);
    let engine = engine(MockModelProvider::new());
    let state = start(&engine, &vignette);

    // 0.2 decays to 0.15 and one cue brings it to neutral; the next cue crosses
    let first = engine
        .process_message(&vignette, &state, "I'm sorry.")
        .await
        .unwrap();
    assert!(first.phase_transition.is_none());

    let second = engine
        .process_message(&vignette, &first.state, "I'm sorry.")
        .await
        .unwrap();
    let transition = second.phase_transition.expect("phase should advance");
    assert_eq!(transition.to, pid("explain"));
    assert!(matches!(
        transition.reason,
        TransitionReason::EmotionThreshold { .. }
    ));
}

#[tokio::test]
async fn model_sees_only_recent_turns() {
    let vignette = two_phase_vignette();
    let provider = MockModelProvider::new();
    let engine = ConversationEngine::new(
        Arc::new(provider.clone()),
        EngineSettings {
            history_window_turns: 2,
            ..EngineSettings::default()
        },
    );
    let mut state = start(&engine, &vignette);

    for message in ["one", "two", "three", "four"] {
        state = engine
            .process_message(&vignette, &state, message)
            .await
            .unwrap()
            .state;
    }

    let last = provider.get_calls().pop().unwrap();
    let texts: Vec<_> = last.history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(last.history.len(), 3);
    assert_eq!(texts[0], "three");
    assert_eq!(last.history[0].role, ChatRole::User);
    assert_eq!(texts[2], "four");
}

#[tokio::test]
async fn flag_from_turn_two_is_still_reported_on_turn_five() {
    let vignette = two_phase_vignette();
    let engine = engine(MockModelProvider::new());
    let mut state = start(&engine, &vignette);

    let messages = [
        "Hello, I'm the resident.",
        "Honestly, you're overreacting.",
        "Let me explain the delay.",
        "The scan is done now.",
        "I will come back within the hour.",
    ];

    let mut last = None;
    for (turn, message) in messages.iter().enumerate() {
        let result = engine.process_message(&vignette, &state, message).await.unwrap();
        if turn == 1 {
            assert!(result
                .assessment_update
                .new_flags
                .contains(&CriticalErrorFlag::DisallowedLanguage));
        }
        state = result.state.clone();
        last = Some(result);
    }

    let turn_five = last.unwrap();
    assert_eq!(turn_five.state.current_phase_id, pid("close"));
    assert!(turn_five.session_complete());
    assert!(turn_five.assessment_update.new_flags.is_empty());
    assert!(turn_five
        .assessment_update
        .flags
        .contains(&CriticalErrorFlag::DisallowedLanguage));
}
