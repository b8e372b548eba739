//! End-to-end presence flow over the synchronous machine core: the full
//! envelope scenario, streaming semantics, and the mood coupling driven by
//! state transitions.

use std::sync::Arc;

use aura_face::gateway::{InboundEnvelope, PresenceState, StateMachine};
use aura_face::mood::{Mood, MoodEngine, Sentiment};
use aura_face::store::MemoryStore;

fn apply(machine: &mut StateMachine, raw: &str) -> Option<aura_face::gateway::Transition> {
    let envelope = InboundEnvelope::parse(raw).expect("frame should parse");
    machine.handle_envelope(&envelope)
}

#[test]
fn test_fresh_session_scenario() {
    let mut machine = StateMachine::new();
    machine.begin_connect(true);
    assert_eq!(machine.state(), PresenceState::Connecting);

    apply(&mut machine, r#"{"type":"connected"}"#);
    assert_eq!(machine.state(), PresenceState::Idle);

    apply(&mut machine, r#"{"type":"chat.start"}"#);
    assert_eq!(machine.state(), PresenceState::Thinking);

    apply(&mut machine, r#"{"type":"chat.delta","content":"Hel"}"#);
    apply(&mut machine, r#"{"type":"chat.delta","content":"lo"}"#);
    assert_eq!(machine.state(), PresenceState::Speaking);
    assert_eq!(machine.response_text(), "Hello");

    apply(&mut machine, r#"{"type":"chat.end","content":"Hello there"}"#);
    assert_eq!(machine.state(), PresenceState::Idle);
    assert_eq!(machine.response_text(), "Hello there");
}

#[test]
fn test_delta_stream_end_replaces_not_appends() {
    let mut machine = StateMachine::new();
    apply(&mut machine, r#"{"type":"connected"}"#);
    apply(&mut machine, r#"{"type":"chat.start"}"#);

    for fragment in ["a", "b", "c", "d"] {
        apply(
            &mut machine,
            &format!(r#"{{"type":"chat.stream","text":"{fragment}"}}"#),
        );
    }
    assert_eq!(machine.response_text(), "abcd");

    apply(&mut machine, r#"{"type":"chat","content":"final answer"}"#);
    assert_eq!(machine.response_text(), "final answer");
    assert_ne!(machine.response_text(), "abcdfinal answer");
}

#[test]
fn test_envelope_order_determines_state() {
    // Processing the same envelopes in order always lands in the state the
    // transition table dictates; nothing is skipped or reordered.
    let frames = [
        (r#"{"type":"connected"}"#, PresenceState::Idle),
        (r#"{"type":"thinking"}"#, PresenceState::Thinking),
        (r#"{"type":"chat.delta","text":"x"}"#, PresenceState::Speaking),
        (r#"{"type":"error","message":"oops"}"#, PresenceState::Error),
        (r#"{"type":"chat.start"}"#, PresenceState::Thinking),
        (r#"{"type":"chat.end"}"#, PresenceState::Idle),
        (r#"{"type":"unknown.tag"}"#, PresenceState::Idle),
    ];

    let mut machine = StateMachine::new();
    for (raw, expected) in frames {
        apply(&mut machine, raw);
        assert_eq!(machine.state(), expected, "after frame {raw}");
    }
}

#[test]
fn test_malformed_frames_never_change_state() {
    let mut machine = StateMachine::new();
    apply(&mut machine, r#"{"type":"connected"}"#);

    for raw in ["", "garbage", r#"{"typ":"connected"}"#, "[]", "42"] {
        assert!(InboundEnvelope::parse(raw).is_none(), "{raw:?} should drop");
    }
    assert_eq!(machine.state(), PresenceState::Idle);
}

#[test]
fn test_transitions_drive_mood() {
    let mut machine = StateMachine::new();
    let mood = MoodEngine::new(Arc::new(MemoryStore::new()));
    let mut now = 0;
    let mut mood_value = Mood::Neutral;

    let mut feed = |machine: &mut StateMachine, raw: &str, now: &mut i64| {
        *now += 1;
        apply(machine, raw).map(|t| mood.note_transition(t.to, *now))
    };

    // A streak of completed replies: entering Speaking repeatedly is the
    // positive signal
    let _ = feed(&mut machine, r#"{"type":"connected"}"#, &mut now);
    for _ in 0..4 {
        let _ = feed(&mut machine, r#"{"type":"chat.start"}"#, &mut now);
        if let Some(updated) = feed(&mut machine, r#"{"type":"chat.delta","text":"ok"}"#, &mut now)
        {
            mood_value = updated;
        }
        let _ = feed(&mut machine, r#"{"type":"chat.end","content":"ok"}"#, &mut now);
    }
    assert_eq!(mood_value, Mood::Happy);

    // Errors weigh 1.5x harder; a burst of them sours the mood
    for _ in 0..4 {
        if let Some(updated) = feed(&mut machine, r#"{"type":"error","message":"boom"}"#, &mut now)
        {
            mood_value = updated;
        }
        let _ = feed(&mut machine, r#"{"type":"chat.start"}"#, &mut now);
    }
    assert_eq!(mood_value, Mood::Angry);

    // Idle/Thinking transitions never auto-record
    let history = mood.history();
    assert!(history.len() == 8, "only Speaking/Error entries: {}", history.len());
    assert!(history
        .iter()
        .all(|r| matches!(r.sentiment, Sentiment::Positive | Sentiment::Negative)));
}
