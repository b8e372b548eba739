//! Mood Engine
//!
//! Slow-moving emotional state derived from interaction history, distinct
//! from the presence state machine. Purely additive decoration for the
//! render pipeline; its failures never affect connection correctness.

pub mod engine;

pub use engine::{
    mood_for, score, InteractionRecord, Mood, MoodEngine, RecordKind, Sentiment, MAX_HISTORY,
    MOOD_LOG_KEY,
};
