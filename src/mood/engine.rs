//! Mood scoring
//!
//! A bounded interaction log turned into a discrete emotional category.
//! Scoring is a pure function of the log so the same history always yields
//! the same mood; the engine itself only manages persistence and appends.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::gateway::PresenceState;
use crate::store::{KvStore, KvStoreExt};

/// Store key for the interaction log
pub const MOOD_LOG_KEY: &str = "mood-history";

/// Log capacity; the oldest entry is silently evicted beyond this
pub const MAX_HISTORY: usize = 50;

/// How many newest records participate in scoring
const RECENT_WINDOW: usize = 10;

/// Score thresholds for the happy/angry bands
const HAPPY_THRESHOLD: f64 = 3.0;
const ANGRY_THRESHOLD: f64 = -2.0;

/// Discrete emotional category, derived and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Angry,
    #[default]
    Neutral,
}

/// How an interaction felt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// What produced the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    StateTransition,
    Manual,
}

/// One immutable log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp_ms: i64,
    pub kind: RecordKind,
    pub sentiment: Sentiment,
}

/// Recency-weighted score over the newest-first log.
///
/// Record i (0 = newest) weighs (10 - i) / 10. A negative record costs 1.5x
/// what a positive one earns, so one recent failure sours the mood faster
/// than it recovers.
pub fn score(records: &[InteractionRecord]) -> f64 {
    records
        .iter()
        .take(RECENT_WINDOW)
        .enumerate()
        .map(|(i, record)| {
            let weight = (RECENT_WINDOW - i) as f64 / RECENT_WINDOW as f64;
            match record.sentiment {
                Sentiment::Positive => weight * 2.0,
                Sentiment::Negative => weight * -3.0,
                Sentiment::Neutral => weight * 0.5,
            }
        })
        .sum()
}

/// Discrete mood for a newest-first log
pub fn mood_for(records: &[InteractionRecord]) -> Mood {
    if records.is_empty() {
        return Mood::Neutral;
    }
    let score = score(records);
    if score > HAPPY_THRESHOLD {
        Mood::Happy
    } else if score < ANGRY_THRESHOLD {
        Mood::Angry
    } else {
        Mood::Neutral
    }
}

/// Store-backed mood engine. The log is re-read before every append so
/// multiple instances over the same store stay coherent.
pub struct MoodEngine {
    store: Arc<dyn KvStore>,
}

impl MoodEngine {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Append a record (newest first), evict beyond capacity, persist, and
    /// return the recomputed mood.
    pub fn record(&self, kind: RecordKind, sentiment: Sentiment, now_ms: i64) -> Result<Mood> {
        let mut log = self.load_log();
        log.insert(
            0,
            InteractionRecord {
                timestamp_ms: now_ms,
                kind,
                sentiment,
            },
        );
        log.truncate(MAX_HISTORY);

        self.store.set_json(MOOD_LOG_KEY, &log)?;
        let mood = mood_for(&log);
        debug!("Recorded {:?}/{:?} interaction, mood now {:?}", kind, sentiment, mood);
        Ok(mood)
    }

    /// Manual nudge from the host (feedback buttons, scripted demos)
    pub fn record_manual(&self, sentiment: Sentiment, now_ms: i64) -> Result<Mood> {
        self.record(RecordKind::Manual, sentiment, now_ms)
    }

    /// Automatic recording driven by presence transitions: entering Error is
    /// a negative interaction, entering Speaking a positive one. All other
    /// states leave the log untouched.
    pub fn note_transition(&self, entered: PresenceState, now_ms: i64) -> Mood {
        let sentiment = match entered {
            PresenceState::Error => Some(Sentiment::Negative),
            PresenceState::Speaking => Some(Sentiment::Positive),
            _ => None,
        };

        match sentiment {
            Some(sentiment) => self
                .record(RecordKind::StateTransition, sentiment, now_ms)
                .unwrap_or_else(|e| {
                    warn!("Failed to record mood transition: {}", e);
                    self.mood()
                }),
            None => self.mood(),
        }
    }

    /// Current mood, a pure function of the persisted log
    pub fn mood(&self) -> Mood {
        mood_for(&self.load_log())
    }

    /// Newest-first log snapshot
    pub fn history(&self) -> Vec<InteractionRecord> {
        self.load_log()
    }

    fn load_log(&self) -> Vec<InteractionRecord> {
        match self.store.get_json::<Vec<InteractionRecord>>(MOOD_LOG_KEY) {
            Ok(Some(log)) => log,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load mood history, starting empty: {}", e);
                Vec::new()
            }
        }
    }
}
