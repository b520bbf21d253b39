//! Lexical and temporal scoring primitives shared by context selection and
//! working-memory retrieval.
//!
//! All lexical functions lowercase the input and split on whitespace; no
//! stemming or stop-word removal.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Decay rate per day of age.
const DECAY_PER_DAY: f64 = 0.1;

/// Recency never falls below this floor.
pub const RECENCY_FLOOR: f64 = 0.1;

/// Lowercased, whitespace-delimited word set.
pub fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// Jaccard similarity of the content and query word sets.
///
/// Returns 0.0 when the query has no words.
pub fn jaccard(content: &str, query: &str) -> f64 {
    let query_words = word_set(query);
    if query_words.is_empty() {
        return 0.0;
    }
    let content_words = word_set(content);

    let intersection = content_words.intersection(&query_words).count();
    let union = content_words.union(&query_words).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Share of query words that appear in the content.
///
/// Returns 0.0 when the query has no words.
pub fn query_coverage(content: &str, query: &str) -> f64 {
    let query_words = word_set(query);
    if query_words.is_empty() {
        return 0.0;
    }
    let content_words = word_set(content);
    let hits = query_words
        .iter()
        .filter(|w| content_words.contains(*w))
        .count();
    hits as f64 / query_words.len() as f64
}

/// Exponential recency decay: `exp(-0.1 * age_hours / 24)` clamped to `[0.1, 1.0]`.
///
/// Timestamps in the future count as age zero.
pub fn recency(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_hours = (now - timestamp).num_milliseconds() as f64 / 3_600_000.0;
    let score = (-DECAY_PER_DAY * age_hours.max(0.0) / 24.0).exp();
    score.clamp(RECENCY_FLOOR, 1.0)
}

/// Importance multiplier in `[0.8, 1.2]`.
pub fn importance_weight(importance: f64) -> f64 {
    0.8 + importance * 0.4
}
