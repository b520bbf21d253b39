//! Working memory — a small, capacity- and age-bounded store of short-lived items.
//!
//! Items are held in an arena keyed by insertion sequence, with an id index
//! for direct lookup. Every mutating call enforces two invariants:
//!
//! - **Capacity**: `len() <= max_capacity`
//! - **Freshness**: no surviving item is older than `max_age`
//!
//! When the store is full, the item with the lowest priority
//! (`recency × importance weight`) is evicted; ties go to the oldest item.
//!
//! The store has no internal synchronization. Share it through
//! [`SharedWorkingMemory`](crate::SharedWorkingMemory).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tessera_config::{MAX_WORKING_MEMORY_AGE_MINUTES, WorkingMemoryConfig};
use tessera_core::error::MemoryError;
use tessera_core::score;
use tracing::debug;
use uuid::Uuid;

use crate::vector::TfIdfIndex;

/// Weight of the vector score when it is available.
const VECTOR_WEIGHT: f64 = 0.7;
/// Weight of the keyword score when a vector score is available.
const KEYWORD_WEIGHT: f64 = 0.3;

// ── Data Structures ───────────────────────────────────────────────────────

/// A single working-memory item. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    id: String,
    content: String,
    importance: f64,
    timestamp: DateTime<Utc>,
}

impl MemoryItem {
    /// Create an item stamped with the current time and a fresh UUID.
    pub fn new(content: impl Into<String>, importance: f64) -> Result<Self, MemoryError> {
        Self::with_id(Uuid::new_v4().to_string(), content, importance, Utc::now())
    }

    /// Create an item with an explicit id and timestamp.
    pub fn with_id(
        id: impl Into<String>,
        content: impl Into<String>,
        importance: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, MemoryError> {
        if !(0.0..=1.0).contains(&importance) {
            return Err(MemoryError::InvalidImportance(importance));
        }
        Ok(Self {
            id: id.into(),
            content: content.into(),
            importance,
            timestamp,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn importance(&self) -> f64 {
        self.importance
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Eviction priority: recency scaled by importance.
    fn priority(&self, now: DateTime<Utc>) -> f64 {
        score::recency(self.timestamp, now) * score::importance_weight(self.importance)
    }
}

/// A retrieval hit with its final score.
#[derive(Debug, Clone)]
pub struct ScoredItem {
    pub item: MemoryItem,
    pub score: f64,
}

/// Point-in-time summary of the store.
#[derive(Debug, Clone, Serialize)]
pub struct WorkingMemoryStats {
    pub count: usize,
    pub capacity: usize,
    pub average_importance: f64,
    pub oldest: Option<DateTime<Utc>>,
}

/// Bounded working-memory store.
#[derive(Debug, Clone)]
pub struct WorkingMemoryStore {
    items: BTreeMap<u64, MemoryItem>,
    by_id: HashMap<String, u64>,
    next_seq: u64,
    max_capacity: usize,
    max_age: Duration,
    vector_index: bool,
}

// ── Implementation ────────────────────────────────────────────────────────

impl WorkingMemoryStore {
    /// Create a store holding at most `max_capacity` items, each for at most
    /// `max_age_minutes` (1 up to [`MAX_WORKING_MEMORY_AGE_MINUTES`]).
    pub fn new(max_capacity: usize, max_age_minutes: i64) -> Result<Self, MemoryError> {
        if max_capacity == 0 {
            return Err(MemoryError::InvalidCapacity);
        }
        let invalid_age = MemoryError::InvalidMaxAge {
            minutes: max_age_minutes,
            max: MAX_WORKING_MEMORY_AGE_MINUTES,
        };
        if !(1..=MAX_WORKING_MEMORY_AGE_MINUTES).contains(&max_age_minutes) {
            return Err(invalid_age);
        }
        let max_age = Duration::try_minutes(max_age_minutes).ok_or(invalid_age)?;
        Ok(Self {
            items: BTreeMap::new(),
            by_id: HashMap::new(),
            next_seq: 0,
            max_capacity,
            max_age,
            vector_index: true,
        })
    }

    /// Create a store from the `[working_memory]` config section.
    pub fn from_config(config: &WorkingMemoryConfig) -> Result<Self, MemoryError> {
        Ok(Self::new(config.max_capacity, config.max_age_minutes)?
            .with_vector_index(config.vector_index))
    }

    /// Enable or disable the TF-IDF vector score during retrieval.
    pub fn with_vector_index(mut self, enabled: bool) -> Self {
        self.vector_index = enabled;
        self
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &MemoryItem> {
        self.items.values()
    }

    pub fn get(&self, id: &str) -> Option<&MemoryItem> {
        self.by_id.get(id).and_then(|seq| self.items.get(seq))
    }

    // ── Mutation ──

    /// Add an item, expiring stale items and evicting if full. Returns its id.
    pub fn add(&mut self, item: MemoryItem) -> String {
        self.add_at(item, Utc::now())
    }

    /// [`add`](Self::add) against an explicit clock.
    ///
    /// Re-adding an existing id replaces the previous item. An item that is
    /// already older than `max_age` is not stored.
    pub fn add_at(&mut self, item: MemoryItem, now: DateTime<Utc>) -> String {
        self.expire_at(now);
        self.remove(&item.id);

        if item.timestamp < self.cutoff(now) {
            debug!(id = %item.id, "Skipped working memory item that is already expired");
            return item.id;
        }

        if self.items.len() >= self.max_capacity {
            self.evict_lowest_priority(now);
        }

        let id = item.id.clone();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_id.insert(id.clone(), seq);
        self.items.insert(seq, item);
        id
    }

    /// Remove an item by id. Returns `true` if it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.by_id.remove(id) {
            Some(seq) => self.items.remove(&seq).is_some(),
            None => false,
        }
    }

    /// Remove all items.
    pub fn clear(&mut self) {
        self.items.clear();
        self.by_id.clear();
    }

    /// Drop every item older than `max_age`. Returns how many were removed.
    pub fn expire_at(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = self.cutoff(now);
        let stale: Vec<u64> = self
            .items
            .iter()
            .filter(|(_, item)| item.timestamp < cutoff)
            .map(|(seq, _)| *seq)
            .collect();

        for seq in &stale {
            if let Some(item) = self.items.remove(seq) {
                self.by_id.remove(&item.id);
            }
        }

        if !stale.is_empty() {
            debug!(expired = stale.len(), remaining = self.items.len(), "Expired working memory");
        }
        stale.len()
    }

    /// Oldest timestamp still fresh at `now`.
    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn evict_lowest_priority(&mut self, now: DateTime<Utc>) {
        // Strict `<` keeps the first (oldest) item among equal priorities.
        let mut victim: Option<(u64, f64)> = None;
        for (seq, item) in &self.items {
            let priority = item.priority(now);
            match victim {
                Some((_, lowest)) if priority >= lowest => {}
                _ => victim = Some((*seq, priority)),
            }
        }

        if let Some((seq, priority)) = victim {
            if let Some(item) = self.items.remove(&seq) {
                self.by_id.remove(&item.id);
                debug!(id = %item.id, priority, "Evicted lowest-priority working memory");
            }
        }
    }

    // ── Retrieval ──

    /// Hybrid retrieval: keyword and (optionally) TF-IDF relevance, scaled by
    /// recency and importance. Returns at most `limit` items, best first.
    pub fn retrieve(&mut self, query: &str, limit: usize) -> Vec<ScoredItem> {
        self.retrieve_at(query, limit, Utc::now())
    }

    /// [`retrieve`](Self::retrieve) against an explicit clock.
    pub fn retrieve_at(&mut self, query: &str, limit: usize, now: DateTime<Utc>) -> Vec<ScoredItem> {
        self.expire_at(now);

        let vector_scores = if self.vector_index && !self.items.is_empty() {
            TfIdfIndex::build(self.items.values().map(|i| i.content.as_str())).scores(query)
        } else {
            vec![0.0; self.items.len()]
        };

        let mut scored: Vec<ScoredItem> = self
            .items
            .values()
            .zip(vector_scores)
            .filter_map(|(item, vector_score)| {
                let keyword_score = score::query_coverage(&item.content, query);
                let base = if vector_score > 0.0 {
                    vector_score * VECTOR_WEIGHT + keyword_score * KEYWORD_WEIGHT
                } else {
                    keyword_score
                };
                let final_score = base
                    * score::recency(item.timestamp, now)
                    * score::importance_weight(item.importance);
                (final_score > 0.0).then(|| ScoredItem {
                    item: item.clone(),
                    score: final_score,
                })
            })
            .collect();

        // Stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        scored
    }

    /// Summary of the current contents (without expiring).
    pub fn stats(&self) -> WorkingMemoryStats {
        let count = self.items.len();
        let average_importance = if count == 0 {
            0.0
        } else {
            self.items.values().map(|i| i.importance).sum::<f64>() / count as f64
        };
        WorkingMemoryStats {
            count,
            capacity: self.max_capacity,
            average_importance,
            oldest: self.items.values().map(|i| i.timestamp).min(),
        }
    }
}

impl Default for WorkingMemoryStore {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            by_id: HashMap::new(),
            next_seq: 0,
            max_capacity: 50,
            max_age: Duration::minutes(60),
            vector_index: true,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, content: &str, importance: f64, at: DateTime<Utc>) -> MemoryItem {
        MemoryItem::with_id(id, content, importance, at).unwrap()
    }

    fn ids(hits: &[ScoredItem]) -> Vec<&str> {
        hits.iter().map(|h| h.item.id()).collect()
    }

    #[test]
    fn new_store_is_empty() {
        let store = WorkingMemoryStore::default();
        assert!(store.is_empty());
        assert_eq!(store.max_capacity(), 50);
        assert_eq!(store.max_age(), Duration::minutes(60));
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            WorkingMemoryStore::new(0, 60),
            Err(MemoryError::InvalidCapacity)
        ));
    }

    #[test]
    fn max_age_out_of_range_rejected() {
        for minutes in [0, -1, MAX_WORKING_MEMORY_AGE_MINUTES + 1, i64::MAX] {
            assert!(matches!(
                WorkingMemoryStore::new(5, minutes),
                Err(MemoryError::InvalidMaxAge { .. })
            ));
        }
    }

    #[test]
    fn longest_max_age_stores_and_expires_without_overflow() {
        let config = WorkingMemoryConfig {
            max_capacity: 4,
            max_age_minutes: MAX_WORKING_MEMORY_AGE_MINUTES,
            vector_index: true,
        };
        let mut store = WorkingMemoryStore::from_config(&config).unwrap();
        let now = Utc::now();

        store.add_at(item("a", "kept for years", 0.5, now - Duration::days(365)), now);
        assert_eq!(store.len(), 1);
        assert_eq!(store.expire_at(DateTime::<Utc>::MIN_UTC + Duration::days(1)), 0);
        assert_eq!(store.retrieve_at("years", 5, now).len(), 1);
    }

    #[test]
    fn importance_out_of_range_rejected() {
        assert!(MemoryItem::new("x", 1.2).is_err());
        assert!(MemoryItem::new("x", -0.1).is_err());
        assert!(MemoryItem::new("x", 0.0).is_ok());
    }

    #[test]
    fn add_returns_id() {
        let mut store = WorkingMemoryStore::default();
        let now = Utc::now();
        let id = store.add_at(item("m1", "User prefers metric units", 0.5, now), now);
        assert_eq!(id, "m1");
        assert_eq!(store.get("m1").unwrap().content(), "User prefers metric units");
    }

    #[test]
    fn capacity_evicts_lowest_priority() {
        let mut store = WorkingMemoryStore::new(2, 60).unwrap();
        let now = Utc::now();
        store.add_at(item("keep", "important fact", 0.9, now), now);
        store.add_at(item("drop", "trivial fact", 0.1, now), now);
        store.add_at(item("new", "fresh fact", 0.5, now), now);

        assert_eq!(store.len(), 2);
        assert!(store.get("keep").is_some());
        assert!(store.get("drop").is_none());
        assert!(store.get("new").is_some());
    }

    #[test]
    fn older_item_has_lower_priority() {
        let mut store = WorkingMemoryStore::new(2, 60).unwrap();
        let now = Utc::now();
        store.add_at(item("old", "a", 0.5, now - Duration::minutes(50)), now);
        store.add_at(item("recent", "b", 0.5, now), now);
        store.add_at(item("newest", "c", 0.5, now), now);

        assert!(store.get("old").is_none());
        assert!(store.get("recent").is_some());
    }

    #[test]
    fn equal_priority_evicts_oldest_inserted() {
        let mut store = WorkingMemoryStore::new(3, 60).unwrap();
        let now = Utc::now();
        store.add_at(item("first", "a", 0.5, now), now);
        store.add_at(item("second", "b", 0.5, now), now);
        store.add_at(item("third", "c", 0.5, now), now);
        store.add_at(item("fourth", "d", 0.5, now), now);

        let remaining: Vec<&str> = store.items().map(|i| i.id()).collect();
        assert_eq!(remaining, vec!["second", "third", "fourth"]);
    }

    #[test]
    fn add_expires_stale_items_first() {
        let mut store = WorkingMemoryStore::new(2, 60).unwrap();
        let now = Utc::now();
        store.add_at(item("stale", "old news", 1.0, now - Duration::minutes(90)), now - Duration::minutes(90));
        store.add_at(item("fresh", "current", 0.1, now), now);
        store.add_at(item("another", "also current", 0.1, now), now);

        // The stale item was expired, so nothing had to be evicted.
        assert_eq!(store.len(), 2);
        assert!(store.get("stale").is_none());
        assert!(store.get("fresh").is_some());
        assert!(store.get("another").is_some());
    }

    #[test]
    fn already_expired_item_not_stored() {
        let mut store = WorkingMemoryStore::new(5, 60).unwrap();
        let now = Utc::now();
        let id = store.add_at(item("late", "old", 0.9, now - Duration::minutes(61)), now);
        assert_eq!(id, "late");
        assert!(store.is_empty());
    }

    #[test]
    fn readding_same_id_replaces() {
        let mut store = WorkingMemoryStore::default();
        let now = Utc::now();
        store.add_at(item("m1", "v1", 0.5, now), now);
        store.add_at(item("m1", "v2", 0.5, now), now);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("m1").unwrap().content(), "v2");
    }

    #[test]
    fn retrieve_ranks_by_relevance() {
        let mut store = WorkingMemoryStore::default();
        let now = Utc::now();
        store.add_at(item("a", "the weather in tokyo is rainy", 0.5, now), now);
        store.add_at(item("b", "rust ownership rules", 0.5, now), now);
        store.add_at(item("c", "tokyo has great ramen", 0.5, now), now);

        let hits = store.retrieve_at("tokyo weather", 5, now);
        assert_eq!(ids(&hits), vec!["a", "c"]);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn retrieve_without_vector_index_uses_keywords() {
        let mut store = WorkingMemoryStore::default().with_vector_index(false);
        let now = Utc::now();
        store.add_at(item("a", "tokyo weather report", 1.0, now), now);
        store.add_at(item("b", "tokyo ramen", 1.0, now), now);

        let hits = store.retrieve_at("tokyo weather", 5, now);
        assert_eq!(ids(&hits), vec!["a", "b"]);
        assert!((hits[0].score - 1.2).abs() < 1e-9);
        assert!((hits[1].score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn retrieve_drops_zero_scores() {
        let mut store = WorkingMemoryStore::default();
        let now = Utc::now();
        store.add_at(item("a", "completely unrelated", 0.9, now), now);
        assert!(store.retrieve_at("tokyo", 5, now).is_empty());
    }

    #[test]
    fn retrieve_respects_limit() {
        let mut store = WorkingMemoryStore::default();
        let now = Utc::now();
        for i in 0..10 {
            store.add_at(item(&format!("m{i}"), "rust note", 0.5, now), now);
        }
        assert_eq!(store.retrieve_at("rust", 3, now).len(), 3);
    }

    #[test]
    fn importance_breaks_relevance_ties() {
        let mut store = WorkingMemoryStore::default();
        let now = Utc::now();
        store.add_at(item("low", "rust note", 0.1, now), now);
        store.add_at(item("high", "rust note", 0.9, now), now);

        let hits = store.retrieve_at("rust", 5, now);
        assert_eq!(ids(&hits), vec!["high", "low"]);
    }

    #[test]
    fn retrieve_never_returns_expired() {
        let mut store = WorkingMemoryStore::new(10, 30).unwrap();
        let t0 = Utc::now();
        store.add_at(item("a", "rust borrow checker", 1.0, t0), t0);

        let later = t0 + Duration::minutes(31);
        assert!(store.retrieve_at("rust", 5, later).is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn remove_and_clear() {
        let mut store = WorkingMemoryStore::default();
        let now = Utc::now();
        store.add_at(item("a", "x", 0.5, now), now);
        store.add_at(item("b", "y", 0.5, now), now);

        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
        assert!(store.get("b").is_none());
    }

    #[test]
    fn stats_summarize_contents() {
        let mut store = WorkingMemoryStore::new(5, 60).unwrap();
        let now = Utc::now();
        let earlier = now - Duration::minutes(10);
        store.add_at(item("a", "x", 0.2, earlier), now);
        store.add_at(item("b", "y", 0.6, now), now);

        let stats = store.stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.capacity, 5);
        assert!((stats.average_importance - 0.4).abs() < 1e-9);
        assert_eq!(stats.oldest, Some(earlier));
    }
}
