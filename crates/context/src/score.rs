//! Packet scoring: lexical relevance and time-decayed recency.

use chrono::{DateTime, Utc};
use tessera_core::score;

use crate::packet::ContextPacket;

/// Jaccard similarity of content and query word sets, in `[0, 1]`.
pub fn relevance(content: &str, query: &str) -> f64 {
    score::jaccard(content, query)
}

/// `clamp(exp(-0.1 * age_hours / 24), 0.1, 1.0)`.
pub fn recency(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    score::recency(timestamp, now)
}

/// Scores for one packet against one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketScore {
    pub relevance: f64,
    pub recency: f64,
}

impl PacketScore {
    /// Weighted blend used for ranking.
    pub fn combined(&self, relevance_weight: f64, recency_weight: f64) -> f64 {
        relevance_weight * self.relevance + recency_weight * self.recency
    }
}

/// Score a packet. A packet that already carries a relevance keeps it; only
/// unscored packets get a lexical relevance computed.
pub fn score_packet(packet: &ContextPacket, query: &str, now: DateTime<Utc>) -> PacketScore {
    PacketScore {
        relevance: packet
            .relevance()
            .unwrap_or_else(|| relevance(packet.content(), query)),
        recency: recency(packet.timestamp(), now),
    }
}
