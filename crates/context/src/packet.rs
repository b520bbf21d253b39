//! Context packets — the candidate units considered for a single assembly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::token;

/// Where a packet came from. Drives pinning and section placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketRole {
    /// Pinned instructions; always kept ahead of any ranking.
    SystemInstruction,
    MemoryResult,
    KnowledgeResult,
    HistoryTurn,
    Custom,
}

impl PacketRole {
    pub fn is_pinned(&self) -> bool {
        matches!(self, PacketRole::SystemInstruction)
    }
}

/// One candidate unit of text.
///
/// Content and token count are fixed at construction: the token count is
/// always the estimate of the content and is never recomputed downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextPacket {
    content: String,
    timestamp: DateTime<Utc>,
    token_count: usize,
    relevance: Option<f64>,
    role: PacketRole,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl ContextPacket {
    /// Create an unscored packet.
    pub fn new(role: PacketRole, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let content = content.into();
        let token_count = token::estimate_tokens(&content);
        Self {
            content,
            timestamp,
            token_count,
            relevance: None,
            role,
            metadata: serde_json::Map::new(),
        }
    }

    /// Create a caller-supplied packet stamped now.
    pub fn custom(content: impl Into<String>) -> Self {
        Self::new(PacketRole::Custom, content, Utc::now())
    }

    /// Pre-assign a relevance score, clamped to `[0, 1]`. Non-finite input
    /// scores 0. Pre-scored packets are never re-scored by the selector.
    pub fn with_relevance(mut self, relevance: f64) -> Self {
        let relevance = if relevance.is_finite() {
            relevance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.relevance = Some(relevance);
        self
    }

    /// Attach a metadata entry.
    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// `None` until scored.
    pub fn relevance(&self) -> Option<f64> {
        self.relevance
    }

    pub fn role(&self) -> PacketRole {
        self.role
    }

    pub fn metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata
    }

    pub fn is_pinned(&self) -> bool {
        self.role.is_pinned()
    }
}
