//! Search source traits — the upstream collaborators of context assembly.
//!
//! Two kinds of ranked search feed the gatherer:
//! - **Memory search**: short- and long-lived facts the agent has stored
//! - **Knowledge search**: retrieved document chunks (RAG)
//!
//! Both report failure through [`SourceError`] instead of panicking; the
//! gatherer turns any failure into an empty contribution.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// A single memory search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique ID of the memory
    pub id: String,

    /// Memory category (e.g. "working", "episodic")
    #[serde(rename = "type", default = "default_memory_type")]
    pub memory_type: String,

    /// Importance in [0, 1]
    pub importance: f64,

    /// The remembered text
    pub content: String,

    /// When the memory was recorded, if the source tracks it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

fn default_memory_type() -> String {
    "working".into()
}

/// A single knowledge search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    /// The chunk text
    pub content: String,

    /// Similarity score reported by the source
    pub score: f64,

    /// Identifier of the document the chunk came from
    pub source_id: String,
}

/// Ranked memory search.
#[async_trait]
pub trait MemorySearch: Send + Sync {
    /// The source name, used in logs.
    fn name(&self) -> &str;

    /// Return at most `limit` records with importance at or above `min_importance`,
    /// best first.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        min_importance: f64,
    ) -> Result<Vec<MemoryRecord>, SourceError>;
}

/// Ranked knowledge search.
#[async_trait]
pub trait KnowledgeSearch: Send + Sync {
    /// The source name, used in logs.
    fn name(&self) -> &str;

    /// Return at most `limit` chunks scoring at or above `min_score`, best first.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        min_score: f64,
    ) -> Result<Vec<KnowledgeRecord>, SourceError>;
}
