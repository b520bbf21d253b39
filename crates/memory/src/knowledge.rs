//! In-memory knowledge base — useful for testing, demos, and small corpora.
//!
//! Chunks are scored against the query with the same Jaccard relevance the
//! context selector uses, so a chunk the knowledge base ranks highly is also
//! one the selector will keep.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tessera_core::error::SourceError;
use tessera_core::score;
use tessera_core::source::{KnowledgeRecord, KnowledgeSearch};
use tokio::sync::RwLock;

/// A document chunk held by the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Source document identifier.
    pub source_id: String,
    /// The text content of this chunk.
    pub content: String,
}

/// A knowledge base that stores chunks in a Vec.
#[derive(Clone, Default)]
pub struct InMemoryKnowledgeBase {
    chunks: Arc<RwLock<Vec<KnowledgeChunk>>>,
}

impl InMemoryKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_chunks(chunks: Vec<KnowledgeChunk>) -> Self {
        Self {
            chunks: Arc::new(RwLock::new(chunks)),
        }
    }

    /// Load chunks from a JSON array of `{ "source_id", "content" }` objects.
    pub fn load_json(path: &Path) -> tessera_core::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let chunks: Vec<KnowledgeChunk> = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), chunks = chunks.len(), "Loaded knowledge base");
        Ok(Self::from_chunks(chunks))
    }

    pub async fn insert(&self, source_id: impl Into<String>, content: impl Into<String>) {
        self.chunks.write().await.push(KnowledgeChunk {
            source_id: source_id.into(),
            content: content.into(),
        });
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }
}

#[async_trait]
impl KnowledgeSearch for InMemoryKnowledgeBase {
    fn name(&self) -> &str {
        "in_memory_knowledge"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        min_score: f64,
    ) -> Result<Vec<KnowledgeRecord>, SourceError> {
        let chunks = self.chunks.read().await;

        let mut results: Vec<KnowledgeRecord> = chunks
            .iter()
            .map(|chunk| KnowledgeRecord {
                content: chunk.content.clone(),
                score: score::jaccard(&chunk.content, query),
                source_id: chunk.source_id.clone(),
            })
            .filter(|r| r.score > 0.0 && r.score >= min_score)
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);

        Ok(results)
    }
}
