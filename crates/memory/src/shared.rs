//! Shared working memory — the store behind a single exclusive lock.
//!
//! Every add and retrieve goes through the same `tokio::sync::Mutex`, so
//! expiry and eviction never interleave across callers. Also exposes the
//! store to the context gatherer as a [`MemorySearch`] source.

use async_trait::async_trait;
use std::sync::Arc;
use tessera_core::error::SourceError;
use tessera_core::source::{MemoryRecord, MemorySearch};
use tokio::sync::Mutex;

use crate::working::{MemoryItem, ScoredItem, WorkingMemoryStats, WorkingMemoryStore};

/// Cloneable handle to a locked [`WorkingMemoryStore`].
#[derive(Clone)]
pub struct SharedWorkingMemory {
    inner: Arc<Mutex<WorkingMemoryStore>>,
}

impl SharedWorkingMemory {
    pub fn new(store: WorkingMemoryStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Add an item under the lock. Returns its id.
    pub async fn add(&self, item: MemoryItem) -> String {
        self.inner.lock().await.add(item)
    }

    /// Retrieve under the lock.
    pub async fn retrieve(&self, query: &str, limit: usize) -> Vec<ScoredItem> {
        self.inner.lock().await.retrieve(query, limit)
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.inner.lock().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    pub async fn stats(&self) -> WorkingMemoryStats {
        self.inner.lock().await.stats()
    }
}

impl Default for SharedWorkingMemory {
    fn default() -> Self {
        Self::new(WorkingMemoryStore::default())
    }
}

#[async_trait]
impl MemorySearch for SharedWorkingMemory {
    fn name(&self) -> &str {
        "working_memory"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        min_importance: f64,
    ) -> Result<Vec<MemoryRecord>, SourceError> {
        let mut store = self.inner.lock().await;
        let capacity = store.len();
        let records = store
            .retrieve(query, capacity)
            .into_iter()
            .filter(|hit| hit.item.importance() >= min_importance)
            .take(limit)
            .map(|hit| MemoryRecord {
                id: hit.item.id().to_string(),
                memory_type: "working".into(),
                importance: hit.item.importance(),
                content: hit.item.content().to_string(),
                recorded_at: Some(hit.item.timestamp()),
            })
            .collect();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_and_search() {
        let memory = SharedWorkingMemory::default();
        memory
            .add(MemoryItem::new("User lives in Tokyo", 0.8).unwrap())
            .await;
        memory
            .add(MemoryItem::new("User likes Tokyo ramen", 0.2).unwrap())
            .await;

        let records = memory.search("tokyo", 10, 0.3).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "User lives in Tokyo");
        assert_eq!(records[0].memory_type, "working");
        assert!(records[0].recorded_at.is_some());
    }

    #[tokio::test]
    async fn search_respects_limit() {
        let memory = SharedWorkingMemory::default();
        for i in 0..5 {
            memory
                .add(MemoryItem::new(format!("rust fact {i}"), 0.5).unwrap())
                .await;
        }
        let records = memory.search("rust", 2, 0.0).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_adds_respect_capacity() {
        let memory = SharedWorkingMemory::new(WorkingMemoryStore::new(8, 60).unwrap());

        let mut handles = Vec::new();
        for i in 0..32 {
            let memory = memory.clone();
            handles.push(tokio::spawn(async move {
                memory
                    .add(MemoryItem::new(format!("note {i}"), 0.5).unwrap())
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(memory.len().await, 8);
    }
}
