//! Memory and knowledge sources for Tessera.
//!
//! - [`WorkingMemoryStore`]: bounded, age-limited working memory with hybrid retrieval
//! - [`SharedWorkingMemory`]: the store behind a single lock, usable as a memory search source
//! - [`InMemoryKnowledgeBase`]: a small keyword-scored knowledge search source

pub mod knowledge;
pub mod shared;
pub mod vector;
pub mod working;

pub use knowledge::{InMemoryKnowledgeBase, KnowledgeChunk};
pub use shared::SharedWorkingMemory;
pub use vector::{TfIdfIndex, cosine_similarity};
pub use working::{MemoryItem, ScoredItem, WorkingMemoryStats, WorkingMemoryStore};
