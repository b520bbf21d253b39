//! # Tessera Core
//!
//! Domain types, traits, and error definitions for the Tessera context
//! assembly engine. This crate performs **no I/O**; it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every upstream collaborator is defined as a trait here. Implementations
//! live in their respective crates. This enables:
//! - Swapping search sources without touching the pipeline
//! - Easy testing with failing or slow stub sources
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod score;
pub mod source;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MemoryError, Result, SourceError};
pub use message::{Role, Turn};
pub use source::{KnowledgeRecord, KnowledgeSearch, MemoryRecord, MemorySearch};
