//! Error types for the Tessera domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Tessera operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Upstream search sources ---
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    // --- Working memory ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failure reported by a memory or knowledge search collaborator.
///
/// The gatherer never propagates these; a failed source contributes
/// zero packets to the assembly.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed on {source_name}: {reason}")]
    QueryFailed { source_name: String, reason: String },

    #[error("Source {source_name} timed out after {timeout_ms}ms")]
    Timeout { source_name: String, timeout_ms: u64 },
}

#[derive(Debug, Clone, Error)]
pub enum MemoryError {
    #[error("Importance must be within [0, 1], got {0}")]
    InvalidImportance(f64),

    #[error("Working memory capacity must be at least 1")]
    InvalidCapacity,

    #[error("Working memory max age must be between 1 and {max} minutes, got {minutes}")]
    InvalidMaxAge { minutes: i64, max: i64 },
}
