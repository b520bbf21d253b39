//! Budgeted context assembly for Tessera.
//!
//! Builds the text handed to a language model from heterogeneous candidate
//! fragments, keeping it within a hard token budget.
//!
//! # Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Gather | [`gather`] | Candidate packets from instructions, sources, history |
//! | Score | [`score`] | Relevance (Jaccard) and recency (exponential decay) |
//! | Select | [`select`] | Pinned packets, then greedy fill by combined score |
//! | Structure | [`structure`] | Sectioned prompt text |
//! | Compress | [`compress`] | Section-preserving truncation to the budget |
//!
//! [`ContextBuilder`] runs all five stages.

pub mod builder;
pub mod compress;
pub mod gather;
pub mod packet;
pub mod score;
pub mod select;
pub mod structure;
pub mod token;

pub use builder::{AssembledContext, ContextBuilder, ContextMetadata, ContextRequest};
pub use compress::compress;
pub use gather::Gatherer;
pub use packet::{ContextPacket, PacketRole};
pub use select::{Selection, SelectionStats, select};
pub use structure::structure;
pub use token::{TokenTally, estimate_tokens};
