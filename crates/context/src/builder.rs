//! The end-to-end assembly pipeline.
//!
//! # Algorithm
//!
//! 1. Gather candidates from instructions, sources, history and custom packets
//! 2. Select against `max_tokens` (pinned first, then greedy by score)
//! 3. Structure the selection into labeled sections
//! 4. Compress if compression is enabled and the text is still over budget
//!
//! Assembly never fails: source failures degrade to fewer packets and an
//! exhausted budget degrades to a pinned-only context.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tessera_config::{ContextConfig, GatherConfig};
use tessera_core::{KnowledgeSearch, MemorySearch, Turn};
use tracing::{debug, info};

use crate::compress::compress;
use crate::gather::Gatherer;
use crate::packet::ContextPacket;
use crate::select::{SelectionStats, select};
use crate::structure::structure;
use crate::token::estimate_tokens;

/// Everything one assembly call needs besides the configured sources.
#[derive(Debug, Clone, Default)]
pub struct ContextRequest {
    pub query: String,
    pub history: Vec<Turn>,
    pub system_instructions: Option<String>,
    pub custom_packets: Vec<ContextPacket>,
    /// Clock used for recency scoring; the current time when `None`.
    pub now: Option<DateTime<Utc>>,
}

impl ContextRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_system_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.system_instructions = Some(instructions.into());
        self
    }

    pub fn with_packets(mut self, packets: Vec<ContextPacket>) -> Self {
        self.custom_packets = packets;
        self
    }

    /// Pin the assembly clock.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

/// The final context text and how it was arrived at.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub text: String,
    pub metadata: ContextMetadata,
}

/// Assembly bookkeeping, suitable for logging or display.
#[derive(Debug, Clone, Serialize)]
pub struct ContextMetadata {
    /// Estimated tokens of the final text.
    pub total_tokens: usize,
    /// Configured token budget.
    pub budget: usize,
    /// Budget utilization percentage. Exceeds 100 only when pinned content overflows.
    pub utilization_pct: f32,
    /// Packets that made it into the context.
    pub packets_selected: usize,
    /// Whether the compressor rewrote the structured text.
    pub compressed: bool,
    pub selection: SelectionStats,
}

/// Assembles bounded context for a query. Cheap to clone; reuse it.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    config: ContextConfig,
    gatherer: Gatherer,
}

impl ContextBuilder {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            gatherer: Gatherer::default(),
        }
    }

    /// Replace the gathering limits and source timeout.
    pub fn with_gather_config(mut self, gather: GatherConfig) -> Self {
        self.gatherer = self.gatherer.with_config(gather);
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemorySearch>) -> Self {
        self.gatherer = self.gatherer.with_memory(memory);
        self
    }

    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeSearch>) -> Self {
        self.gatherer = self.gatherer.with_knowledge(knowledge);
        self
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Run the full pipeline.
    pub async fn build(&self, request: &ContextRequest) -> AssembledContext {
        let now = request.now.unwrap_or_else(Utc::now);
        let max_tokens = self.config.max_tokens();

        let packets = self
            .gatherer
            .gather(
                &request.query,
                &request.history,
                request.system_instructions.as_deref(),
                request.custom_packets.clone(),
                now,
            )
            .await;

        let selection = select(packets, &request.query, max_tokens, &self.config, now);
        let structured = structure(&selection.packets, &request.query);

        let structured_tokens = estimate_tokens(&structured);
        let over_budget = structured_tokens > max_tokens;
        let text = if over_budget && self.config.enable_compression() {
            compress(&structured, max_tokens)
        } else {
            if over_budget {
                debug!(
                    tokens = structured_tokens,
                    max_tokens, "Context over budget with compression disabled"
                );
            }
            structured
        };

        let total_tokens = estimate_tokens(&text);
        let metadata = ContextMetadata {
            total_tokens,
            budget: max_tokens,
            utilization_pct: total_tokens as f32 / max_tokens as f32 * 100.0,
            packets_selected: selection.packets.len(),
            compressed: over_budget && self.config.enable_compression(),
            selection: selection.stats,
        };

        info!(
            tokens = metadata.total_tokens,
            budget = metadata.budget,
            packets = metadata.packets_selected,
            compressed = metadata.compressed,
            "Assembled context"
        );

        AssembledContext { text, metadata }
    }

    /// Convenience wrapper around [`build`](Self::build) returning only the text.
    pub async fn build_context(
        &self,
        query: &str,
        history: Option<&[Turn]>,
        system_instructions: Option<&str>,
        custom_packets: Option<Vec<ContextPacket>>,
    ) -> String {
        let request = ContextRequest {
            query: query.to_string(),
            history: history.map(<[Turn]>::to_vec).unwrap_or_default(),
            system_instructions: system_instructions.map(str::to_string),
            custom_packets: custom_packets.unwrap_or_default(),
            now: None,
        };
        self.build(&request).await.text
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
