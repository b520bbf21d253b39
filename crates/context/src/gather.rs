//! Candidate gathering from pinned instructions, search sources, history and
//! caller-supplied packets.
//!
//! Memory and knowledge sources are queried concurrently, each under its own
//! timeout. A source that fails or times out contributes nothing; gathering
//! itself never fails.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tessera_config::GatherConfig;
use tessera_core::{KnowledgeSearch, MemorySearch, SourceError, Turn};
use tracing::{debug, warn};

use crate::packet::{ContextPacket, PacketRole};

/// Turns the configured sources into unscored (or baseline-scored) packets.
#[derive(Clone, Default)]
pub struct Gatherer {
    memory: Option<Arc<dyn MemorySearch>>,
    knowledge: Option<Arc<dyn KnowledgeSearch>>,
    config: GatherConfig,
}

impl std::fmt::Debug for Gatherer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gatherer")
            .field("memory", &self.memory.as_ref().map(|m| m.name().to_string()))
            .field("knowledge", &self.knowledge.as_ref().map(|k| k.name().to_string()))
            .field("config", &self.config)
            .finish()
    }
}

impl Gatherer {
    pub fn new(config: GatherConfig) -> Self {
        Self {
            memory: None,
            knowledge: None,
            config,
        }
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemorySearch>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeSearch>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    /// Replace limits and timeout, keeping the configured sources.
    pub fn with_config(mut self, config: GatherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &GatherConfig {
        &self.config
    }

    /// Collect candidate packets in a fixed order: system, memory, knowledge,
    /// history, custom.
    pub async fn gather(
        &self,
        query: &str,
        history: &[Turn],
        system_instructions: Option<&str>,
        custom: Vec<ContextPacket>,
        now: DateTime<Utc>,
    ) -> Vec<ContextPacket> {
        let mut packets = Vec::new();

        if let Some(instructions) = system_instructions.filter(|s| !s.is_empty()) {
            packets.push(
                ContextPacket::new(PacketRole::SystemInstruction, instructions, now)
                    .with_relevance(1.0),
            );
        }

        let (memory, knowledge) = tokio::join!(
            self.search_memory(query, now),
            self.search_knowledge(query, now)
        );
        let memory_count = memory.len();
        let knowledge_count = knowledge.len();
        packets.extend(memory);
        packets.extend(knowledge);

        let window = history.len().saturating_sub(self.config.history_window);
        let history_count = history.len() - window;
        packets.extend(history[window..].iter().map(|turn| {
            ContextPacket::new(PacketRole::HistoryTurn, turn.render(), turn.timestamp)
                .with_relevance(self.config.history_relevance)
                .with_meta("role", turn.role.as_str())
        }));

        let custom_count = custom.len();
        packets.extend(custom);

        debug!(
            system = usize::from(system_instructions.is_some_and(|s| !s.is_empty())),
            memory = memory_count,
            knowledge = knowledge_count,
            history = history_count,
            custom = custom_count,
            "Gathered context packets"
        );

        packets
    }

    async fn search_memory(&self, query: &str, now: DateTime<Utc>) -> Vec<ContextPacket> {
        let Some(memory) = &self.memory else {
            return Vec::new();
        };

        let records = bounded(
            memory.name(),
            self.timeout(),
            memory.search(query, self.config.memory_limit, self.config.min_importance),
        )
        .await;

        records
            .into_iter()
            .map(|record| {
                ContextPacket::new(
                    PacketRole::MemoryResult,
                    record.content,
                    record.recorded_at.unwrap_or(now),
                )
                .with_meta("memory_id", record.id)
                .with_meta("memory_type", record.memory_type)
                .with_meta("importance", record.importance)
            })
            .collect()
    }

    async fn search_knowledge(&self, query: &str, now: DateTime<Utc>) -> Vec<ContextPacket> {
        let Some(knowledge) = &self.knowledge else {
            return Vec::new();
        };

        let records = bounded(
            knowledge.name(),
            self.timeout(),
            knowledge.search(
                query,
                self.config.knowledge_limit,
                self.config.min_knowledge_score,
            ),
        )
        .await;

        records
            .into_iter()
            .map(|record| {
                ContextPacket::new(PacketRole::KnowledgeResult, record.content, now)
                    .with_meta("source_id", record.source_id)
                    .with_meta("score", record.score)
            })
            .collect()
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.source_timeout_ms)
    }
}

/// Await a source call under `timeout`, turning any failure into no results.
async fn bounded<T>(
    source_name: &str,
    timeout: Duration,
    call: impl Future<Output = Result<Vec<T>, SourceError>>,
) -> Vec<T> {
    let outcome = match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout {
            source_name: source_name.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    };

    match outcome {
        Ok(records) => records,
        Err(e) => {
            warn!(source = source_name, error = %e, "Context source failed, continuing without it");
            Vec::new()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
