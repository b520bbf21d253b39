//! End-to-end assembly against real and misbehaving sources.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tessera_config::{ContextConfig, GatherConfig};
use tessera_context::{ContextBuilder, ContextPacket, ContextRequest};
use tessera_core::{KnowledgeRecord, KnowledgeSearch, MemoryRecord, MemorySearch, SourceError, Turn};
use tessera_memory::{
    InMemoryKnowledgeBase, KnowledgeChunk, MemoryItem, SharedWorkingMemory, WorkingMemoryStore,
};

// ── Mock sources ──────────────────────────────────────────────────────────

struct OfflineMemory;

#[async_trait]
impl MemorySearch for OfflineMemory {
    fn name(&self) -> &str {
        "offline_memory"
    }

    async fn search(
        &self,
        _query: &str,
        _limit: usize,
        _min_importance: f64,
    ) -> Result<Vec<MemoryRecord>, SourceError> {
        Err(SourceError::Unavailable("connection refused".into()))
    }
}

struct SlowKnowledge {
    delay: Duration,
}

#[async_trait]
impl KnowledgeSearch for SlowKnowledge {
    fn name(&self) -> &str {
        "slow_knowledge"
    }

    async fn search(
        &self,
        _query: &str,
        _limit: usize,
        _min_score: f64,
    ) -> Result<Vec<KnowledgeRecord>, SourceError> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![KnowledgeRecord {
            content: "late rust answer".into(),
            score: 1.0,
            source_id: "slow.md".into(),
        }])
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────

fn knowledge_base() -> InMemoryKnowledgeBase {
    InMemoryKnowledgeBase::from_chunks(vec![
        KnowledgeChunk {
            source_id: "ownership.md".into(),
            content: "rust ownership moves values between bindings".into(),
        },
        KnowledgeChunk {
            source_id: "borrowing.md".into(),
            content: "rust borrowing lends references without moving ownership".into(),
        },
        KnowledgeChunk {
            source_id: "cooking.md".into(),
            content: "simmer the sauce for twenty minutes".into(),
        },
    ])
}

fn lenient_gather() -> GatherConfig {
    GatherConfig {
        min_knowledge_score: 0.1,
        ..GatherConfig::default()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn working_memory_and_knowledge_feed_the_context() {
    let memory = SharedWorkingMemory::new(WorkingMemoryStore::new(10, 60).unwrap());
    memory
        .add(MemoryItem::new("user is learning rust ownership", 0.9).unwrap())
        .await;
    memory
        .add(MemoryItem::new("user had pasta for lunch", 0.9).unwrap())
        .await;

    let builder = ContextBuilder::new(ContextConfig::default())
        .with_gather_config(lenient_gather())
        .with_memory(Arc::new(memory))
        .with_knowledge(Arc::new(knowledge_base()));

    let assembled = builder
        .build(&ContextRequest::new("rust ownership").with_system_instructions("Teach gently."))
        .await;
    let text = &assembled.text;

    assert!(text.starts_with("[Role & Policies]\nTeach gently."));
    assert!(text.contains("[Evidence]\nrust ownership moves values between bindings"));
    assert!(text.contains("[Context]\nuser is learning rust ownership"));
    assert!(!text.contains("pasta"));
    assert!(!text.contains("simmer"));
    assert!(assembled.metadata.total_tokens <= 3000);
}

#[tokio::test]
async fn failing_source_does_not_fail_the_build() {
    let builder = ContextBuilder::default()
        .with_gather_config(lenient_gather())
        .with_memory(Arc::new(OfflineMemory))
        .with_knowledge(Arc::new(knowledge_base()));

    let text = builder
        .build_context("rust borrowing", None, Some("Be precise."), None)
        .await;

    assert!(text.contains("[Role & Policies]"));
    assert!(text.contains("rust borrowing lends references"));
    assert!(!text.contains("[Context]"));
}

#[tokio::test(start_paused = true)]
async fn slow_source_is_abandoned_after_timeout() {
    let builder = ContextBuilder::default()
        .with_gather_config(GatherConfig {
            source_timeout_ms: 50,
            ..GatherConfig::default()
        })
        .with_knowledge(Arc::new(SlowKnowledge {
            delay: Duration::from_secs(10),
        }));

    let history = vec![Turn::user("what about rust?")];
    let text = builder
        .build_context("rust", Some(&history), None, None)
        .await;

    assert!(!text.contains("late rust answer"));
    assert!(text.contains("user: what about rust?"));
}

#[tokio::test(start_paused = true)]
async fn source_within_timeout_is_used() {
    let builder = ContextBuilder::default().with_knowledge(Arc::new(SlowKnowledge {
        delay: Duration::from_millis(100),
    }));

    let text = builder.build_context("rust answer", None, None, None).await;
    assert!(text.contains("[Evidence]\nlate rust answer"));
}

#[tokio::test]
async fn tight_budget_keeps_highest_scoring_packets() {
    let now = Utc::now();
    let config = ContextConfig::default().with_max_tokens(60).unwrap();
    let packets = vec![
        ContextPacket::custom(vec!["low"; 30].join(" ")).with_relevance(0.2),
        ContextPacket::custom(vec!["high"; 30].join(" ")).with_relevance(0.9),
    ];

    let assembled = ContextBuilder::new(config)
        .build(&ContextRequest::new("q").with_packets(packets).at(now))
        .await;

    assert!(assembled.text.contains("high"));
    assert!(!assembled.text.contains("low"));
    assert_eq!(assembled.metadata.selection.over_budget, 1);
    assert!(assembled.metadata.total_tokens <= 60);
}

#[tokio::test]
async fn history_beyond_window_is_ignored() {
    let history: Vec<Turn> = (0..10).map(|i| Turn::user(format!("message {i}"))).collect();
    let text = ContextBuilder::default()
        .with_gather_config(GatherConfig {
            history_window: 2,
            ..GatherConfig::default()
        })
        .build_context("q", Some(&history), None, None)
        .await;

    assert!(text.contains("user: message 8"));
    assert!(text.contains("user: message 9"));
    assert!(!text.contains("user: message 7"));
}
