//! `tessera build` — Assemble context for a query.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use serde::Deserialize;
use tessera_context::{ContextBuilder, ContextRequest};
use tessera_core::Turn;
use tessera_memory::{InMemoryKnowledgeBase, MemoryItem, SharedWorkingMemory, WorkingMemoryStore};

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// The user query
    #[arg(short, long)]
    pub query: String,

    /// Pinned system instructions
    #[arg(long, conflicts_with = "system_file")]
    pub system: Option<String>,

    /// Read pinned system instructions from a file
    #[arg(long)]
    pub system_file: Option<PathBuf>,

    /// Conversation history: JSON array of `{ "role", "content", "timestamp"? }`
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Knowledge chunks: JSON array of `{ "source_id", "content" }`
    #[arg(long)]
    pub knowledge: Option<PathBuf>,

    /// Working memory seed: JSON array of `{ "content", "importance", "id"? }`
    #[arg(long)]
    pub memory: Option<PathBuf>,

    /// Print assembly metadata as JSON on stderr
    #[arg(long)]
    pub stats: bool,
}

/// One working-memory item as written in a seed file.
#[derive(Debug, Deserialize)]
struct MemorySeed {
    #[serde(default)]
    id: Option<String>,
    content: String,
    importance: f64,
}

pub async fn run(config_path: Option<&Path>, args: BuildArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let mut builder =
        ContextBuilder::new(config.context).with_gather_config(config.gather.clone());

    if let Some(path) = &args.knowledge {
        let knowledge = InMemoryKnowledgeBase::load_json(path)?;
        builder = builder.with_knowledge(Arc::new(knowledge));
    }

    if let Some(path) = &args.memory {
        let mut store = WorkingMemoryStore::from_config(&config.working_memory)?;
        for item in parse_memory_seeds(&std::fs::read_to_string(path)?)? {
            store.add(item);
        }
        tracing::debug!(items = store.len(), "Seeded working memory");
        builder = builder.with_memory(Arc::new(SharedWorkingMemory::new(store)));
    }

    let mut request = ContextRequest::new(&args.query);
    if let Some(path) = &args.history {
        request = request.with_history(parse_history(&std::fs::read_to_string(path)?)?);
    }
    if let Some(system) = read_system(&args)? {
        request = request.with_system_instructions(system);
    }

    let assembled = builder.build(&request).await;
    println!("{}", assembled.text);

    if args.stats {
        eprintln!("{}", serde_json::to_string_pretty(&assembled.metadata)?);
    }

    Ok(())
}

fn read_system(args: &BuildArgs) -> std::io::Result<Option<String>> {
    match (&args.system, &args.system_file) {
        (Some(text), _) => Ok(Some(text.clone())),
        (None, Some(path)) => std::fs::read_to_string(path).map(Some),
        (None, None) => Ok(None),
    }
}

fn parse_history(raw: &str) -> Result<Vec<Turn>, serde_json::Error> {
    serde_json::from_str(raw)
}

fn parse_memory_seeds(raw: &str) -> Result<Vec<MemoryItem>, Box<dyn std::error::Error>> {
    let seeds: Vec<MemorySeed> = serde_json::from_str(raw)?;
    let now = Utc::now();
    let mut items = Vec::with_capacity(seeds.len());
    for seed in seeds {
        let item = match seed.id {
            Some(id) => MemoryItem::with_id(id, seed.content, seed.importance, now)?,
            None => MemoryItem::new(seed.content, seed.importance)?,
        };
        items.push(item);
    }
    Ok(items)
}
