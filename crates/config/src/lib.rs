//! Configuration loading, validation, and management for Tessera.
//!
//! Loads configuration from `~/.tessera/config.toml` with environment
//! variable overrides. Validates all settings at startup: an invalid
//! context policy is a fatal error, never silently clamped.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tolerance for the relevance + recency weight sum.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Longest working-memory retention accepted: ten years.
pub const MAX_WORKING_MEMORY_AGE_MINUTES: i64 = 10 * 365 * 24 * 60;

/// The root configuration structure.
///
/// Maps directly to `~/.tessera/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Context assembly policy
    #[serde(default)]
    pub context: ContextConfig,

    /// Candidate gathering settings
    #[serde(default)]
    pub gather: GatherConfig,

    /// Working memory bounds
    #[serde(default)]
    pub working_memory: WorkingMemoryConfig,
}

// ── Context policy ────────────────────────────────────────────────────────

/// Validated, immutable context assembly policy.
///
/// Fields are private: the only ways to obtain one are [`ContextConfig::new`],
/// [`ContextConfig::default`] and deserialization, all of which validate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawContextConfig", into = "RawContextConfig")]
pub struct ContextConfig {
    max_tokens: usize,
    reserve_ratio: f64,
    min_relevance: f64,
    enable_compression: bool,
    recency_weight: f64,
    relevance_weight: f64,
}

/// Unvalidated mirror of [`ContextConfig`] used for (de)serialization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawContextConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_reserve_ratio")]
    pub reserve_ratio: f64,

    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,

    #[serde(default = "default_true")]
    pub enable_compression: bool,

    #[serde(default = "default_recency_weight")]
    pub recency_weight: f64,

    #[serde(default = "default_relevance_weight")]
    pub relevance_weight: f64,
}

fn default_max_tokens() -> usize {
    3000
}
fn default_reserve_ratio() -> f64 {
    0.2
}
fn default_min_relevance() -> f64 {
    0.1
}
fn default_recency_weight() -> f64 {
    0.3
}
fn default_relevance_weight() -> f64 {
    0.7
}
fn default_true() -> bool {
    true
}

impl Default for RawContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            reserve_ratio: default_reserve_ratio(),
            min_relevance: default_min_relevance(),
            enable_compression: true,
            recency_weight: default_recency_weight(),
            relevance_weight: default_relevance_weight(),
        }
    }
}

impl TryFrom<RawContextConfig> for ContextConfig {
    type Error = ConfigError;

    fn try_from(raw: RawContextConfig) -> Result<Self, Self::Error> {
        if raw.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_tokens must be greater than 0".into(),
            ));
        }
        check_unit("context.reserve_ratio", raw.reserve_ratio)?;
        check_unit("context.min_relevance", raw.min_relevance)?;
        check_unit("context.recency_weight", raw.recency_weight)?;
        check_unit("context.relevance_weight", raw.relevance_weight)?;

        let sum = raw.recency_weight + raw.relevance_weight;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::ValidationError(format!(
                "context.recency_weight + context.relevance_weight must equal 1.0, got {sum}"
            )));
        }

        Ok(Self {
            max_tokens: raw.max_tokens,
            reserve_ratio: raw.reserve_ratio,
            min_relevance: raw.min_relevance,
            enable_compression: raw.enable_compression,
            recency_weight: raw.recency_weight,
            relevance_weight: raw.relevance_weight,
        })
    }
}

impl From<ContextConfig> for RawContextConfig {
    fn from(config: ContextConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            reserve_ratio: config.reserve_ratio,
            min_relevance: config.min_relevance,
            enable_compression: config.enable_compression,
            recency_weight: config.recency_weight,
            relevance_weight: config.relevance_weight,
        }
    }
}

fn check_unit(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )))
    }
}

impl ContextConfig {
    /// Build a validated policy. Rejects a zero budget, any ratio outside
    /// `[0, 1]`, and weights that do not sum to 1.0.
    pub fn new(
        max_tokens: usize,
        reserve_ratio: f64,
        min_relevance: f64,
        enable_compression: bool,
        recency_weight: f64,
        relevance_weight: f64,
    ) -> Result<Self, ConfigError> {
        RawContextConfig {
            max_tokens,
            reserve_ratio,
            min_relevance,
            enable_compression,
            recency_weight,
            relevance_weight,
        }
        .try_into()
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn reserve_ratio(&self) -> f64 {
        self.reserve_ratio
    }

    pub fn min_relevance(&self) -> f64 {
        self.min_relevance
    }

    pub fn enable_compression(&self) -> bool {
        self.enable_compression
    }

    pub fn recency_weight(&self) -> f64 {
        self.recency_weight
    }

    pub fn relevance_weight(&self) -> f64 {
        self.relevance_weight
    }

    /// Share of the budget nominally set aside for pinned instructions.
    pub fn pinned_reserve(&self) -> usize {
        (self.max_tokens as f64 * self.reserve_ratio).floor() as usize
    }

    /// Copy of this policy with a different budget, re-validated.
    pub fn with_max_tokens(&self, max_tokens: usize) -> Result<Self, ConfigError> {
        RawContextConfig {
            max_tokens,
            ..RawContextConfig::from(*self)
        }
        .try_into()
    }

    /// Copy of this policy with a different relevance floor, re-validated.
    pub fn with_min_relevance(&self, min_relevance: f64) -> Result<Self, ConfigError> {
        RawContextConfig {
            min_relevance,
            ..RawContextConfig::from(*self)
        }
        .try_into()
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            reserve_ratio: default_reserve_ratio(),
            min_relevance: default_min_relevance(),
            enable_compression: true,
            recency_weight: default_recency_weight(),
            relevance_weight: default_relevance_weight(),
        }
    }
}

// ── Gathering ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatherConfig {
    /// Maximum memory search results requested
    #[serde(default = "default_memory_limit")]
    pub memory_limit: usize,

    /// Importance floor passed to memory search
    #[serde(default = "default_min_importance")]
    pub min_importance: f64,

    /// Maximum knowledge search results requested
    #[serde(default = "default_knowledge_limit")]
    pub knowledge_limit: usize,

    /// Score floor passed to knowledge search
    #[serde(default = "default_min_knowledge_score")]
    pub min_knowledge_score: f64,

    /// Number of most recent conversation turns considered
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Baseline relevance given to history turns
    #[serde(default = "default_history_relevance")]
    pub history_relevance: f64,

    /// Per-source timeout for memory and knowledge search
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,
}

fn default_memory_limit() -> usize {
    10
}
fn default_min_importance() -> f64 {
    0.3
}
fn default_knowledge_limit() -> usize {
    5
}
fn default_min_knowledge_score() -> f64 {
    0.3
}
fn default_history_window() -> usize {
    5
}
fn default_history_relevance() -> f64 {
    0.6
}
fn default_source_timeout_ms() -> u64 {
    2000
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            memory_limit: default_memory_limit(),
            min_importance: default_min_importance(),
            knowledge_limit: default_knowledge_limit(),
            min_knowledge_score: default_min_knowledge_score(),
            history_window: default_history_window(),
            history_relevance: default_history_relevance(),
            source_timeout_ms: default_source_timeout_ms(),
        }
    }
}

// ── Working memory ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingMemoryConfig {
    /// Maximum number of items held at once
    #[serde(default = "default_max_capacity")]
    pub max_capacity: usize,

    /// Items older than this are expired
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: i64,

    /// Blend TF-IDF cosine similarity into retrieval scores
    #[serde(default = "default_true")]
    pub vector_index: bool,
}

fn default_max_capacity() -> usize {
    50
}
fn default_max_age_minutes() -> i64 {
    60
}

impl Default for WorkingMemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            max_age_minutes: default_max_age_minutes(),
            vector_index: true,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from the default path (~/.tessera/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `TESSERA_MAX_TOKENS`
    /// - `TESSERA_MIN_RELEVANCE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".tessera")
    }

    /// Apply `TESSERA_*` environment overrides, re-validating the context policy.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(raw) = std::env::var("TESSERA_MAX_TOKENS") {
            let max_tokens = raw.parse::<usize>().map_err(|_| {
                ConfigError::ValidationError(format!("TESSERA_MAX_TOKENS is not an integer: {raw}"))
            })?;
            self.context = self.context.with_max_tokens(max_tokens)?;
        }

        if let Ok(raw) = std::env::var("TESSERA_MIN_RELEVANCE") {
            let min_relevance = raw.parse::<f64>().map_err(|_| {
                ConfigError::ValidationError(format!("TESSERA_MIN_RELEVANCE is not a number: {raw}"))
            })?;
            self.context = self.context.with_min_relevance(min_relevance)?;
        }

        Ok(())
    }

    /// Validate the parts of the configuration not already checked at parse time.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.working_memory.max_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "working_memory.max_capacity must be at least 1".into(),
            ));
        }

        if !(1..=MAX_WORKING_MEMORY_AGE_MINUTES).contains(&self.working_memory.max_age_minutes) {
            return Err(ConfigError::ValidationError(format!(
                "working_memory.max_age_minutes must be between 1 and {MAX_WORKING_MEMORY_AGE_MINUTES}, got {}",
                self.working_memory.max_age_minutes
            )));
        }

        check_unit("gather.min_importance", self.gather.min_importance)?;
        check_unit("gather.min_knowledge_score", self.gather.min_knowledge_score)?;
        check_unit("gather.history_relevance", self.gather.history_relevance)?;

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        Self::default().to_toml()
    }

    /// Render this configuration as TOML.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
