//! Configuration loading, validation, and management for finctx.
//!
//! Loads configuration from `~/.finctx/config.toml` with environment
//! variable overrides. Every knob has a default, and the defaults are the
//! reference heuristics: changing them changes observable scoring and
//! packing output.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Smallest token budget a request may ask for.
pub const MIN_TOKEN_BUDGET: usize = 100;
/// Largest token budget a request may ask for.
pub const MAX_TOKEN_BUDGET: usize = 4000;
/// Smallest item cap a request may ask for.
pub const MIN_MAX_ITEMS: usize = 1;
/// Largest item cap a request may ask for.
pub const MAX_MAX_ITEMS: usize = 100;

/// The root configuration structure.
///
/// Maps directly to `~/.finctx/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Defaults applied to requests that omit options
    #[serde(default)]
    pub context: ContextDefaults,

    /// Relevance scoring weights
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Diversity packing penalties and thresholds
    #[serde(default)]
    pub packing: PackingConfig,

    /// Evidence confidence settings
    #[serde(default)]
    pub evidence: EvidenceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDefaults {
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,

    #[serde(default = "default_max_items")]
    pub max_items: usize,

    #[serde(default = "default_true")]
    pub include_aggregates: bool,
}

fn default_token_budget() -> usize {
    2000
}
fn default_max_items() -> usize {
    50
}
fn default_true() -> bool {
    true
}

impl Default for ContextDefaults {
    fn default() -> Self {
        Self {
            token_budget: default_token_budget(),
            max_items: default_max_items(),
            include_aggregates: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Added per query token found verbatim among the snippet tokens.
    #[serde(default = "default_exact_match_weight")]
    pub exact_match_weight: f64,

    /// Added per (query token, snippet token) pair where one contains the other.
    #[serde(default = "default_substring_weight")]
    pub substring_weight: f64,

    #[serde(default = "default_recency_bonus")]
    pub recency_bonus: f64,

    /// Window for the recency bonus, in days either side of now.
    #[serde(default = "default_recency_days")]
    pub recency_days: i64,

    #[serde(default = "default_large_amount_bonus")]
    pub large_amount_bonus: f64,

    #[serde(default = "default_large_amount_threshold")]
    pub large_amount_threshold: f64,
}

fn default_exact_match_weight() -> f64 {
    1.0
}
fn default_substring_weight() -> f64 {
    0.5
}
fn default_recency_bonus() -> f64 {
    0.5
}
fn default_recency_days() -> i64 {
    30
}
fn default_large_amount_bonus() -> f64 {
    0.3
}
fn default_large_amount_threshold() -> f64 {
    1000.0
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            exact_match_weight: default_exact_match_weight(),
            substring_weight: default_substring_weight(),
            recency_bonus: default_recency_bonus(),
            recency_days: default_recency_days(),
            large_amount_bonus: default_large_amount_bonus(),
            large_amount_threshold: default_large_amount_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingConfig {
    /// Share of the token budget held back for aggregate snippets.
    #[serde(default = "default_aggregate_reserve_ratio")]
    pub aggregate_reserve_ratio: f64,

    #[serde(default = "default_same_kind_penalty")]
    pub same_kind_penalty: f64,

    #[serde(default = "default_similar_amount_penalty")]
    pub similar_amount_penalty: f64,

    /// Two amounts closer than this (inclusive) count as similar.
    #[serde(default = "default_similar_amount_window")]
    pub similar_amount_window: f64,

    /// Applied when category or symbol tags match.
    #[serde(default = "default_shared_label_penalty")]
    pub shared_label_penalty: f64,

    #[serde(default = "default_diversity_floor")]
    pub diversity_floor: f64,

    /// Candidates must score strictly above this after the diversity penalty.
    #[serde(default = "default_min_combined_score")]
    pub min_combined_score: f64,

    /// Fixed relevance of synthesized summary snippets.
    #[serde(default = "default_summary_relevance")]
    pub summary_relevance: f64,
}

fn default_aggregate_reserve_ratio() -> f64 {
    0.3
}
fn default_same_kind_penalty() -> f64 {
    0.8
}
fn default_similar_amount_penalty() -> f64 {
    0.7
}
fn default_similar_amount_window() -> f64 {
    50.0
}
fn default_shared_label_penalty() -> f64 {
    0.6
}
fn default_diversity_floor() -> f64 {
    0.1
}
fn default_min_combined_score() -> f64 {
    0.1
}
fn default_summary_relevance() -> f64 {
    10.0
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            aggregate_reserve_ratio: default_aggregate_reserve_ratio(),
            same_kind_penalty: default_same_kind_penalty(),
            similar_amount_penalty: default_similar_amount_penalty(),
            similar_amount_window: default_similar_amount_window(),
            shared_label_penalty: default_shared_label_penalty(),
            diversity_floor: default_diversity_floor(),
            min_combined_score: default_min_combined_score(),
            summary_relevance: default_summary_relevance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceConfig {
    /// An invocation newer than this earns the freshness share of confidence.
    #[serde(default = "default_recency_window_secs")]
    pub recency_window_secs: i64,
}

fn default_recency_window_secs() -> i64 {
    3600
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            recency_window_secs: default_recency_window_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.finctx/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `FINCTX_TOKEN_BUDGET`
    /// - `FINCTX_MAX_ITEMS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
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
        Ok(config)
    }

    /// Apply overrides from an environment lookup, then re-validate.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup("FINCTX_TOKEN_BUDGET") {
            self.context.token_budget = parse_env("FINCTX_TOKEN_BUDGET", &raw)?;
        }
        if let Some(raw) = lookup("FINCTX_MAX_ITEMS") {
            self.context.max_items = parse_env("FINCTX_MAX_ITEMS", &raw)?;
        }
        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".finctx")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let budget = self.context.token_budget;
        if !(MIN_TOKEN_BUDGET..=MAX_TOKEN_BUDGET).contains(&budget) {
            return Err(ConfigError::ValidationError(format!(
                "context.token_budget must be between {MIN_TOKEN_BUDGET} and {MAX_TOKEN_BUDGET}, got {budget}"
            )));
        }

        let max_items = self.context.max_items;
        if !(MIN_MAX_ITEMS..=MAX_MAX_ITEMS).contains(&max_items) {
            return Err(ConfigError::ValidationError(format!(
                "context.max_items must be between {MIN_MAX_ITEMS} and {MAX_MAX_ITEMS}, got {max_items}"
            )));
        }

        let reserve = self.packing.aggregate_reserve_ratio;
        if !(0.0..1.0).contains(&reserve) {
            return Err(ConfigError::ValidationError(
                "packing.aggregate_reserve_ratio must be in [0.0, 1.0)".into(),
            ));
        }

        let penalties = [
            ("same_kind_penalty", self.packing.same_kind_penalty),
            ("similar_amount_penalty", self.packing.similar_amount_penalty),
            ("shared_label_penalty", self.packing.shared_label_penalty),
            ("diversity_floor", self.packing.diversity_floor),
        ];
        for (name, value) in penalties {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::ValidationError(format!(
                    "packing.{name} must be in (0.0, 1.0], got {value}"
                )));
            }
        }

        if self.scoring.recency_days < 0 || self.evidence.recency_window_secs < 0 {
            return Err(ConfigError::ValidationError(
                "recency windows must not be negative".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_env(key: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{key} must be an integer, got '{raw}'")))
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
