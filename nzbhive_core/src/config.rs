//! Engine and indexer configuration.
//!
//! Configuration is exposed to the engine as read-only snapshots. The store
//! persists YAML at `~/.config/nzbhive/config.yaml` and falls back to a
//! built-in indexer set when no file exists.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::SearchError;

/// Default per-indexer timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default overall request deadline in milliseconds
pub const DEFAULT_DEADLINE_MS: u64 = 30_000;

/// Default global fetch-concurrency bound
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Default cache TTL in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Which adapter implementation an indexer entry selects, plus its
/// adapter-specific settings. Selection happens at configuration-load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexerKind {
    Binsearch,
    Nzbclub,
    Nzbindex,
    Newznab {
        base_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
}

/// One configured indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerConfig {
    pub name: String,

    #[serde(flatten)]
    pub kind: IndexerKind,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Optional override of the adapter's own per-fetch result cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl IndexerConfig {
    pub fn new(name: impl Into<String>, kind: IndexerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            enabled: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_results: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Engine-wide knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Global bound on concurrent outbound fetches across all indexers.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Overall aggregation deadline; fetches still in flight at the deadline
    /// are abandoned and counted as failures.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,

    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_deadline_ms() -> u64 {
    DEFAULT_DEADLINE_MS
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            deadline_ms: DEFAULT_DEADLINE_MS,
            cache_enabled: true,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HiveConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub indexers: Vec<IndexerConfig>,
}

impl HiveConfig {
    /// The built-in indexer set used when no config file exists.
    pub fn builtin() -> Self {
        Self {
            engine: EngineConfig::default(),
            indexers: vec![
                IndexerConfig::new("binsearch", IndexerKind::Binsearch),
                IndexerConfig::new("nzbclub", IndexerKind::Nzbclub),
                IndexerConfig::new("nzbindex", IndexerKind::Nzbindex),
            ],
        }
    }

    pub fn enabled_indexers(&self) -> impl Iterator<Item = &IndexerConfig> {
        self.indexers.iter().filter(|c| c.enabled)
    }
}

/// Storage for the configuration document.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store at the default location under the user config dir.
    pub fn new_default() -> Self {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("nzbhive").join("config.yaml"),
        }
    }

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the config file, falling back to the built-in set when the file
    /// is missing or unreadable.
    pub fn load(&self) -> HiveConfig {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|_| HiveConfig::builtin()),
            Err(_) => HiveConfig::builtin(),
        }
    }

    pub fn save(&self, config: &HiveConfig) -> Result<(), SearchError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            serde_yaml::to_string(config).map_err(|e| SearchError::Config(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new_default()
    }
}
