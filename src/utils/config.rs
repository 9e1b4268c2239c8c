use crate::index::reader::IndexKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Runtime configuration, read from a JSON file.
///
/// Every field has a default, so a partial file (or `{}`) is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Collection walking and index construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Files larger than this many bytes are skipped
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Number of files read and tokenized per parallel batch
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Show a progress bar while indexing
    #[serde(default = "default_progress")]
    pub progress: bool,
}

/// How a built index is opened
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub kind: IndexKind,

    /// Decoded postings kept by the disk variant; 0 disables the cache
    #[serde(default)]
    pub postings_cache_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result count when the caller gives none
    #[serde(default = "default_cutoff")]
    pub default_cutoff: usize,

    /// Minimum candidate documents handed to one rayon task
    #[serde(default = "default_min_shard_len")]
    pub min_shard_len: usize,
}

fn default_max_file_size() -> u64 {
    100 * 1024 * 1024
}

fn default_chunk_size() -> usize {
    1024
}

fn default_progress() -> bool {
    true
}

fn default_cutoff() -> usize {
    10
}

fn default_min_shard_len() -> usize {
    64
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            chunk_size: default_chunk_size(),
            progress: default_progress(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_cutoff: default_cutoff(),
            min_shard_len: default_min_shard_len(),
        }
    }
}

impl Config {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Load config from `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
