//! Core configuration: walk limits, hash chunk size, uniquifier bound.
//!
//! Priority: environment variables > settings file > defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Default cap on entries recorded per indexed tree.
pub const DEFAULT_INDEX_ENTRY_LIMIT: usize = 200_000;
/// Default read size when hashing file contents (1 MiB).
pub const DEFAULT_HASH_CHUNK_SIZE: usize = 1024 * 1024;
/// Default cap on name search results.
pub const DEFAULT_SEARCH_RESULT_LIMIT: usize = 5000;

/// Tunables for the filesystem core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreConfig {
    /// Max entries recorded per snapshot (default: 200 000)
    #[serde(default = "default_index_entry_limit")]
    pub index_entry_limit: usize,
    /// Bytes per read while hashing (default: 1 MiB)
    #[serde(default = "default_hash_chunk_size")]
    pub hash_chunk_size: usize,
    /// Max paths returned by a name search (default: 5000)
    #[serde(default = "default_search_result_limit")]
    pub search_result_limit: usize,
    /// Max " (N)" suffixes tried before the uniquifier gives up (default: unbounded)
    #[serde(default = "default_max_unique_probe")]
    pub max_unique_probe: u32,
}

fn default_index_entry_limit() -> usize {
    DEFAULT_INDEX_ENTRY_LIMIT
}

fn default_hash_chunk_size() -> usize {
    DEFAULT_HASH_CHUNK_SIZE
}

fn default_search_result_limit() -> usize {
    DEFAULT_SEARCH_RESULT_LIMIT
}

fn default_max_unique_probe() -> u32 {
    u32::MAX
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            index_entry_limit: DEFAULT_INDEX_ENTRY_LIMIT,
            hash_chunk_size: DEFAULT_HASH_CHUNK_SIZE,
            search_result_limit: DEFAULT_SEARCH_RESULT_LIMIT,
            max_unique_probe: u32::MAX,
        }
    }
}

impl CoreConfig {
    /// Loads the settings file at `path`, then applies env var overrides.
    /// Returns defaults (plus overrides) if the file doesn't exist or can't be parsed.
    pub fn load(path: &Path) -> Self {
        let from_file = match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("config: ignoring malformed settings file {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        from_file.with_env_overrides()
    }

    /// Defaults plus env var overrides.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        Self {
            index_entry_limit: env_parse("TWINPANE_INDEX_LIMIT").unwrap_or(self.index_entry_limit),
            hash_chunk_size: env_parse("TWINPANE_HASH_CHUNK_SIZE")
                .filter(|&size: &usize| size > 0)
                .unwrap_or(self.hash_chunk_size),
            search_result_limit: env_parse("TWINPANE_SEARCH_LIMIT").unwrap_or(self.search_result_limit),
            max_unique_probe: env_parse("TWINPANE_MAX_UNIQUE_PROBE").unwrap_or(self.max_unique_probe),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
