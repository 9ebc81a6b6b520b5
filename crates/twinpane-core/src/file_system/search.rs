//! Case-insensitive name search under a directory.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::CoreConfig;

/// Returns paths whose file name contains `query` (case-insensitive).
///
/// Never descends into symlinked directories. Unreadable directories are skipped.
/// Stops after `limit` matches. Empty query or a root that isn't a directory yields nothing.
pub fn search_paths(root: &Path, query: &str, recursive: bool, limit: usize) -> Vec<PathBuf> {
    let needle = query.trim().to_lowercase();
    let mut results = Vec::new();
    if needle.is_empty() || limit == 0 || !root.is_dir() {
        return results;
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 });
    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("search_paths: skipping {}: {}", e.path().unwrap_or(root).display(), e);
                continue;
            }
        };
        if entry.file_name().to_string_lossy().to_lowercase().contains(&needle) {
            results.push(entry.into_path());
            if results.len() >= limit {
                break;
            }
        }
    }

    results
}

/// [`search_paths`] capped at `config.search_result_limit`.
pub fn search_paths_with_config(root: &Path, query: &str, recursive: bool, config: &CoreConfig) -> Vec<PathBuf> {
    search_paths(root, query, recursive, config.search_result_limit)
}
