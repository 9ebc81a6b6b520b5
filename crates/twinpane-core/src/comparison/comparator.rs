//! Four-way diff of two directory trees.

use std::cmp::Ordering;
use std::path::Path;

use super::indexer::index_tree_with_config;
use super::types::{DiffEntry, DiffResult, FileRecord, IndexError, Snapshot};
use crate::config::CoreConfig;

/// Compares two trees with the default configuration.
pub fn compare_dirs(left: &Path, right: &Path, use_hash: bool) -> Result<DiffResult, IndexError> {
    compare_dirs_with_config(left, right, use_hash, &CoreConfig::default())
}

/// Indexes both sides with the same `use_hash` flag, then diffs the snapshots.
pub fn compare_dirs_with_config(
    left: &Path,
    right: &Path,
    use_hash: bool,
    config: &CoreConfig,
) -> Result<DiffResult, IndexError> {
    let left_snapshot = index_tree_with_config(left, use_hash, config)?;
    let right_snapshot = index_tree_with_config(right, use_hash, config)?;
    let result = diff_snapshots(&left_snapshot, &right_snapshot, use_hash);

    log::info!(
        "compare_dirs: left={}, right={}, use_hash={}, only_left={}, only_right={}, differing={}, identical={}",
        result.left_root.display(),
        result.right_root.display(),
        use_hash,
        result.only_left.len(),
        result.only_right.len(),
        result.differing.len(),
        result.identical.len()
    );
    Ok(result)
}

/// Merge-joins two snapshots. Both key sets are already sorted, so this is a single pass.
pub fn diff_snapshots(left: &Snapshot, right: &Snapshot, use_hash: bool) -> DiffResult {
    let mut entries = Vec::with_capacity(left.len().max(right.len()));
    let mut left_iter = left.entries.iter().peekable();
    let mut right_iter = right.entries.iter().peekable();

    loop {
        let order = match (left_iter.peek(), right_iter.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((l, _)), Some((r, _))) => l.cmp(r),
        };
        match order {
            Ordering::Less => {
                if let Some((_, record)) = left_iter.next() {
                    entries.push(DiffEntry::OnlyLeft(record.clone()));
                }
            }
            Ordering::Greater => {
                if let Some((_, record)) = right_iter.next() {
                    entries.push(DiffEntry::OnlyRight(record.clone()));
                }
            }
            Ordering::Equal => {
                if let (Some((_, l)), Some((_, r))) = (left_iter.next(), right_iter.next()) {
                    entries.push(classify(l, r, use_hash));
                }
            }
        }
    }

    DiffResult::from_entries(left.root.clone(), right.root.clone(), entries)
}

/// Classifies a path present on both sides. Rules apply in order:
/// 1. type mismatch is always different
/// 2. two directories are the same (their metadata is not compared)
/// 3. without hashing, files match on exact size and mtime
/// 4. with hashing, files match on size and a known, equal hash
pub fn classify(left: &FileRecord, right: &FileRecord, use_hash: bool) -> DiffEntry {
    let same = if left.is_directory != right.is_directory {
        false
    } else if left.is_directory {
        true
    } else if use_hash {
        left.size == right.size
            && matches!((&left.content_hash, &right.content_hash), (Some(a), Some(b)) if a == b)
    } else {
        left.size == right.size && left.modified_time_nanos == right.modified_time_nanos
    };

    if same {
        DiffEntry::Same(left.clone(), right.clone())
    } else {
        DiffEntry::Different(left.clone(), right.clone())
    }
}
