//! Directory comparison: index both trees, then diff the snapshots.

mod comparator;
mod indexer;
mod types;

pub use comparator::{classify, compare_dirs, compare_dirs_with_config, diff_snapshots};
pub use indexer::{hash_file, index_tree, index_tree_with_config};
pub use types::{DiffEntry, DiffResult, FileRecord, IndexError, Snapshot};

#[cfg(test)]
mod compare_test;
