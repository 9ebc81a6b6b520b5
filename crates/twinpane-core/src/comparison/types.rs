//! Snapshot and diff types for directory comparison.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

// ============================================================================
// Snapshot
// ============================================================================

/// Metadata for one entry of an indexed tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Path relative to the indexed root, `/`-separated on every platform. Non-UTF-8 bytes are
    /// written as `\xNN`.
    pub relative_path: String,
    /// Size in bytes (0 if stat failed)
    pub size: u64,
    /// Modification time in nanoseconds since the Unix epoch (0 if stat failed)
    pub modified_time_nanos: i64,
    /// False for symlinks, even when they point at a directory
    pub is_directory: bool,
    /// Lower-hex SHA-256 of the contents. Only for regular files, only when hashing was asked
    /// for, and `None` whenever reading failed.
    pub content_hash: Option<String>,
}

/// Point-in-time view of one tree, keyed by relative path in lexicographic order.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub root: PathBuf,
    pub entries: BTreeMap<String, FileRecord>,
    /// Whether the walk stopped at the entry limit
    pub truncated: bool,
}

impl Snapshot {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            entries: BTreeMap::new(),
            truncated: false,
        }
    }

    pub fn get(&self, relative_path: &str) -> Option<&FileRecord> {
        self.entries.get(relative_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One record per path; a repeated path keeps the first record and returns false.
    pub(crate) fn insert(&mut self, record: FileRecord) -> bool {
        match self.entries.entry(record.relative_path.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            Entry::Occupied(_) => false,
        }
    }
}

// ============================================================================
// Diff
// ============================================================================

/// Classification of one relative path across both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum DiffEntry {
    OnlyLeft(FileRecord),
    OnlyRight(FileRecord),
    Same(FileRecord, FileRecord),
    Different(FileRecord, FileRecord),
}

impl DiffEntry {
    pub fn relative_path(&self) -> &str {
        match self {
            DiffEntry::OnlyLeft(r) | DiffEntry::OnlyRight(r) => &r.relative_path,
            DiffEntry::Same(l, _) | DiffEntry::Different(l, _) => &l.relative_path,
        }
    }
}

/// Four-way partition of the union of both snapshots, each list sorted by relative path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    pub left_root: PathBuf,
    pub right_root: PathBuf,
    pub only_left: Vec<FileRecord>,
    pub only_right: Vec<FileRecord>,
    pub differing: Vec<(FileRecord, FileRecord)>,
    pub identical: Vec<(FileRecord, FileRecord)>,
}

impl DiffResult {
    /// Builds the partitioned view from entries already in path order.
    pub fn from_entries(left_root: PathBuf, right_root: PathBuf, entries: Vec<DiffEntry>) -> Self {
        let mut result = Self {
            left_root,
            right_root,
            only_left: Vec::new(),
            only_right: Vec::new(),
            differing: Vec::new(),
            identical: Vec::new(),
        };
        for entry in entries {
            match entry {
                DiffEntry::OnlyLeft(r) => result.only_left.push(r),
                DiffEntry::OnlyRight(r) => result.only_right.push(r),
                DiffEntry::Same(l, r) => result.identical.push((l, r)),
                DiffEntry::Different(l, r) => result.differing.push((l, r)),
            }
        }
        result
    }

    /// Tagged view of every path, in path order.
    pub fn entries(&self) -> Vec<DiffEntry> {
        let mut entries: Vec<DiffEntry> = self
            .only_left
            .iter()
            .cloned()
            .map(DiffEntry::OnlyLeft)
            .chain(self.only_right.iter().cloned().map(DiffEntry::OnlyRight))
            .chain(self.identical.iter().cloned().map(|(l, r)| DiffEntry::Same(l, r)))
            .chain(self.differing.iter().cloned().map(|(l, r)| DiffEntry::Different(l, r)))
            .collect();
        entries.sort_by(|a, b| a.relative_path().cmp(b.relative_path()));
        entries
    }

    /// Number of distinct paths across both sides.
    pub fn total(&self) -> usize {
        self.only_left.len() + self.only_right.len() + self.differing.len() + self.identical.len()
    }

    /// True when nothing is missing or different on either side.
    pub fn is_identical(&self) -> bool {
        self.only_left.is_empty() && self.only_right.is_empty() && self.differing.is_empty()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Only a root that can't be read at all is an error; everything below it is best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndexError {
    RootInaccessible { path: String, message: String },
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::RootInaccessible { path, message } => {
                write!(f, "Can't read directory \"{}\": {}", path, message)
            }
        }
    }
}

impl std::error::Error for IndexError {}
