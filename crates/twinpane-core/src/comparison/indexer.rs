//! Iterative directory walker that builds a [`Snapshot`].
//!
//! Walks with `walkdir`, which keeps pending directories on the heap instead of recursing, so tree
//! depth is bounded by heap, not by the thread stack. Symlinks aren't followed: a symlinked
//! directory is recorded as a leaf and never entered.
//!
//! Per-entry failures (permission denied, vanished files, stat errors) skip that entry, and an
//! unreadable subdirectory skips that subtree. Only an unreadable root is an error.

use sha2::{Digest, Sha256};
use std::fs::{self, File, Metadata};
use std::io::{self, Read};
use std::path::Path;
use std::time::Instant;
use walkdir::WalkDir;

use super::types::{FileRecord, IndexError, Snapshot};
use crate::config::{CoreConfig, DEFAULT_HASH_CHUNK_SIZE};

// ── Public API ───────────────────────────────────────────────────────

/// Indexes `root` with the default hash chunk size.
pub fn index_tree(root: &Path, use_hash: bool, limit: usize) -> Result<Snapshot, IndexError> {
    run_index(root, use_hash, limit, DEFAULT_HASH_CHUNK_SIZE)
}

/// Indexes `root` with the limit and chunk size from `config`.
pub fn index_tree_with_config(root: &Path, use_hash: bool, config: &CoreConfig) -> Result<Snapshot, IndexError> {
    run_index(root, use_hash, config.index_entry_limit, config.hash_chunk_size)
}

/// Streams `path` through SHA-256 in `chunk_size` reads. Returns lower-hex.
pub fn hash_file(path: &Path, chunk_size: usize) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];
    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

// ── Core walk ────────────────────────────────────────────────────────

fn run_index(root: &Path, use_hash: bool, limit: usize, chunk_size: usize) -> Result<Snapshot, IndexError> {
    let start = Instant::now();
    let root = fs::canonicalize(root).map_err(|e| root_error(root, &e))?;
    // Also rejects a root that is a file, which WalkDir would yield as a single entry
    fs::read_dir(&root).map_err(|e| root_error(&root, &e))?;
    let mut snapshot = Snapshot::new(&root);
    let mut hash_failures: usize = 0;

    // WalkDir keeps its own heap stack of open directories and doesn't follow symlinks
    for entry_result in WalkDir::new(&root).min_depth(1) {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                let io_err = e.into_io_error().unwrap_or_else(|| io::Error::other("walk failed at root"));
                return Err(root_error(&root, &io_err));
            }
            Err(e) => {
                // Unreadable directory: WalkDir skips its subtree and carries on with siblings
                log::debug!("index_tree: skipping {}: {}", e.path().unwrap_or(root.as_path()).display(), e);
                continue;
            }
        };

        if snapshot.len() >= limit {
            snapshot.truncated = true;
            break;
        }

        let path = entry.path();
        let Ok(relative) = path.strip_prefix(&root) else {
            continue;
        };
        let relative_path = relative_key(relative);
        let file_type = entry.file_type();

        let (size, modified_time_nanos) = match entry.metadata() {
            Ok(meta) => (meta.len(), modified_nanos(&meta)),
            Err(_) => (0, 0),
        };

        let content_hash = if use_hash && file_type.is_file() {
            match hash_file(path, chunk_size) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    hash_failures += 1;
                    log::debug!("index_tree: hash failed for {}: {}", path.display(), e);
                    None
                }
            }
        } else {
            None
        };

        let inserted = snapshot.insert(FileRecord {
            relative_path,
            size,
            modified_time_nanos,
            is_directory: file_type.is_dir(),
            content_hash,
        });
        if !inserted {
            log::warn!("index_tree: {} maps to an already recorded key, skipped", path.display());
        }
    }

    log::info!(
        "index_tree: root={}, entries={}, truncated={}, hash_failures={}, duration_ms={}",
        root.display(),
        snapshot.len(),
        snapshot.truncated,
        hash_failures,
        start.elapsed().as_millis()
    );
    Ok(snapshot)
}

// ── Helpers ──────────────────────────────────────────────────────────

fn root_error(root: &Path, err: &io::Error) -> IndexError {
    IndexError::RootInaccessible {
        path: root.display().to_string(),
        message: err.to_string(),
    }
}

/// `/`-joined key for a path relative to the root. Bytes that aren't valid UTF-8 are written as
/// `\xNN`, so distinct names never collapse onto the same key.
pub(crate) fn relative_key(relative: &Path) -> String {
    let mut key = String::new();
    for component in relative.components() {
        if !key.is_empty() {
            key.push('/');
        }
        for chunk in component.as_os_str().as_encoded_bytes().utf8_chunks() {
            key.push_str(chunk.valid());
            for byte in chunk.invalid() {
                key.push_str(&format!("\\x{:02x}", byte));
            }
        }
    }
    key
}

/// Modification time in nanoseconds since the epoch. Negative before 1970.
#[cfg(unix)]
fn modified_nanos(meta: &Metadata) -> i64 {
    use std::os::unix::fs::MetadataExt;
    meta.mtime().saturating_mul(1_000_000_000).saturating_add(meta.mtime_nsec())
}

#[cfg(not(unix))]
fn modified_nanos(meta: &Metadata) -> i64 {
    let Ok(modified) = meta.modified() else {
        return 0;
    };
    match modified.duration_since(std::time::UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_nanos()).unwrap_or(i64::MAX),
        Err(before) => -i64::try_from(before.duration().as_nanos()).unwrap_or(i64::MAX),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
