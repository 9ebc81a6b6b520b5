//! Collision-free destination names: `name (1).ext`, `name (2).ext`, and so on.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::write_operations::OperationError;

/// What kind of entry the generated name is for. Decides where the counter goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    /// Counter goes before the extension: `a (1).txt`
    File,
    /// Counter goes after the full name, dots included: `v1.2 (1)`
    Directory,
}

/// Returns `candidate` if nothing occupies it, else the first free `name (N)` variant.
///
/// Only existence is checked, so a file blocking a directory name (or the reverse) still
/// counts as taken. The probe is unbounded; use [`uniquify_bounded`] to cap it.
pub fn uniquify(candidate: &Path, kind: PathKind) -> PathBuf {
    let mut counter: u64 = 0;
    loop {
        let path = numbered_path(candidate, kind, counter);
        if !is_occupied(&path) {
            return path;
        }
        counter += 1;
    }
}

/// Like [`uniquify`], but gives up after `max_probe` numbered attempts.
pub fn try_uniquify(candidate: &Path, kind: PathKind, max_probe: u32) -> Option<PathBuf> {
    (0..=u64::from(max_probe))
        .map(|counter| numbered_path(candidate, kind, counter))
        .find(|path| !is_occupied(path))
}

/// [`try_uniquify`] with exhaustion reported as a conflict.
pub fn uniquify_bounded(candidate: &Path, kind: PathKind, max_probe: u32) -> Result<PathBuf, OperationError> {
    try_uniquify(candidate, kind, max_probe).ok_or_else(|| {
        OperationError::conflict(
            candidate,
            format!("no free name after {} numbered attempts", max_probe),
        )
    })
}

/// Builds the name for probe `counter`. Counter 0 is the candidate itself.
fn numbered_path(candidate: &Path, kind: PathKind, counter: u64) -> PathBuf {
    if counter == 0 {
        return candidate.to_path_buf();
    }
    let parent = candidate.parent().unwrap_or(Path::new(""));

    let mut name = OsString::new();
    match kind {
        PathKind::Directory => {
            name.push(candidate.file_name().unwrap_or_default());
            name.push(format!(" ({})", counter));
        }
        PathKind::File => {
            name.push(candidate.file_stem().unwrap_or_default());
            name.push(format!(" ({})", counter));
            if let Some(ext) = candidate.extension() {
                name.push(".");
                name.push(ext);
            }
        }
    }
    parent.join(name)
}

/// Dangling symlinks count as occupied.
fn is_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
