//! Clipboard paste: copy or cut one entry into a directory, keep-both on collisions.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CoreConfig;
use crate::file_system::locks::LockStore;
use crate::file_system::primitives::{copy_any, move_any, remove_any};
use crate::file_system::uniquify::{PathKind, uniquify_bounded};

use super::merge::merge_into_with_config;
use super::types::OperationError;

/// What the user last copied or cut.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clipboard {
    pub source: Option<PathBuf>,
    /// Cut (move on paste) rather than copy
    pub is_cut: bool,
}

impl Clipboard {
    pub fn copy(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(path.into()),
            is_cut: false,
        }
    }

    pub fn cut(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(path.into()),
            is_cut: true,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_none()
    }
}

/// Pastes the clipboard entry into `dest_dir` and returns where it ended up.
///
/// - directory onto a directory of the same name: merged (a cut then deletes the source)
/// - anything else onto an occupied name: placed under a ` (N)` name
/// - pasting back into the source's own folder duplicates on copy and is a no-op on cut
///
/// A cut of a path marked locked in `locks` is refused. A successful cut empties the clipboard.
pub fn paste_into(clipboard: &mut Clipboard, dest_dir: &Path, locks: &dyn LockStore) -> Result<PathBuf, OperationError> {
    paste_into_with_config(clipboard, dest_dir, locks, &CoreConfig::default())
}

pub fn paste_into_with_config(
    clipboard: &mut Clipboard,
    dest_dir: &Path,
    locks: &dyn LockStore,
    config: &CoreConfig,
) -> Result<PathBuf, OperationError> {
    let Some(source) = clipboard.source.clone() else {
        return Err(OperationError::invalid_argument(dest_dir, "clipboard is empty"));
    };
    let source_meta = fs::symlink_metadata(&source).map_err(|e| OperationError::io(&source, e))?;
    if !dest_dir.is_dir() {
        return Err(OperationError::invalid_argument(dest_dir, "paste target is not a directory"));
    }
    if clipboard.is_cut && locks.is_locked(&source) {
        return Err(OperationError::Locked {
            path: source.display().to_string(),
        });
    }
    let Some(name) = source.file_name() else {
        return Err(OperationError::invalid_argument(&source, "can't paste a filesystem root"));
    };

    let target = dest_dir.join(name);
    let kind = if source_meta.is_dir() {
        PathKind::Directory
    } else {
        PathKind::File
    };
    let same_place = is_same_path(&source, &target);

    if clipboard.is_cut && same_place {
        log::debug!("paste_into: cut onto itself, nothing to do for {}", source.display());
        clipboard.clear();
        return Ok(source);
    }

    let occupant = fs::symlink_metadata(&target).ok();
    let final_path = match occupant {
        Some(meta) if kind == PathKind::Directory && meta.is_dir() && !same_place => {
            merge_into_with_config(&source, &target, config)?;
            if clipboard.is_cut {
                remove_any(&source)?;
            }
            target
        }
        Some(_) => {
            let unique = uniquify_bounded(&target, kind, config.max_unique_probe)?;
            log::info!("PASTE_CONFLICT | {} -> {}", source.display(), unique.display());
            transfer(&source, &unique, clipboard.is_cut)?;
            unique
        }
        None => {
            transfer(&source, &target, clipboard.is_cut)?;
            target
        }
    };

    if clipboard.is_cut {
        clipboard.clear();
    }
    Ok(final_path)
}

fn transfer(source: &Path, dest: &Path, is_cut: bool) -> Result<(), OperationError> {
    if is_cut { move_any(source, dest) } else { copy_any(source, dest) }
}

/// Compares resolved parents plus the final name, so a symlink is not confused with its target.
fn is_same_path(a: &Path, b: &Path) -> bool {
    let resolve = |p: &Path| -> Option<PathBuf> {
        let parent = p.parent().filter(|parent| !parent.as_os_str().is_empty()).unwrap_or(Path::new("."));
        Some(fs::canonicalize(parent).ok()?.join(p.file_name()?))
    };
    match (resolve(a), resolve(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
