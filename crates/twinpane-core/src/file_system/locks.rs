//! Locked-paths store: the file manager's own "don't move this" marker.
//!
//! The core algorithms never consult it. Caller-side workflows (paste with cut, the attribute
//! setter) receive a `&dyn LockStore` and decide what to do with the answer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::write_operations::OperationError;

/// Lookup + mutate capability over the set of locked paths.
pub trait LockStore {
    fn is_locked(&self, path: &Path) -> bool;
    fn set_locked(&self, path: &Path, locked: bool) -> Result<(), OperationError>;
}

/// Keys are absolute, symlink-resolved paths when the path exists.
pub fn normalize_key(path: &Path) -> String {
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map(|cwd| cwd.join(path)).unwrap_or_else(|_| path.to_path_buf())
        }
    });
    absolute.to_string_lossy().into_owned()
}

// ============================================================================
// JSON file store
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct LockFile {
    #[serde(default)]
    locked: BTreeSet<String>,
}

/// Persists the set as `{"locked": [...]}`. Reads the file on every call.
#[derive(Debug, Clone)]
pub struct JsonLockStore {
    path: PathBuf,
}

impl JsonLockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.file_manager/locks.json`, or `None` if there's no home directory.
    pub fn default_location() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".file_manager").join("locks.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// An unreadable or malformed file reads as an empty set.
    fn load(&self) -> BTreeSet<String> {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return BTreeSet::new();
        };
        match serde_json::from_str::<LockFile>(&contents) {
            Ok(file) => file.locked,
            Err(e) => {
                log::warn!("locks: ignoring malformed {}: {}", self.path.display(), e);
                BTreeSet::new()
            }
        }
    }

    fn save(&self, locked: BTreeSet<String>) -> Result<(), OperationError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| OperationError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&LockFile { locked }).map_err(|e| OperationError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, json).map_err(|e| OperationError::io(&self.path, e))
    }
}

impl LockStore for JsonLockStore {
    fn is_locked(&self, path: &Path) -> bool {
        self.load().contains(&normalize_key(path))
    }

    fn set_locked(&self, path: &Path, locked: bool) -> Result<(), OperationError> {
        let mut set = self.load();
        let key = normalize_key(path);
        let changed = if locked { set.insert(key) } else { set.remove(&key) };
        if !changed {
            return Ok(());
        }
        log::info!("LOCK | {} | {}", if locked { "set" } else { "clear" }, path.display());
        self.save(set)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Non-persistent store for tests and embedders that keep their own persistence.
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    locked: Mutex<BTreeSet<String>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockStore for MemoryLockStore {
    fn is_locked(&self, path: &Path) -> bool {
        let set = self.locked.lock().unwrap_or_else(|e| e.into_inner());
        set.contains(&normalize_key(path))
    }

    fn set_locked(&self, path: &Path, locked: bool) -> Result<(), OperationError> {
        let mut set = self.locked.lock().unwrap_or_else(|e| e.into_inner());
        let key = normalize_key(path);
        if locked {
            set.insert(key);
        } else {
            set.remove(&key);
        }
        Ok(())
    }
}
