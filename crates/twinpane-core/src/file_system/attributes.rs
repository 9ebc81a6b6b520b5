//! Batch attribute setter: read-only flag, lock flag, access/modification times.

use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::locks::LockStore;

/// What to change. `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct AttributeRequest {
    pub read_only: Option<bool>,
    pub locked: Option<bool>,
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
}

/// One attribute that couldn't be applied to one path.
#[derive(Debug, Clone)]
pub struct AttributeFailure {
    pub path: PathBuf,
    pub attribute: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct AttributeReport {
    /// Paths that existed and were visited
    pub applied: usize,
    /// Paths that didn't exist
    pub missing: Vec<PathBuf>,
    pub failures: Vec<AttributeFailure>,
}

/// Applies `request` to every path. A failure on one path or attribute never blocks the rest.
pub fn apply_attributes(paths: &[PathBuf], request: &AttributeRequest, locks: &dyn LockStore) -> AttributeReport {
    let mut report = AttributeReport::default();

    for path in paths {
        if fs::symlink_metadata(path).is_err() {
            report.missing.push(path.clone());
            continue;
        }
        report.applied += 1;

        let mut record = |attribute: &'static str, message: String| {
            log::warn!("apply_attributes: {} on {} failed: {}", attribute, path.display(), message);
            report.failures.push(AttributeFailure {
                path: path.clone(),
                attribute,
                message,
            });
        };

        if let Some(read_only) = request.read_only
            && let Err(e) = set_read_only(path, read_only)
        {
            record("read_only", e.to_string());
        }

        if let Some(locked) = request.locked
            && let Err(e) = locks.set_locked(path, locked)
        {
            record("locked", e.to_string());
        }

        if (request.modified.is_some() || request.accessed.is_some())
            && let Err(e) = set_times(path, request.accessed, request.modified)
        {
            record("times", e.to_string());
        }
    }

    report
}

/// Toggles only the owner write bit on unix; group/other bits stay as they were.
#[cfg(unix)]
fn set_read_only(path: &Path, read_only: bool) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    let mode = permissions.mode();
    let owner_write = 0o200;
    permissions.set_mode(if read_only { mode & !owner_write } else { mode | owner_write });
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn set_read_only(path: &Path, read_only: bool) -> std::io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(read_only);
    fs::set_permissions(path, permissions)
}

/// Unspecified times keep their current value.
fn set_times(path: &Path, accessed: Option<SystemTime>, modified: Option<SystemTime>) -> std::io::Result<()> {
    let metadata = fs::metadata(path)?;
    let atime = accessed
        .map(FileTime::from_system_time)
        .unwrap_or_else(|| FileTime::from_last_access_time(&metadata));
    let mtime = modified
        .map(FileTime::from_system_time)
        .unwrap_or_else(|| FileTime::from_last_modification_time(&metadata));
    filetime::set_file_times(path, atime, mtime)
}
