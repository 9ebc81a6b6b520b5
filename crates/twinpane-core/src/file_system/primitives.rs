//! Thin wrappers over OS primitives: delete, copy, move, create.
//!
//! None of these overwrite. Copy and move fail with `AlreadyExists` when the target is taken;
//! callers pick a free name with [`uniquify`](super::uniquify) first.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::write_operations::OperationError;

/// Deletes a file, symlink, or whole directory tree. Symlinks are removed, never followed.
pub fn remove_any(path: &Path) -> Result<(), OperationError> {
    log::info!("DELETE | {}", path.display());
    let meta = fs::symlink_metadata(path).map_err(|e| OperationError::io(path, e))?;
    if meta.is_dir() {
        fs::remove_dir_all(path).map_err(|e| OperationError::io(path, e))
    } else {
        fs::remove_file(path).map_err(|e| OperationError::io(path, e))
    }
}

/// Copies a file or directory tree to `dst`, which must not exist.
pub fn copy_any(src: &Path, dst: &Path) -> Result<(), OperationError> {
    log::info!("COPY | {} -> {}", src.display(), dst.display());
    ensure_free(dst)?;
    let meta = fs::symlink_metadata(src).map_err(|e| OperationError::io(src, e))?;
    if meta.is_dir() {
        ensure_not_inside(src, dst)?;
        copy_tree(src, dst)
    } else if meta.file_type().is_symlink() {
        copy_symlink(src, dst)
    } else {
        copy_file_preserving(src, dst)
    }
}

/// Moves `src` to `dst`, which must not exist.
///
/// Tries an instant rename first and falls back to copy + delete when the rename fails
/// (typically because the paths are on different filesystems).
pub fn move_any(src: &Path, dst: &Path) -> Result<(), OperationError> {
    log::info!("MOVE | {} -> {}", src.display(), dst.display());
    ensure_free(dst)?;
    fs::symlink_metadata(src).map_err(|e| OperationError::io(src, e))?;

    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::debug!("move_any: rename failed ({}), falling back to copy + delete", e);
            copy_any(src, dst)?;
            remove_any(src)
        }
    }
}

/// Creates a new file with `content`. Fails with `AlreadyExists` if anything is at `path`.
pub fn create_file(path: &Path, content: &str) -> Result<(), OperationError> {
    log::info!("CREATE_FILE | {}", path.display());
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| OperationError::io(path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| OperationError::io(path, e))
}

/// Creates one directory (parent must exist). Fails with `AlreadyExists` on collision.
pub fn create_folder(path: &Path) -> Result<(), OperationError> {
    log::info!("MKDIR | {}", path.display());
    fs::create_dir(path).map_err(|e| OperationError::io(path, e))
}

// ============================================================================
// Crate-internal helpers (also used by merge)
// ============================================================================

/// Copies one regular file and carries over permissions and timestamps.
pub(crate) fn copy_file_preserving(src: &Path, dst: &Path) -> Result<(), OperationError> {
    // fs::copy already copies permission bits
    fs::copy(src, dst).map_err(|e| OperationError::io(src, e))?;
    copy_timestamps(src, dst);
    Ok(())
}

/// Recreates a symlink at `dst` pointing where `src` points.
#[cfg(unix)]
pub(crate) fn copy_symlink(src: &Path, dst: &Path) -> Result<(), OperationError> {
    let target = fs::read_link(src).map_err(|e| OperationError::io(src, e))?;
    std::os::unix::fs::symlink(&target, dst).map_err(|e| OperationError::io(dst, e))
}

/// Symlink creation needs privileges on Windows, so copy what the link points at.
#[cfg(not(unix))]
pub(crate) fn copy_symlink(src: &Path, dst: &Path) -> Result<(), OperationError> {
    copy_file_preserving(src, dst)
}

/// Best effort: a copy with fresh timestamps is still a valid copy.
fn copy_timestamps(src: &Path, dst: &Path) {
    let metadata = match fs::metadata(src) {
        Ok(m) => m,
        Err(e) => {
            log::debug!("copy_timestamps: can't read {}: {}", src.display(), e);
            return;
        }
    };
    let mtime = filetime::FileTime::from_last_modification_time(&metadata);
    let atime = filetime::FileTime::from_last_access_time(&metadata);
    if let Err(e) = filetime::set_file_times(dst, atime, mtime) {
        log::warn!("copy_timestamps: failed to set times on {}: {}", dst.display(), e);
    }
}

/// Copies a whole tree into the fresh directory `dst`. Symlinks are recreated, never followed.
fn copy_tree(src: &Path, dst: &Path) -> Result<(), OperationError> {
    let mut created_dirs: Vec<(PathBuf, PathBuf)> = Vec::new();

    // Pre-order: every directory is yielded before its children
    for entry_result in WalkDir::new(src) {
        let entry = entry_result.map_err(|e| walk_error(src, e))?;
        let from = entry.path();
        let relative = from.strip_prefix(src).map_err(|_| {
            OperationError::invalid_argument(from, "walked outside the copy source")
        })?;
        let to = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir(&to).map_err(|e| OperationError::io(&to, e))?;
            created_dirs.push((from.to_path_buf(), to));
        } else if file_type.is_symlink() {
            copy_symlink(from, &to)?;
        } else {
            copy_file_preserving(from, &to)?;
        }
    }

    // Directory mtimes change as children land, so stamp them last
    for (from_dir, to_dir) in created_dirs.iter().rev() {
        copy_timestamps(from_dir, to_dir);
    }
    Ok(())
}

fn walk_error(src: &Path, err: walkdir::Error) -> OperationError {
    let path = err.path().unwrap_or(src).to_path_buf();
    let message = err.to_string();
    match err.into_io_error() {
        Some(io_err) => OperationError::io(&path, io_err),
        None => OperationError::Io {
            path: path.display().to_string(),
            message,
        },
    }
}

/// Copying a directory into its own subtree would never terminate.
pub(crate) fn ensure_not_inside(src: &Path, dst: &Path) -> Result<(), OperationError> {
    if resolve_lenient(dst).starts_with(resolve_lenient(src)) {
        return Err(OperationError::invalid_argument(
            dst,
            format!("can't copy \"{}\" into itself", src.display()),
        ));
    }
    Ok(())
}

/// Absolute, symlink-resolved form of `path`, even when its tail doesn't exist yet: the deepest
/// existing ancestor is canonicalized and the missing components are appended as written.
pub(crate) fn resolve_lenient(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    for ancestor in absolute.ancestors() {
        if let Ok(resolved) = fs::canonicalize(ancestor) {
            return match absolute.strip_prefix(ancestor) {
                Ok(rest) if !rest.as_os_str().is_empty() => resolved.join(rest),
                _ => resolved,
            };
        }
    }
    absolute
}

fn ensure_free(dst: &Path) -> Result<(), OperationError> {
    if fs::symlink_metadata(dst).is_ok() {
        return Err(OperationError::AlreadyExists {
            path: dst.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_file_writes_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.txt");
        create_file(&path, "hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn create_file_refuses_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken.txt");
        fs::write(&path, "original").unwrap();

        let result = create_file(&path, "new");
        assert!(matches!(result, Err(OperationError::AlreadyExists { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn create_file_refuses_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("thing")).unwrap();
        let result = create_file(&dir.path().join("thing"), "");
        assert!(matches!(result, Err(OperationError::AlreadyExists { .. })));
    }

    #[test]
    fn create_folder_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        create_folder(&dir.path().join("NewFolder")).unwrap();
        let result = create_folder(&dir.path().join("NewFolder"));
        assert!(matches!(result, Err(OperationError::AlreadyExists { .. })));
    }

    #[test]
    fn copy_any_copies_file_with_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, "content").unwrap();
        let pinned = filetime::FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src, pinned).unwrap();

        let dst = dir.path().join("b.txt");
        copy_any(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(&dst).unwrap(), "content");
        let meta = fs::metadata(&dst).unwrap();
        assert_eq!(filetime::FileTime::from_last_modification_time(&meta), pinned);
    }

    #[test]
    fn copy_any_copies_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("sub/deep")).unwrap();
        fs::write(src.join("top.txt"), "top").unwrap();
        fs::write(src.join("sub/deep/leaf.txt"), "leaf").unwrap();

        let dst = dir.path().join("dst");
        copy_any(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("top.txt")).unwrap(), "top");
        assert_eq!(fs::read_to_string(dst.join("sub/deep/leaf.txt")).unwrap(), "leaf");
        assert!(src.join("top.txt").exists(), "source must be untouched");
    }

    #[test]
    fn copy_any_refuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();

        let result = copy_any(&dir.path().join("a.txt"), &dir.path().join("b.txt"));
        assert!(matches!(result, Err(OperationError::AlreadyExists { .. })));
        assert_eq!(fs::read_to_string(dir.path().join("b.txt")).unwrap(), "b");
    }

    #[test]
    fn copy_any_refuses_copy_into_itself() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();

        let result = copy_any(&dir.path().join("src"), &dir.path().join("src/inner"));
        assert!(matches!(result, Err(OperationError::InvalidArgument { .. })));
        assert!(!dir.path().join("src/inner").exists());
    }

    #[test]
    fn move_any_renames() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("folder")).unwrap();
        fs::write(dir.path().join("folder/x.txt"), "x").unwrap();

        move_any(&dir.path().join("folder"), &dir.path().join("moved")).unwrap();

        assert!(!dir.path().join("folder").exists());
        assert_eq!(fs::read_to_string(dir.path().join("moved/x.txt")).unwrap(), "x");
    }

    #[test]
    fn move_any_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = move_any(&dir.path().join("ghost"), &dir.path().join("dst"));
        assert!(matches!(result, Err(OperationError::Io { .. })));
    }

    #[test]
    fn remove_any_handles_files_and_trees() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("f.txt"), "x").unwrap();
        fs::create_dir_all(dir.path().join("d/e")).unwrap();
        fs::write(dir.path().join("d/e/g.txt"), "x").unwrap();

        remove_any(&dir.path().join("f.txt")).unwrap();
        remove_any(&dir.path().join("d")).unwrap();

        assert!(!dir.path().join("f.txt").exists());
        assert!(!dir.path().join("d").exists());
    }

    #[test]
    #[cfg(unix)]
    fn remove_any_does_not_follow_symlinked_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), "x").unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("link")).unwrap();

        remove_any(&dir.path().join("link")).unwrap();

        assert!(target.join("keep.txt").exists());
    }

    #[test]
    #[cfg(unix)]
    fn copy_into_itself_is_caught_through_a_symlinked_path() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, dir.path().join("alias")).unwrap();

        // Neither "alias/new" nor "alias/new/deeper" exists yet
        let target = dir.path().join("alias").join("new").join("deeper");
        assert!(matches!(
            ensure_not_inside(&real, &target),
            Err(OperationError::InvalidArgument { .. })
        ));
        assert!(ensure_not_inside(&real, &dir.path().join("elsewhere/new")).is_ok());
    }

    #[test]
    fn resolve_lenient_keeps_missing_tail() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_lenient(&dir.path().join("a/b"));
        assert_eq!(resolved, fs::canonicalize(dir.path()).unwrap().join("a/b"));
    }

    #[test]
    #[cfg(unix)]
    fn copy_tree_recreates_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("sub/file.txt"), "x").unwrap();
        std::os::unix::fs::symlink("sub/file.txt", src.join("link")).unwrap();

        copy_any(&src, &dir.path().join("dst")).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("dst/sub/file.txt")).unwrap(), "x");
        let link = dir.path().join("dst/link");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), Path::new("sub/file.txt"));
    }
}
