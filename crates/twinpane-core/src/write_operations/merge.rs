//! Keep-both merge copy of one directory tree into another.
//!
//! Same-named directories are unioned. Every other collision gets a fresh ` (N)` name via the
//! uniquifier, so nothing at the destination is ever overwritten, and nothing in the source is
//! touched. Which of two same-named files is newer is deliberately not considered.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::CoreConfig;
use crate::file_system::primitives::{copy_file_preserving, copy_symlink, ensure_not_inside, resolve_lenient};
use crate::file_system::uniquify::{PathKind, uniquify_bounded};

use super::types::OperationError;

/// Merges `source_dir` into `dest_dir` with the default configuration.
pub fn merge_into(source_dir: &Path, dest_dir: &Path) -> Result<(), OperationError> {
    merge_into_with_config(source_dir, dest_dir, &CoreConfig::default())
}

/// Copies every entry of `source_dir` into `dest_dir`, creating `dest_dir` if needed.
///
/// Fails with `InvalidArgument` if the source is missing or not a directory, or if either tree
/// contains the other. A copy failure stops the merge; entries copied before
/// it stay in place.
pub fn merge_into_with_config(source_dir: &Path, dest_dir: &Path, config: &CoreConfig) -> Result<(), OperationError> {
    match fs::metadata(source_dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(OperationError::invalid_argument(source_dir, "merge source is not a directory")),
        Err(_) => return Err(OperationError::invalid_argument(source_dir, "merge source does not exist")),
    }
    ensure_not_inside(source_dir, dest_dir)?;
    // Merging into an ancestor would walk back onto the source and write into it
    if resolve_lenient(source_dir).starts_with(resolve_lenient(dest_dir)) {
        return Err(OperationError::invalid_argument(
            dest_dir,
            format!("can't merge \"{}\" into a folder that contains it", source_dir.display()),
        ));
    }

    log::info!("MERGE_DIR | {} -> {}", source_dir.display(), dest_dir.display());
    fs::create_dir_all(dest_dir).map_err(|e| OperationError::io(dest_dir, e))?;

    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(source_dir.to_path_buf(), dest_dir.to_path_buf())];
    // Directories this merge created, so their timestamps can be copied once filled
    let mut created_dirs: Vec<(PathBuf, PathBuf)> = Vec::new();

    while let Some((from_dir, to_dir)) = pending.pop() {
        let entries = fs::read_dir(&from_dir).map_err(|e| OperationError::io(&from_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| OperationError::io(&from_dir, e))?;
            let from = entry.path();
            let file_type = entry.file_type().map_err(|e| OperationError::io(&from, e))?;
            let target = to_dir.join(entry.file_name());
            let occupant = occupant_kind(&target)?;

            if file_type.is_dir() {
                let dir_target = match occupant {
                    Occupant::Directory => {
                        pending.push((from, target));
                        continue;
                    }
                    Occupant::Other => {
                        let unique = uniquify_bounded(&target, PathKind::Directory, config.max_unique_probe)?;
                        log::info!("DIR_CONFLICT | {} -> {}", from.display(), unique.display());
                        unique
                    }
                    Occupant::Vacant => target,
                };
                fs::create_dir(&dir_target).map_err(|e| OperationError::io(&dir_target, e))?;
                created_dirs.push((from.clone(), dir_target.clone()));
                pending.push((from, dir_target));
            } else {
                let file_target = if occupant == Occupant::Vacant {
                    target
                } else {
                    let unique = uniquify_bounded(&target, PathKind::File, config.max_unique_probe)?;
                    log::info!("FILE_CONFLICT | {} -> {}", from.display(), unique.display());
                    unique
                };
                if file_type.is_symlink() {
                    copy_symlink(&from, &file_target)?;
                } else {
                    copy_file_preserving(&from, &file_target)?;
                }
            }
        }
    }

    for (from_dir, to_dir) in created_dirs.iter().rev() {
        if let Ok(meta) = fs::metadata(from_dir) {
            let mtime = filetime::FileTime::from_last_modification_time(&meta);
            if let Err(e) = filetime::set_file_mtime(to_dir, mtime) {
                log::debug!("merge_into: couldn't set mtime on {}: {}", to_dir.display(), e);
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Occupant {
    Vacant,
    /// A real directory (not a symlink to one)
    Directory,
    Other,
}

fn occupant_kind(path: &Path) -> Result<Occupant, OperationError> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(Occupant::Directory),
        Ok(_) => Ok(Occupant::Other),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Occupant::Vacant),
        Err(e) => Err(OperationError::io(path, e)),
    }
}
