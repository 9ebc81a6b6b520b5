// Warn on redundant path prefixes (e.g., std::path::Path when Path is imported)
#![warn(unused_qualifications)]
// Use log::* macros instead of println!/eprintln! for proper log level control
#![deny(clippy::print_stdout, clippy::print_stderr)]

//! Filesystem core of a two-pane file manager.
//!
//! The UI layer only calls into these modules and renders their results:
//! - [`comparison`]: snapshot two trees and diff them (optionally by content hash)
//! - [`write_operations`]: keep-both merge copy and the clipboard paste workflow
//! - [`rename`]: validated batch-rename plans and their application
//! - [`file_system`]: uniquifier, primitives, locks, attributes, search

pub mod comparison;
pub mod config;
pub mod file_system;
pub mod rename;
pub mod write_operations;

pub use comparison::{DiffEntry, DiffResult, FileRecord, IndexError, Snapshot, compare_dirs, index_tree};
pub use config::CoreConfig;
pub use file_system::{PathKind, uniquify};
pub use rename::{RenameMode, RenamePlanItem, apply_plan, build_plan};
pub use write_operations::{Clipboard, OperationError, merge_into, paste_into};
