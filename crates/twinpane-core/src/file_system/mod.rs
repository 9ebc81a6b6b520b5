//! File system module - uniquifier, primitives, locks, attributes, and search.

pub mod attributes;
pub mod locks;
pub mod primitives;
pub mod search;
pub mod uniquify;
pub mod validation;

// Re-export public types
pub use attributes::{AttributeFailure, AttributeReport, AttributeRequest, apply_attributes};
pub use locks::{JsonLockStore, LockStore, MemoryLockStore};
pub use primitives::{copy_any, create_file, create_folder, move_any, remove_any};
pub use search::{search_paths, search_paths_with_config};
pub use uniquify::{PathKind, try_uniquify, uniquify, uniquify_bounded};
pub use validation::{ValidationError, validate_filename};
