//! Write operations: keep-both merge copy and clipboard paste.
//!
//! All operations are synchronous and run on the caller's thread. Nothing here overwrites:
//! collisions are resolved by the uniquifier, and there is no rollback if a later step fails.

mod clipboard;
mod merge;
mod types;

pub use clipboard::{Clipboard, paste_into, paste_into_with_config};
pub use merge::{merge_into, merge_into_with_config};
pub use types::OperationError;
