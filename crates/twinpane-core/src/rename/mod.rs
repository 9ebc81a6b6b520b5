//! Batch rename: build a checked plan, then apply it.
//!
//! [`build_plan`] touches nothing on disk beyond reading metadata. The caller applies a plan only
//! after it came back cleanly; [`apply_plan`] has no rollback.

mod executor;
mod planner;

pub use executor::{RenameFailure, RenameReport, apply_plan};
pub use planner::{RenameMode, RenamePlanItem, build_plan, expand_template};
