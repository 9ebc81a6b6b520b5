//! Applies a rename plan item by item.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use super::planner::RenamePlanItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameFailure {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub message: String,
}

/// Outcome of [`apply_plan`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameReport {
    /// Destinations that now exist
    pub renamed: Vec<PathBuf>,
    /// Items that were already named as planned
    pub skipped: usize,
    pub failures: Vec<RenameFailure>,
}

impl RenameReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Renames every item independently with `fs::rename`.
///
/// A failed item is recorded and the rest still run. Earlier renames are not undone.
pub fn apply_plan(plan: &[RenamePlanItem]) -> RenameReport {
    let mut report = RenameReport::default();
    for item in plan {
        if item.is_noop() {
            report.skipped += 1;
            continue;
        }
        match fs::rename(&item.source, &item.destination) {
            Ok(()) => {
                log::info!("RENAME | {} -> {}", item.source.display(), item.destination.display());
                report.renamed.push(item.destination.clone());
            }
            Err(e) => {
                log::warn!(
                    "RENAME | failed {} -> {}: {}",
                    item.source.display(),
                    item.destination.display(),
                    e
                );
                report.failures.push(RenameFailure {
                    source: item.source.clone(),
                    destination: item.destination.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
    report
}
