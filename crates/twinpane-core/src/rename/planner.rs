//! Batch rename planning: expands a naming rule over a path list into a checked plan.
//!
//! Nothing is renamed here. A plan either comes back fully validated (every new name is legal,
//! destinations are pairwise distinct, and none lands on somebody else's file) or not at all.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::file_system::validation::{MAX_NAME_BYTES, validate_filename};
use crate::write_operations::OperationError;

/// Marker a template must contain to be accepted.
const TEMPLATE_MARKER: &str = "{n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameMode {
    /// Affix before the stem
    Prefix,
    /// Affix after the stem, before the extension
    Suffix,
    /// Literal substring replacement in the stem
    Replace,
    /// Regex substitution in the stem, with `$1` / `${name}` back-references
    Regex,
    /// Whole stem from a counter template such as `file_{n:03}`
    Template,
}

impl RenameMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RenameMode::Prefix => "prefix",
            RenameMode::Suffix => "suffix",
            RenameMode::Replace => "replace",
            RenameMode::Regex => "regex",
            RenameMode::Template => "template",
        }
    }
}

impl fmt::Display for RenameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenameMode {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "prefix" => Ok(RenameMode::Prefix),
            "suffix" => Ok(RenameMode::Suffix),
            "replace" => Ok(RenameMode::Replace),
            "regex" => Ok(RenameMode::Regex),
            "template" => Ok(RenameMode::Template),
            other => Err(OperationError::validation(format!("Unknown rename mode \"{}\"", other))),
        }
    }
}

/// One planned rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamePlanItem {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl RenamePlanItem {
    /// True if applying this item would leave the path as it is.
    pub fn is_noop(&self) -> bool {
        self.source == self.destination
    }
}

/// The checked form of the user's parameters, built once before any path is looked at.
enum Rule<'a> {
    Prefix(&'a str),
    Suffix(&'a str),
    Replace { find: &'a str, with: &'a str },
    Regex { pattern: Regex, with: &'a str },
    Template(&'a str),
}

impl<'a> Rule<'a> {
    fn parse(mode: RenameMode, a: &'a str, b: &'a str, template: &'a str) -> Result<Self, OperationError> {
        match mode {
            RenameMode::Prefix | RenameMode::Suffix => {
                let affix = if b.is_empty() { a } else { b };
                if affix.is_empty() {
                    return Err(OperationError::validation(format!(
                        "{} mode needs an affix in field B (or A)",
                        mode
                    )));
                }
                Ok(if mode == RenameMode::Prefix {
                    Rule::Prefix(affix)
                } else {
                    Rule::Suffix(affix)
                })
            }
            RenameMode::Replace => {
                if a.is_empty() {
                    return Err(OperationError::validation("replace mode needs the text to find in field A"));
                }
                Ok(Rule::Replace { find: a, with: b })
            }
            RenameMode::Regex => {
                if a.is_empty() {
                    return Err(OperationError::validation("regex mode needs a pattern in field A"));
                }
                let pattern = Regex::new(a)
                    .map_err(|e| OperationError::validation(format!("Invalid regular expression: {}", e)))?;
                Ok(Rule::Regex { pattern, with: b })
            }
            RenameMode::Template => {
                let effective = if template.is_empty() { b } else { template };
                if effective.is_empty() {
                    return Err(OperationError::validation("template mode needs a template (or field B)"));
                }
                if !effective.contains(TEMPLATE_MARKER) {
                    return Err(OperationError::validation(
                        "The template must contain a {n} marker, for example file_{n:03}",
                    ));
                }
                if let Some(width) = placeholder_widths(effective).max()
                    && width > MAX_NAME_BYTES
                {
                    return Err(OperationError::validation(format!(
                        "Counter width {} is longer than a file name can be ({} bytes)",
                        width, MAX_NAME_BYTES
                    )));
                }
                Ok(Rule::Template(effective))
            }
        }
    }

    fn new_stem(&self, stem: &str, counter: i64) -> String {
        match self {
            Rule::Prefix(affix) => format!("{}{}", affix, stem),
            Rule::Suffix(affix) => format!("{}{}", stem, affix),
            Rule::Replace { find, with } => stem.replace(find, with),
            Rule::Regex { pattern, with } => pattern.replace_all(stem, *with).into_owned(),
            Rule::Template(template) => expand_template(template, counter),
        }
    }
}

/// Replaces every `{n}`, `{n:W}` or `{n:0W}` in `template` with `counter`, zero-padded to `W`
/// where a width is given. A negative counter keeps its sign in front of the padding (`-07` at
/// width 3). Widths are capped at [`MAX_NAME_BYTES`]. Anything else in braces is left as written.
pub fn expand_template(template: &str, counter: i64) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut rest = template;
    while let Some(at) = rest.find(TEMPLATE_MARKER) {
        out.push_str(&rest[..at]);
        let after = &rest[at + TEMPLATE_MARKER.len()..];
        match parse_placeholder(after) {
            Some((width, consumed)) => {
                match width {
                    Some(width) => {
                        let width = width.min(MAX_NAME_BYTES);
                        out.push_str(&format!("{:0width$}", counter, width = width));
                    }
                    None => out.push_str(&counter.to_string()),
                }
                rest = &after[consumed..];
            }
            None => {
                out.push_str(TEMPLATE_MARKER);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Widths of the `{n:W}` placeholders in `template`, in order.
fn placeholder_widths(template: &str) -> impl Iterator<Item = usize> + '_ {
    template
        .match_indices(TEMPLATE_MARKER)
        .filter_map(|(at, _)| parse_placeholder(&template[at + TEMPLATE_MARKER.len()..]))
        .filter_map(|(width, _)| width)
}

/// Parses what follows `{n`: either `}` or `:digits}`. Returns the width and the bytes consumed.
fn parse_placeholder(after: &str) -> Option<(Option<usize>, usize)> {
    if after.starts_with('}') {
        return Some((None, 1));
    }
    let digits = after.strip_prefix(':')?;
    let len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 || digits.as_bytes().get(len) != Some(&b'}') {
        return None;
    }
    // Too many digits for usize is still a placeholder, just an oversized one
    let width = digits[..len].parse::<usize>().unwrap_or(usize::MAX);
    Some((Some(width), 1 + len + 1))
}

/// Builds a rename plan for `paths`, in input order.
///
/// `a`, `b` and `template` are trimmed first. Parameter problems and illegal generated names fail
/// with `Validation`; duplicate destinations, or a destination that exists and isn't the item's
/// own source, fail with `Conflict`. The counter starts at `start` and moves by `step` per item.
pub fn build_plan(
    paths: &[PathBuf],
    mode: RenameMode,
    a: &str,
    b: &str,
    template: &str,
    start: i64,
    step: i64,
) -> Result<Vec<RenamePlanItem>, OperationError> {
    let rule = Rule::parse(mode, a.trim(), b.trim(), template.trim())?;

    let mut plan = Vec::with_capacity(paths.len());
    let mut counter = start;
    for source in paths {
        let Some(stem) = source.file_stem() else {
            return Err(OperationError::invalid_argument(source, "path has no file name"));
        };
        let stem = stem.to_string_lossy();
        let new_name = match source.extension() {
            Some(ext) => format!("{}.{}", rule.new_stem(&stem, counter), ext.to_string_lossy()),
            None => rule.new_stem(&stem, counter),
        };
        validate_filename(&new_name)?;

        let destination = match source.parent() {
            Some(parent) => parent.join(&new_name),
            None => PathBuf::from(&new_name),
        };
        plan.push(RenamePlanItem {
            source: source.clone(),
            destination,
        });
        counter = counter.wrapping_add(step);
    }

    check_conflicts(&plan)?;
    log::debug!("build_plan: {} items, mode {}", plan.len(), mode);
    Ok(plan)
}

fn check_conflicts(plan: &[RenamePlanItem]) -> Result<(), OperationError> {
    let mut seen: HashSet<&Path> = HashSet::with_capacity(plan.len());
    for item in plan {
        if !seen.insert(&item.destination) {
            return Err(OperationError::conflict(
                &item.destination,
                "Two files in the plan would get the same name. Check the template or parameters.",
            ));
        }
    }

    for item in plan {
        if fs::symlink_metadata(&item.destination).is_ok() && !is_same_file(&item.source, &item.destination) {
            return Err(OperationError::conflict(
                &item.destination,
                format!(
                    "\"{}\" already exists",
                    item.destination.file_name().unwrap_or_default().to_string_lossy()
                ),
            ));
        }
    }
    Ok(())
}

/// Canonical paths first, then device and inode, which also catches case-only renames on
/// case-insensitive volumes.
fn is_same_file(a: &Path, b: &Path) -> bool {
    if let (Ok(a), Ok(b)) = (fs::canonicalize(a), fs::canonicalize(b))
        && a == b
    {
        return true;
    }
    same_inode(a, b)
}

#[cfg(unix)]
fn same_inode(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_inode(_a: &Path, _b: &Path) -> bool {
    false
}
