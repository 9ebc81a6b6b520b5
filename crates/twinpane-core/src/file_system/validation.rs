//! Filename checks applied to generated rename targets and newly created entries.

use serde::{Deserialize, Serialize};

/// Maximum file name length in bytes (ext4, APFS, and NTFS all cap a component near this).
pub const MAX_NAME_BYTES: usize = 255;

#[cfg(windows)]
const DISALLOWED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];
#[cfg(not(windows))]
const DISALLOWED_CHARS: &[char] = &['/', '\0'];

/// Why a single path component was rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ValidationError {
    /// Name is empty or whitespace-only.
    Empty,
    /// `.` and `..` can't name a real entry.
    Reserved { name: String },
    /// Name contains a separator or another disallowed character.
    DisallowedCharacter { name: String, character: String },
    /// Name exceeds the per-component byte limit.
    NameTooLong { name: String, bytes: usize, max: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Name can't be empty"),
            Self::Reserved { name } => write!(f, "\"{}\" is not a valid name", name),
            Self::DisallowedCharacter { name, character } => {
                write!(f, "\"{}\" contains a disallowed character: {}", name, character)
            }
            Self::NameTooLong { name, bytes, max } => {
                write!(f, "\"{}\" is {} bytes, which exceeds the {} byte limit", name, bytes, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validates one path component.
pub fn validate_filename(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    if name == "." || name == ".." {
        return Err(ValidationError::Reserved { name: name.to_string() });
    }

    if let Some(ch) = name.chars().find(|c| DISALLOWED_CHARS.contains(c)) {
        let character = if ch == '\0' { "NUL".to_string() } else { ch.to_string() };
        return Err(ValidationError::DisallowedCharacter {
            name: name.to_string(),
            character,
        });
    }

    if name.len() > MAX_NAME_BYTES {
        return Err(ValidationError::NameTooLong {
            name: name.to_string(),
            bytes: name.len(),
            max: MAX_NAME_BYTES,
        });
    }

    Ok(())
}
