//! Error type shared by merge, paste, primitives, and the rename planner.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::file_system::validation::ValidationError;

// ============================================================================
// Error enum
// ============================================================================

/// Errors surfaced by mutating operations and by plan validation.
///
/// Validation, Conflict and InvalidArgument are raised before any filesystem mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationError {
    /// Malformed rename parameters (empty field, bad regex, missing placeholder, bad name)
    Validation { message: String },
    /// A plan or probe can't produce a collision-free destination
    Conflict { path: String, message: String },
    /// Precondition failed, for example a merge source that isn't a directory
    InvalidArgument { path: String, message: String },
    /// Direct creation collided with an existing path
    AlreadyExists { path: String },
    /// The path is marked locked in the lock store
    Locked { path: String },
    /// Permission denied
    PermissionDenied { path: String, message: String },
    /// Generic I/O error
    Io { path: String, message: String },
}

impl OperationError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        OperationError::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn conflict(path: &Path, message: impl Into<String>) -> Self {
        OperationError::Conflict {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(path: &Path, message: impl Into<String>) -> Self {
        OperationError::InvalidArgument {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it happened on.
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        let path = path.display().to_string();
        match err.kind() {
            std::io::ErrorKind::AlreadyExists => OperationError::AlreadyExists { path },
            std::io::ErrorKind::PermissionDenied => OperationError::PermissionDenied {
                path,
                message: err.to_string(),
            },
            _ => OperationError::Io {
                path,
                message: err.to_string(),
            },
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            OperationError::Validation { message } => message.clone(),
            OperationError::Conflict { message, .. } => format!("Conflict: {}", message),
            OperationError::InvalidArgument { path, message } => format!("\"{}\": {}", path, message),
            OperationError::AlreadyExists { path } => {
                let filename = Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default();
                format!("\"{}\" already exists.", filename)
            }
            OperationError::Locked { path } => {
                format!("\"{}\" is locked. Unlock it before moving.", path)
            }
            OperationError::PermissionDenied { path, .. } => {
                format!("Cannot access \"{}\": permission denied.", path)
            }
            OperationError::Io { path, message } => {
                if path.is_empty() {
                    format!("An error occurred: {}", message)
                } else {
                    format!("Error with \"{}\": {}", path, message)
                }
            }
        }
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { message } => write!(f, "validation failed: {}", message),
            Self::Conflict { path, message } => write!(f, "conflict at {}: {}", path, message),
            Self::InvalidArgument { path, message } => write!(f, "invalid argument {}: {}", path, message),
            Self::AlreadyExists { path } => write!(f, "already exists: {}", path),
            Self::Locked { path } => write!(f, "locked: {}", path),
            Self::PermissionDenied { path, message } => write!(f, "permission denied on {}: {}", path, message),
            Self::Io { path, message } => write!(f, "I/O error on {}: {}", path, message),
        }
    }
}

impl std::error::Error for OperationError {}

impl From<std::io::Error> for OperationError {
    fn from(err: std::io::Error) -> Self {
        OperationError::io(Path::new(""), err)
    }
}

impl From<ValidationError> for OperationError {
    fn from(err: ValidationError) -> Self {
        OperationError::Validation {
            message: err.to_string(),
        }
    }
}
