//! Typed error definitions for reorganize.
//! Structural failures abort the run; per-item failures are recorded by the reporter instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReorgError {
    #[error("{role} directory does not exist: {path}")]
    PathNotFound { role: &'static str, path: PathBuf },

    #[error("{role} is not a directory (or a symlink to one): {path}")]
    NotADirectory { role: &'static str, path: PathBuf },

    #[error("Permission denied on {path}: {context}")]
    PermissionDenied { path: PathBuf, context: String },

    #[error(
        "Not enough free space on {target}: need {required} bytes, have {available} bytes; aborted at operator request"
    )]
    SpaceDeclined {
        required: u64,
        available: u64,
        target: PathBuf,
    },

    #[error("Transfer failed {src} -> {dest}: {reason}")]
    Transfer {
        src: PathBuf,
        dest: PathBuf,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl ReorgError {
    /// Stable numeric code, emitted as a structured log field.
    pub fn code(&self) -> u16 {
        match self {
            ReorgError::PathNotFound { .. } => 10,
            ReorgError::NotADirectory { .. } => 11,
            ReorgError::PermissionDenied { .. } => 20,
            ReorgError::SpaceDeclined { .. } => 30,
            ReorgError::Transfer { .. } => 40,
            ReorgError::InvalidConfig(_) => 50,
            ReorgError::Interrupted => 130,
        }
    }

    /// Short machine-friendly name for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            ReorgError::PathNotFound { .. } => "path_not_found",
            ReorgError::NotADirectory { .. } => "not_a_directory",
            ReorgError::PermissionDenied { .. } => "permission_denied",
            ReorgError::SpaceDeclined { .. } => "space_declined",
            ReorgError::Transfer { .. } => "transfer_error",
            ReorgError::InvalidConfig(_) => "invalid_config",
            ReorgError::Interrupted => "interrupted",
        }
    }
}
