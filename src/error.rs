//! Error types for taskboard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown task or developer, duplicate or exhausted id)
//! - 4: Operation failed (file I/O, malformed board document)
//!
//! Lookups inside [`crate::board::Board`] report absence through `Option` and
//! `bool`; these variants are what the session and CLI layers turn that into.

use std::path::PathBuf;
use thiserror::Error;

use crate::developer::DeveloperId;
use crate::task::TaskId;

/// Exit codes for the tb CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskboard operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Developer not found: {0}")]
    DeveloperNotFound(DeveloperId),

    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: i64 },

    #[error("{kind} id {id} is out of range (no {kind} ids left)")]
    IdOutOfRange { kind: &'static str, id: i64 },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Malformed board document {path}: {reason}")]
    MalformedDocument { path: PathBuf, reason: String },
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_)
            | Error::InvalidConfig(_)
            | Error::TaskNotFound(_)
            | Error::DeveloperNotFound(_)
            | Error::DuplicateId { .. }
            | Error::IdOutOfRange { .. } => exit_codes::USER_ERROR,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::MalformedDocument { .. } => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::InvalidArgument(message) | Error::InvalidConfig(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            Error::TaskNotFound(id) => Some(serde_json::json!({ "task_id": id.get() })),
            Error::DeveloperNotFound(id) => {
                Some(serde_json::json!({ "developer_id": id.get() }))
            }
            Error::DuplicateId { kind, id } | Error::IdOutOfRange { kind, id } => {
                Some(serde_json::json!({ "kind": kind, "id": id }))
            }
            Error::MalformedDocument { path, reason } => Some(serde_json::json!({
                "path": path.to_string_lossy(),
                "reason": reason,
            })),
            _ => None,
        }
    }
}

/// Result type alias for taskboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
