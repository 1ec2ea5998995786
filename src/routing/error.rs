//! Error definitions for declaration, generation and snapshot restore.

use thiserror::Error;

/// Errors raised by the recognition engine.
///
/// Recognition misses are not errors; `Recognizer::recognize` returns `None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// No route was registered under this name.
    #[error("There is no route named {0}")]
    UnknownRoute(String),

    /// A required dynamic or glob parameter was not supplied.
    #[error("You must provide param `{0}` to `generate`.")]
    MissingParam(String),

    /// A required dynamic or glob parameter was supplied but empty.
    #[error("You must provide a param `{0}`.")]
    EmptyParam(String),

    /// A nested declaration block finished without binding any handler.
    #[error("Nested declaration under `{pattern}` did not bind a handler")]
    EmptyNestedBlock { pattern: String },
}

/// Result type for engine operations.
pub type RouterResult<T> = Result<T, RouterError>;

/// Errors that can occur while exporting or restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Reading or writing the snapshot file failed.
    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot is not valid JSON for the expected shape.
    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot parsed but its node table is inconsistent.
    #[error("Invalid snapshot: {0}")]
    Invalid(String),
}
