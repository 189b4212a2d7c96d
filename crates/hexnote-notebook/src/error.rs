//! Error types for notebook storage.

use std::io;

use hexnote_anno::AnnoError;
use hexnote_interp::InterpError;
use hexnote_types::TypeError;

/// Errors that can occur while reading or writing notebooks.
#[derive(Debug, thiserror::Error)]
pub enum NotebookError {
    /// The underlying source or sink failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The document is not well-formed JSON or does not match the schema.
    #[error("malformed notebook: {0}")]
    Json(#[from] serde_json::Error),

    /// A persisted interpreter could not be rebuilt.
    #[error("interpreter error: {0}")]
    Interp(#[from] InterpError),

    #[error("annotation error: {0}")]
    Anno(#[from] AnnoError),

    /// A persisted range is invalid.
    #[error("invalid range: {0}")]
    Type(#[from] TypeError),

    /// The document parsed but describes an impossible tree.
    #[error("invalid notebook document: {0}")]
    InvalidDocument(String),

    #[error("unsupported notebook version {0}")]
    UnsupportedVersion(u32),
}

/// Convenience alias for notebook results.
pub type NotebookResult<T> = Result<T, NotebookError>;
