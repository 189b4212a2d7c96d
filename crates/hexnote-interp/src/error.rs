//! Error types for interpreter operations.

use hexnote_types::TypeError;

/// Errors that can occur while creating or running interpreters.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InterpError {
    /// Reading the underlying binary failed, typically past end-of-data.
    #[error("binary read failed: {0}")]
    Read(#[from] TypeError),

    /// A fixed-width interpreter was applied to a range of the wrong size.
    #[error("{type_name} reads {expected} bytes but the range covers {actual}")]
    LengthMismatch {
        type_name: String,
        expected: u64,
        actual: u64,
    },

    /// No interpreter with this type name is registered.
    #[error("unknown interpreter type: {0}")]
    UnknownInterpreter(String),

    /// An interpreter with this type name is already registered.
    #[error("interpreter type already registered: {0}")]
    DuplicateInterpreter(String),

    /// The option key is not declared by the interpreter.
    #[error("interpreter {type_name} has no option {key:?}")]
    UnknownOption { type_name: String, key: String },

    /// The option value has the wrong type or an unsupported value.
    #[error("invalid value for option {key:?}: {reason}")]
    InvalidOption { key: String, reason: String },
}

/// Convenience alias for interpreter results.
pub type InterpResult<T> = Result<T, InterpError>;
