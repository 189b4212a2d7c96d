use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// A read touched bytes past the end of the binary.
    #[error("read out of range: position {position} is beyond binary length {length}")]
    OutOfRange { position: u64, length: u64 },

    #[error("empty range at position {position}")]
    EmptyRange { position: u64 },

    #[error("range overflows u64: position {position}, length {length}")]
    RangeOverflow { position: u64, length: u64 },

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid color: {0}")]
    InvalidColor(String),
}
