//! Error types for annotation collections.

use hexnote_interp::InterpError;
use hexnote_types::{Range, TypeError};

use crate::annotation::AnnotationId;

/// Errors that can occur while mutating or querying annotations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AnnoError {
    /// The new range partially overlaps an existing annotation. The tree is
    /// unchanged.
    #[error("annotation {range} overlaps existing annotation {conflict} at {conflict_range}")]
    Overlapping {
        range: Range,
        conflict: AnnotationId,
        conflict_range: Range,
    },

    /// The range does not fit inside the root group.
    #[error("annotation {range} lies outside the binary bounds {bounds}")]
    OutOfBounds { range: Range, bounds: Range },

    /// No annotation with this id is in the collection.
    #[error("annotation not found: {0}")]
    NotFound(AnnotationId),

    /// The root group cannot be removed.
    #[error("the root group cannot be removed")]
    RootImmutable,

    /// The annotation or column does not support this kind of edit.
    #[error("unsupported mutation: {0}")]
    UnsupportedMutation(String),

    /// A range could not be built.
    #[error("invalid range: {0}")]
    InvalidRange(#[from] TypeError),

    /// Interpreting a leaf failed.
    #[error("interpretation failed: {0}")]
    Interp(#[from] InterpError),
}

/// Convenience alias for annotation results.
pub type AnnoResult<T> = Result<T, AnnoError>;
