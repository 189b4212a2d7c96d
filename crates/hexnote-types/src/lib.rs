//! Foundation types for hexnote.
//!
//! This crate holds the small value types every other hexnote crate builds
//! on: the half-open byte [`Range`] an annotation covers, the [`Binary`]
//! trait through which annotated bytes are read, and the [`ParametricStyle`]
//! used to decorate annotations.
//!
//! # Key Types
//!
//! - [`Range`] — Half-open `[position, position + length)` span, never empty
//! - [`Binary`] — Random-access byte source consumed by interpreters
//! - [`ByteBinary`] — In-memory [`Binary`] backed by [`bytes::Bytes`]
//! - [`Color`] / [`StrokeStyle`] / [`ParametricStyle`] — Custom annotation styling

pub mod binary;
pub mod error;
pub mod range;
pub mod style;

pub use binary::{Binary, ByteBinary};
pub use error::TypeError;
pub use range::Range;
pub use style::{Color, ParametricStyle, StrokeStyle};
