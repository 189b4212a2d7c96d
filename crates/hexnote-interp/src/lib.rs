//! Interpreters for hexnote.
//!
//! An interpreter decodes the bytes under a leaf annotation into a typed
//! [`Value`]. Interpreters are described by an [`InterpreterInfo`], which
//! carries a stable type name, a human-readable name, the configuration
//! options the interpreter accepts, and a factory that builds an
//! interpreter from concrete option values. The [`InterpreterRegistry`]
//! collects the available infos and is handed explicitly to whatever needs
//! to resolve persisted interpreters.
//!
//! # Built-in families
//!
//! - [`primitives`] — signed/unsigned 8/16/32/64-bit integers, big and little endian
//! - [`strings`] — fixed-length strings in a named text encoding
//! - [`nulls`] — opaque bytes, returned as-is

pub mod error;
pub mod interpreter;
pub mod nulls;
pub mod options;
pub mod primitives;
pub mod registry;
pub mod strings;
pub mod value;

pub use error::{InterpError, InterpResult};
pub use interpreter::{Interpreter, InterpreterDescriptor, InterpreterInfo};
pub use nulls::NullInterpreter;
pub use options::{OptionSpec, OptionType, OptionValue, OptionValues};
pub use primitives::{ByteOrder, IntWidth, PrimitiveInterpreter};
pub use registry::InterpreterRegistry;
pub use strings::{Charset, StringInterpreter};
pub use value::Value;
