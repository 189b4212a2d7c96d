//! The [`Interpreter`] and [`InterpreterInfo`] traits.

use std::fmt;
use std::sync::Arc;

use hexnote_types::{Binary, Range};

use crate::error::InterpResult;
use crate::options::{OptionSpec, OptionValues};
use crate::value::Value;

/// A codec that turns a byte range of a [`Binary`] into a [`Value`].
///
/// Interpreters are immutable once created. Their identity is the pair of
/// [`type_name`](Interpreter::type_name) and resolved
/// [`options`](Interpreter::options); feeding those back into the matching
/// [`InterpreterInfo::create`] yields an equivalent interpreter.
pub trait Interpreter: fmt::Debug + Send + Sync {
    /// Stable identifier persisted in notebooks (e.g. `"uint32le"`).
    fn type_name(&self) -> &str;

    /// Human-readable description shown in the type column.
    fn human_name(&self) -> String;

    /// The resolved configuration of this instance.
    fn options(&self) -> OptionValues;

    /// The exact number of bytes this interpreter reads, if fixed.
    fn fixed_length(&self) -> Option<u64> {
        None
    }

    /// Decode the bytes covered by `range`.
    fn interpret(&self, binary: &dyn Binary, range: Range) -> InterpResult<Value>;

    /// Identity used for equality and persistence.
    fn descriptor(&self) -> InterpreterDescriptor {
        InterpreterDescriptor {
            type_name: self.type_name().to_string(),
            options: self.options(),
        }
    }
}

/// Metadata and factory for one interpreter type.
pub trait InterpreterInfo: Send + Sync {
    /// Stable identifier shared with the interpreters this info creates.
    fn type_name(&self) -> &str;

    /// Name shown when offering the interpreter to users.
    fn human_name(&self) -> &str;

    /// Declared options, in display order.
    fn options(&self) -> &[OptionSpec];

    /// Build an interpreter from option values. Omitted options take their
    /// defaults; unknown or mistyped ones are rejected.
    fn create(&self, options: &OptionValues) -> InterpResult<Arc<dyn Interpreter>>;
}

/// The persisted identity of an interpreter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterpreterDescriptor {
    pub type_name: String,
    pub options: OptionValues,
}

impl fmt::Display for InterpreterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name)?;
        if !self.options.is_empty() {
            let rendered: Vec<String> = self
                .options
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, "({})", rendered.join(", "))?;
        }
        Ok(())
    }
}
