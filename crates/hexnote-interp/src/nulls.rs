//! The opaque interpreter.

use std::sync::Arc;

use hexnote_types::{Binary, Range};

use crate::error::InterpResult;
use crate::interpreter::{Interpreter, InterpreterInfo};
use crate::options::{OptionSpec, OptionValues};
use crate::value::Value;

/// Marks a range as known-but-uninterpreted; yields the raw bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NullInterpreter;

impl NullInterpreter {
    pub const TYPE_NAME: &'static str = "null";
}

impl Interpreter for NullInterpreter {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn human_name(&self) -> String {
        "Unknown".to_string()
    }

    fn options(&self) -> OptionValues {
        OptionValues::new()
    }

    fn interpret(&self, binary: &dyn Binary, range: Range) -> InterpResult<Value> {
        Ok(Value::Bytes(binary.read_range(range)?))
    }
}

/// [`InterpreterInfo`] for [`NullInterpreter`].
#[derive(Debug, Default)]
pub struct NullInfo;

impl InterpreterInfo for NullInfo {
    fn type_name(&self) -> &str {
        NullInterpreter::TYPE_NAME
    }

    fn human_name(&self) -> &str {
        "Unknown"
    }

    fn options(&self) -> &[OptionSpec] {
        &[]
    }

    fn create(&self, options: &OptionValues) -> InterpResult<Arc<dyn Interpreter>> {
        options.resolve(NullInterpreter::TYPE_NAME, &[])?;
        Ok(Arc::new(NullInterpreter))
    }
}
