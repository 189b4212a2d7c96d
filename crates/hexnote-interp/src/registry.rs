//! The interpreter registry.
//!
//! [`InterpreterRegistry`] is an ordinary value: callers construct one and
//! pass it to whatever needs to list or resolve interpreters. There is no
//! process-wide registry.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{InterpError, InterpResult};
use crate::interpreter::{Interpreter, InterpreterInfo};
use crate::nulls::NullInfo;
use crate::options::OptionValues;
use crate::primitives::PrimitiveInfo;
use crate::strings::StringInfo;

/// The set of interpreter types available to an application.
#[derive(Default)]
pub struct InterpreterRegistry {
    infos: Vec<Box<dyn InterpreterInfo>>,
}

impl fmt::Debug for InterpreterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpreterRegistry")
            .field("types", &self.infos.iter().map(|i| i.type_name()).collect::<Vec<_>>())
            .finish()
    }
}

impl InterpreterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in interpreter: integers, strings and
    /// the null interpreter.
    pub fn with_defaults() -> Self {
        let mut infos: Vec<Box<dyn InterpreterInfo>> = PrimitiveInfo::all()
            .into_iter()
            .map(|info| Box::new(info) as Box<dyn InterpreterInfo>)
            .collect();
        infos.push(Box::new(StringInfo::new()));
        infos.push(Box::new(NullInfo));
        Self { infos }
    }

    /// Add an interpreter type. Type names must be unique.
    pub fn register(&mut self, info: Box<dyn InterpreterInfo>) -> InterpResult<()> {
        if self.find(info.type_name()).is_some() {
            return Err(InterpError::DuplicateInterpreter(info.type_name().to_string()));
        }
        debug!(type_name = info.type_name(), "registered interpreter");
        self.infos.push(info);
        Ok(())
    }

    /// All registered interpreter types, in registration order.
    pub fn list_available(&self) -> impl Iterator<Item = &dyn InterpreterInfo> {
        self.infos.iter().map(|info| info.as_ref())
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Look up an interpreter type by name.
    pub fn find(&self, type_name: &str) -> Option<&dyn InterpreterInfo> {
        self.list_available().find(|info| info.type_name() == type_name)
    }

    /// Build an interpreter from a persisted type name and options.
    pub fn create(
        &self,
        type_name: &str,
        options: &OptionValues,
    ) -> InterpResult<Arc<dyn Interpreter>> {
        self.find(type_name)
            .ok_or_else(|| InterpError::UnknownInterpreter(type_name.to_string()))?
            .create(options)
    }
}
