//! The annotation entity.

use std::fmt;
use std::sync::Arc;

use hexnote_interp::{InterpResult, Interpreter, InterpreterDescriptor, Value};
use hexnote_types::{Binary, Range};

use crate::attributes::Attributes;

/// Identity of an annotation inside one collection.
///
/// Ids are issued by the collection when an annotation is added and are
/// never reused by that collection.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationId(u64);

impl AnnotationId {
    /// The root group of every collection.
    pub const ROOT: AnnotationId = AnnotationId(0);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }
}

impl fmt::Debug for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnnotationId({})", self.0)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an annotation carries besides its range and attributes.
#[derive(Clone, Debug)]
pub enum AnnotationKind {
    /// Decodes its bytes with exactly one interpreter; never has children.
    Leaf(Arc<dyn Interpreter>),
    /// Owns child annotations; has no interpreted value.
    Group,
}

/// A typed label over a byte range.
///
/// A freshly built annotation is detached. Adding it to a collection moves
/// it into the tree and hands back its [`AnnotationId`].
#[derive(Clone, Debug)]
pub struct Annotation {
    range: Range,
    kind: AnnotationKind,
    attributes: Attributes,
}

impl Annotation {
    /// A leaf interpreted by `interpreter`.
    pub fn leaf(range: Range, interpreter: Arc<dyn Interpreter>) -> Self {
        Self {
            range,
            kind: AnnotationKind::Leaf(interpreter),
            attributes: Attributes::new(),
        }
    }

    /// An empty group.
    pub fn group(range: Range) -> Self {
        Self {
            range,
            kind: AnnotationKind::Group,
            attributes: Attributes::new(),
        }
    }

    /// Builder-style note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.attributes.set_note(note);
        self
    }

    /// Builder-style attributes.
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn kind(&self) -> &AnnotationKind {
        &self.kind
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, AnnotationKind::Group)
    }

    pub fn is_leaf(&self) -> bool {
        !self.is_group()
    }

    /// The leaf's interpreter; `None` for groups.
    pub fn interpreter(&self) -> Option<&Arc<dyn Interpreter>> {
        match &self.kind {
            AnnotationKind::Leaf(interpreter) => Some(interpreter),
            AnnotationKind::Group => None,
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn note(&self) -> Option<&str> {
        self.attributes.note()
    }

    /// Decode this annotation's bytes. Groups have no value and yield `None`.
    pub fn interpret(&self, binary: &dyn Binary) -> Option<InterpResult<Value>> {
        self.interpreter()
            .map(|interpreter| interpreter.interpret(binary, self.range))
    }

    pub(crate) fn replace_interpreter(&mut self, interpreter: Arc<dyn Interpreter>) -> bool {
        match &mut self.kind {
            AnnotationKind::Leaf(current) => {
                *current = interpreter;
                true
            }
            AnnotationKind::Group => false,
        }
    }

    /// Compare range, kind, interpreter identity and attributes. Children
    /// are not considered.
    pub fn same_as(&self, other: &Annotation) -> bool {
        self.range == other.range
            && self.descriptor() == other.descriptor()
            && self.is_group() == other.is_group()
            && self.attributes == other.attributes
    }

    fn descriptor(&self) -> Option<InterpreterDescriptor> {
        self.interpreter().map(|interpreter| interpreter.descriptor())
    }
}
