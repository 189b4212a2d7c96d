//! Column model for tree-table views.
//!
//! A view shows one row per annotation with three columns: the type, the
//! decoded value, and the note. Only the note column is editable.

use std::fmt;

use hexnote_interp::Value;
use hexnote_types::Binary;

use crate::annotation::AnnotationId;
use crate::collection::AnnotationCollection;
use crate::error::{AnnoError, AnnoResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnnotationColumn {
    Type,
    Value,
    Note,
}

impl AnnotationColumn {
    pub const ALL: [AnnotationColumn; 3] = [Self::Type, Self::Value, Self::Note];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Type => "Type",
            Self::Value => "Value",
            Self::Note => "Notes",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Type => 0,
            Self::Value => 1,
            Self::Note => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for AnnotationColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One cell of the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellValue {
    /// `"group"`, or the interpreter's human-readable name.
    Type(String),
    /// The decoded value; `None` for groups.
    Value(Option<Value>),
    Note(Option<String>),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(name) => f.write_str(name),
            Self::Value(Some(value)) => write!(f, "{value}"),
            Self::Note(Some(note)) => f.write_str(note),
            Self::Value(None) | Self::Note(None) => Ok(()),
        }
    }
}

/// Binds a collection to the binary it annotates and exposes it as rows
/// and columns.
#[derive(Debug)]
pub struct AnnotationTable<C, B> {
    annotations: C,
    binary: B,
}

impl<C, B> AnnotationTable<C, B>
where
    C: AnnotationCollection,
    B: Binary,
{
    pub fn new(annotations: C, binary: B) -> Self {
        Self {
            annotations,
            binary,
        }
    }

    pub fn column_count(&self) -> usize {
        AnnotationColumn::ALL.len()
    }

    pub fn column_name(&self, column: AnnotationColumn) -> &'static str {
        column.name()
    }

    pub fn value_at(&self, id: AnnotationId, column: AnnotationColumn) -> AnnoResult<CellValue> {
        let annotation = self.annotations.get(id).ok_or(AnnoError::NotFound(id))?;
        let cell = match column {
            AnnotationColumn::Type => CellValue::Type(match annotation.interpreter() {
                Some(interpreter) => interpreter.human_name(),
                None => "group".to_string(),
            }),
            AnnotationColumn::Value => {
                CellValue::Value(annotation.interpret(&self.binary).transpose()?)
            }
            AnnotationColumn::Note => CellValue::Note(annotation.note().map(str::to_string)),
        };
        Ok(cell)
    }

    pub fn is_editable(&self, column: AnnotationColumn) -> bool {
        column == AnnotationColumn::Note
    }

    /// Edit a cell. Only notes can be edited; an empty string clears the
    /// note.
    pub fn set_value_at(&mut self, id: AnnotationId, column: AnnotationColumn, text: &str) -> AnnoResult<()> {
        if !self.is_editable(column) {
            return Err(AnnoError::UnsupportedMutation(format!(
                "column {column} is read-only"
            )));
        }
        self.annotations.attributes_mut(id)?.set_note(text);
        Ok(())
    }

    pub fn annotations(&self) -> &C {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut C {
        &mut self.annotations
    }

    pub fn binary(&self) -> &B {
        &self.binary
    }
}
