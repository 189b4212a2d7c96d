//! Structure templates.
//!
//! A structure describes a record layout as a sequence of named fields.
//! Dropping a structure at a position lays its fields out back to back and
//! inserts the result as one group whose leaves carry the field names as
//! notes.
//!
//! Structures are declared in TOML:
//!
//! ```toml
//! [[structure]]
//! name = "entry"
//! fields = [
//!     { kind = "value", name = "id", type = "uint16be" },
//!     { kind = "unknown", name = "flags", length = 2 },
//! ]
//!
//! [[structure]]
//! name = "header"
//! fields = [
//!     { kind = "value", name = "magic", type = "uint32be" },
//!     { kind = "value", name = "title", type = "string", length = 8, options = { charset = "UTF-8" } },
//!     { kind = "array", name = "entries", size = 3, element = "entry", start_index = 1 },
//! ]
//! ```
//!
//! A field or array element whose type names another structure in the same
//! library becomes a nested group; any other type is resolved through the
//! [`InterpreterRegistry`].

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use hexnote_interp::{InterpError, InterpreterRegistry, OptionValues};
use hexnote_types::{Range, TypeError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotation::{Annotation, AnnotationId};
use crate::collection::AnnotationCollection;
use crate::error::AnnoError;

/// Errors raised while loading or dropping structures.
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    #[error("unknown structure: {0}")]
    UnknownStructure(String),

    #[error("structure {0:?} is defined twice")]
    DuplicateStructure(String),

    /// The structure refers to itself, directly or through other structures.
    #[error("structure {0:?} contains itself")]
    Recursive(String),

    /// A structure without fields or an array without elements.
    #[error("{0:?} would be empty")]
    Empty(String),

    /// The field's interpreter has no fixed width and no length was given.
    #[error("field {field:?} needs a length: {type_name} has no fixed width")]
    MissingLength { field: String, type_name: String },

    #[error("field {field:?} is {length} bytes but {type_name} reads exactly {fixed}")]
    LengthMismatch {
        field: String,
        type_name: String,
        length: u64,
        fixed: u64,
    },

    /// Length or options given for a field that names a structure.
    #[error("field {0:?} names a structure and takes no length or options")]
    UnexpectedSettings(String),

    #[error("failed to read structure definitions: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid structure definitions: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Interp(#[from] InterpError),

    #[error(transparent)]
    Range(#[from] TypeError),

    #[error(transparent)]
    Anno(#[from] AnnoError),
}

pub type StructureResult<T> = Result<T, StructureError>;

/// One field of a structure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldDef {
    /// A value decoded by an interpreter, or a nested structure.
    Value {
        name: String,
        #[serde(rename = "type")]
        type_name: String,
        /// Required when the interpreter has no fixed width.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<u64>,
        #[serde(default, skip_serializing_if = "OptionValues::is_empty")]
        options: OptionValues,
    },
    /// Bytes of unknown meaning, annotated with the null interpreter.
    Unknown { name: String, length: u64 },
    /// `size` consecutive elements named `name[start_index]`,
    /// `name[start_index + 1]` and so on.
    Array {
        name: String,
        size: u64,
        element: String,
        #[serde(default)]
        start_index: u64,
    },
}

impl FieldDef {
    pub fn name(&self) -> &str {
        match self {
            Self::Value { name, .. } | Self::Unknown { name, .. } | Self::Array { name, .. } => {
                name
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

/// A laid-out but detached annotation subtree.
#[derive(Clone, Debug)]
pub struct Layout {
    pub annotation: Annotation,
    pub children: Vec<Layout>,
}

impl Layout {
    pub fn range(&self) -> Range {
        self.annotation.range()
    }

    /// Number of annotations in the subtree, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Layout::count).sum::<usize>()
    }
}

/// A named set of structure definitions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureLibrary {
    #[serde(default, rename = "structure")]
    structures: Vec<StructureDef>,
}

impl StructureLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse definitions from TOML text.
    pub fn from_toml(text: &str) -> StructureResult<Self> {
        let parsed: StructureLibrary = toml::from_str(text)?;
        let mut library = Self::new();
        for def in parsed.structures {
            library.insert(def)?;
        }
        Ok(library)
    }

    pub fn load(path: impl AsRef<Path>) -> StructureResult<Self> {
        let path = path.as_ref();
        let library = Self::from_toml(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), structures = library.len(), "loaded structures");
        Ok(library)
    }

    /// Add a definition. Names must be unique within the library.
    pub fn insert(&mut self, def: StructureDef) -> StructureResult<()> {
        if self.get(&def.name).is_some() {
            return Err(StructureError::DuplicateStructure(def.name));
        }
        self.structures.push(def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&StructureDef> {
        self.structures.iter().find(|def| def.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.structures.iter().map(|def| def.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// Lay out structure `name` starting at `position` without touching any
    /// collection. The outer group's note is the structure name.
    pub fn layout(
        &self,
        registry: &InterpreterRegistry,
        name: &str,
        position: u64,
    ) -> StructureResult<Layout> {
        let mut expanding = HashSet::new();
        Layouter {
            library: self,
            registry,
            expanding: &mut expanding,
        }
        .structure(name, name, position)
    }

    /// Lay out structure `name` at `position` and insert it into
    /// `collection`, returning the id of the new group.
    ///
    /// The structure must land in free space: an existing annotation may
    /// only overlap it if that annotation is a group enclosing the whole
    /// structure. On error the collection is left as it was.
    pub fn drop_at<C>(
        &self,
        registry: &InterpreterRegistry,
        collection: &mut C,
        name: &str,
        position: u64,
    ) -> StructureResult<AnnotationId>
    where
        C: AnnotationCollection + ?Sized,
    {
        let layout = self.layout(registry, name, position)?;
        let bounds = collection.root_group().range();
        if !bounds.contains(&layout.range()) {
            return Err(AnnoError::OutOfBounds {
                range: layout.range(),
                bounds,
            }
            .into());
        }
        check_free(collection, layout.range())?;

        let count = layout.count();
        let Layout {
            annotation,
            children,
        } = layout;
        let range = annotation.range();
        let id = collection.add(annotation)?;
        if let Err(err) = insert_children(collection, children) {
            collection.remove(id)?;
            return Err(err.into());
        }
        debug!(structure = name, %id, %range, annotations = count, "dropped structure");
        Ok(id)
    }
}

struct Layouter<'a> {
    library: &'a StructureLibrary,
    registry: &'a InterpreterRegistry,
    expanding: &'a mut HashSet<String>,
}

impl Layouter<'_> {
    fn structure(&mut self, name: &str, label: &str, position: u64) -> StructureResult<Layout> {
        let def = self
            .library
            .get(name)
            .ok_or_else(|| StructureError::UnknownStructure(name.to_string()))?;
        if def.fields.is_empty() {
            return Err(StructureError::Empty(name.to_string()));
        }
        if !self.expanding.insert(name.to_string()) {
            return Err(StructureError::Recursive(name.to_string()));
        }

        let mut children = Vec::with_capacity(def.fields.len());
        let mut cursor = position;
        for field in &def.fields {
            let child = self.field(field, cursor)?;
            cursor = child.range().end();
            children.push(child);
        }
        self.expanding.remove(name);

        let range = Range::new(position, cursor - position)?;
        Ok(Layout {
            annotation: Annotation::group(range).with_note(label),
            children,
        })
    }

    fn field(&mut self, field: &FieldDef, position: u64) -> StructureResult<Layout> {
        match field {
            FieldDef::Value {
                name,
                type_name,
                length,
                options,
            } => self.element(name, type_name, *length, options, position),
            FieldDef::Unknown { name, length } => {
                self.element(name, "null", Some(*length), &OptionValues::new(), position)
            }
            FieldDef::Array {
                name,
                size,
                element,
                start_index,
            } => {
                if *size == 0 {
                    return Err(StructureError::Empty(name.clone()));
                }
                let mut children = Vec::new();
                let mut cursor = position;
                for index in *start_index..start_index.saturating_add(*size) {
                    let label = format!("{name}[{index}]");
                    let child = self.element(&label, element, None, &OptionValues::new(), cursor)?;
                    cursor = child.range().end();
                    children.push(child);
                }
                let range = Range::new(position, cursor - position)?;
                Ok(Layout {
                    annotation: Annotation::group(range).with_note(name.as_str()),
                    children,
                })
            }
        }
    }

    /// A leaf for an interpreter type, or a nested group when `type_name`
    /// names a structure.
    fn element(
        &mut self,
        label: &str,
        type_name: &str,
        length: Option<u64>,
        options: &OptionValues,
        position: u64,
    ) -> StructureResult<Layout> {
        if self.library.get(type_name).is_some() {
            if length.is_some() || !options.is_empty() {
                return Err(StructureError::UnexpectedSettings(label.to_string()));
            }
            return self.structure(type_name, label, position);
        }

        let interpreter = self.registry.create(type_name, options)?;
        let length = match (length, interpreter.fixed_length()) {
            (Some(length), Some(fixed)) if length != fixed => {
                return Err(StructureError::LengthMismatch {
                    field: label.to_string(),
                    type_name: type_name.to_string(),
                    length,
                    fixed,
                })
            }
            (Some(length), _) => length,
            (None, Some(fixed)) => fixed,
            (None, None) => {
                return Err(StructureError::MissingLength {
                    field: label.to_string(),
                    type_name: type_name.to_string(),
                })
            }
        };
        let range = Range::new(position, length)?;
        Ok(Layout {
            annotation: Annotation::leaf(range, interpreter).with_note(label),
            children: Vec::new(),
        })
    }
}

/// Fails unless every annotation touching `range` is a group enclosing it.
fn check_free<C>(collection: &C, range: Range) -> Result<(), AnnoError>
where
    C: AnnotationCollection + ?Sized,
{
    let mut parent = collection.root();
    'descend: loop {
        for &id in collection.children(parent) {
            let Some(existing) = collection.get(id) else {
                continue;
            };
            let existing_range = existing.range();
            if !existing_range.overlaps(&range) {
                continue;
            }
            if existing.is_group() && existing_range.contains(&range) {
                parent = id;
                continue 'descend;
            }
            return Err(AnnoError::Overlapping {
                range,
                conflict: id,
                conflict_range: existing_range,
            });
        }
        return Ok(());
    }
}

fn insert_children<C>(collection: &mut C, children: Vec<Layout>) -> Result<(), AnnoError>
where
    C: AnnotationCollection + ?Sized,
{
    for child in children {
        collection.add(child.annotation)?;
        insert_children(collection, child.children)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::same_structure;
    use crate::memory::MemoryAnnotationCollection;
    use hexnote_interp::NullInterpreter;
    use std::sync::Arc;

    const DEFINITIONS: &str = r#"
        [[structure]]
        name = "entry"
        fields = [
            { kind = "value", name = "id", type = "uint16be" },
            { kind = "unknown", name = "flags", length = 2 },
        ]

        [[structure]]
        name = "header"
        fields = [
            { kind = "value", name = "magic", type = "uint32be" },
            { kind = "value", name = "title", type = "string", length = 8, options = { charset = "UTF-16LE" } },
            { kind = "array", name = "entries", size = 3, element = "entry", start_index = 1 },
            { kind = "array", name = "checksums", size = 2, element = "uint8" },
        ]
    "#;

    fn library() -> StructureLibrary {
        StructureLibrary::from_toml(DEFINITIONS).unwrap()
    }

    fn registry() -> InterpreterRegistry {
        InterpreterRegistry::with_defaults()
    }

    fn range(position: u64, length: u64) -> Range {
        Range::new(position, length).unwrap()
    }

    fn notes<C: AnnotationCollection>(collection: &C, ids: &[AnnotationId]) -> Vec<String> {
        ids.iter()
            .map(|id| collection.get(*id).unwrap().note().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn parses_definitions() {
        let library = library();
        assert_eq!(library.names().collect::<Vec<_>>(), vec!["entry", "header"]);
        let header = library.get("header").unwrap();
        assert_eq!(header.fields.len(), 4);
        assert_eq!(header.fields[2].name(), "entries");
        assert!(matches!(
            &header.fields[3],
            FieldDef::Array { start_index: 0, size: 2, .. }
        ));
    }

    #[test]
    fn array_sizes_follow_element_widths() {
        let layout = library().layout(&registry(), "header", 10).unwrap();
        // magic 4 + title 8 + entries 3 * 4 + checksums 2 * 1
        assert_eq!(layout.range(), range(10, 26));
        assert_eq!(layout.annotation.note(), Some("header"));

        let entries = &layout.children[2];
        assert_eq!(entries.range(), range(22, 12));
        assert_eq!(entries.children.len(), 3);
        assert_eq!(entries.children[0].annotation.note(), Some("entries[1]"));
        assert_eq!(entries.children[2].annotation.note(), Some("entries[3]"));
        assert_eq!(entries.children[1].range(), range(26, 4));
        assert_eq!(entries.children[1].children[1].annotation.note(), Some("flags"));

        let checksums = &layout.children[3];
        assert_eq!(checksums.range(), range(34, 2));
        assert_eq!(checksums.children[0].annotation.note(), Some("checksums[0]"));
        assert_eq!(layout.count(), 1 + 2 + (1 + 3 * 3) + (1 + 2));
    }

    #[test]
    fn drop_inserts_the_whole_tree() {
        let mut collection = MemoryAnnotationCollection::new(64).unwrap();
        let id = library()
            .drop_at(&registry(), &mut collection, "header", 4)
            .unwrap();

        assert_eq!(collection.top_level(), &[id]);
        assert_eq!(collection.len(), 16);
        let fields = collection.children(id);
        assert_eq!(
            notes(&collection, fields),
            vec!["magic", "title", "entries", "checksums"]
        );
        let title = collection.get(fields[1]).unwrap();
        assert_eq!(title.interpreter().unwrap().type_name(), "string");
        assert_eq!(
            title.interpreter().unwrap().options().get("charset").and_then(|v| v.as_text()),
            Some("UTF-16LE")
        );
        assert_eq!(
            collection.path_at(21).map(|path| notes(&collection, &path)),
            Some(vec!["header".into(), "entries".into(), "entries[2]".into(), "id".into()])
        );
    }

    #[test]
    fn drop_nests_inside_an_enclosing_group() {
        let mut collection = MemoryAnnotationCollection::new(64).unwrap();
        let outer = collection.add(Annotation::group(range(0, 40))).unwrap();
        let id = library()
            .drop_at(&registry(), &mut collection, "entry", 8)
            .unwrap();
        assert_eq!(collection.parent(id), Some(outer));
    }

    #[test]
    fn drop_rejects_overlap_and_leaves_tree_untouched() {
        let mut collection = MemoryAnnotationCollection::new(64).unwrap();
        let existing = collection
            .add(Annotation::leaf(range(6, 2), Arc::new(NullInterpreter)))
            .unwrap();
        let before = collection.clone();

        let err = library()
            .drop_at(&registry(), &mut collection, "header", 0)
            .unwrap_err();
        assert!(matches!(
            err,
            StructureError::Anno(AnnoError::Overlapping { conflict, .. }) if conflict == existing
        ));
        assert!(same_structure(&before, &collection));

        // A group inside the drop area would be swallowed rather than nested.
        let mut collection = MemoryAnnotationCollection::new(64).unwrap();
        collection.add(Annotation::group(range(2, 2))).unwrap();
        assert!(matches!(
            library().drop_at(&registry(), &mut collection, "entry", 0),
            Err(StructureError::Anno(AnnoError::Overlapping { .. }))
        ));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn drop_past_the_end_is_out_of_bounds() {
        let mut collection = MemoryAnnotationCollection::new(20).unwrap();
        assert!(matches!(
            library().drop_at(&registry(), &mut collection, "header", 0),
            Err(StructureError::Anno(AnnoError::OutOfBounds { .. }))
        ));
        assert!(collection.is_empty());
    }

    #[test]
    fn length_rules() {
        let registry = registry();
        let parse = |fields: &str| {
            StructureLibrary::from_toml(&format!("[[structure]]\nname = \"s\"\nfields = [{fields}]"))
                .unwrap()
        };

        let missing = parse(r#"{ kind = "value", name = "text", type = "string" }"#);
        assert!(matches!(
            missing.layout(&registry, "s", 0),
            Err(StructureError::MissingLength { .. })
        ));

        let mismatch = parse(r#"{ kind = "value", name = "n", type = "uint32le", length = 2 }"#);
        assert!(matches!(
            mismatch.layout(&registry, "s", 0),
            Err(StructureError::LengthMismatch { length: 2, fixed: 4, .. })
        ));

        let unknown = parse(r#"{ kind = "value", name = "f", type = "float128" }"#);
        assert!(matches!(
            unknown.layout(&registry, "s", 0),
            Err(StructureError::Interp(InterpError::UnknownInterpreter(_)))
        ));

        let empty_array =
            parse(r#"{ kind = "array", name = "a", size = 0, element = "uint8" }"#);
        assert!(matches!(
            empty_array.layout(&registry, "s", 0),
            Err(StructureError::Empty(_))
        ));
    }

    #[test]
    fn self_reference_is_rejected() {
        let library = StructureLibrary::from_toml(
            r#"
            [[structure]]
            name = "node"
            fields = [
                { kind = "value", name = "tag", type = "uint8" },
                { kind = "value", name = "next", type = "node" },
            ]
            "#,
        )
        .unwrap();
        assert!(matches!(
            library.layout(&registry(), "node", 0),
            Err(StructureError::Recursive(name)) if name == "node"
        ));
    }

    #[test]
    fn a_structure_may_appear_twice_side_by_side() {
        let library = StructureLibrary::from_toml(
            r#"
            [[structure]]
            name = "pair"
            fields = [{ kind = "value", name = "v", type = "uint8" }]

            [[structure]]
            name = "twice"
            fields = [
                { kind = "value", name = "a", type = "pair" },
                { kind = "value", name = "b", type = "pair" },
            ]
            "#,
        )
        .unwrap();
        let layout = library.layout(&registry(), "twice", 0).unwrap();
        assert_eq!(layout.range(), range(0, 2));
        assert_eq!(layout.children[1].annotation.note(), Some("b"));
    }

    #[test]
    fn duplicate_and_unknown_structures() {
        let duplicate = format!("{DEFINITIONS}\n[[structure]]\nname = \"entry\"\nfields = []\n");
        assert!(matches!(
            StructureLibrary::from_toml(&duplicate),
            Err(StructureError::DuplicateStructure(name)) if name == "entry"
        ));
        assert!(matches!(
            library().layout(&registry(), "footer", 0),
            Err(StructureError::UnknownStructure(_))
        ));
        assert!(matches!(
            StructureLibrary::from_toml("[[structure]]\nname = 3"),
            Err(StructureError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formats.toml");
        fs::write(&path, DEFINITIONS).unwrap();
        assert_eq!(StructureLibrary::load(&path).unwrap(), library());
        assert!(matches!(
            StructureLibrary::load(dir.path().join("absent.toml")),
            Err(StructureError::Io(_))
        ));
    }
}
