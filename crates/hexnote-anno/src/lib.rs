//! Annotation collections for hexnote.
//!
//! An annotation labels a byte range of a binary. Leaf annotations carry an
//! interpreter that decodes their bytes; group annotations own child
//! annotations instead. A collection keeps every annotation in a single tree
//! under a root group spanning the whole binary.
//!
//! # Invariants
//!
//! - Siblings never share bytes. If one range contains another, the larger
//!   one is a group and the smaller one lives inside it.
//! - Children are kept sorted by start position.
//! - No annotation extends past its parent's range.
//! - The root group spans the whole bound binary.
//!
//! # Modules
//!
//! - [`annotation`] — [`Annotation`], [`AnnotationKind`] and [`AnnotationId`]
//! - [`attributes`] — Notes, styles and custom attributes
//! - [`collection`] — The [`AnnotationCollection`] trait
//! - [`memory`] — Arena-backed [`MemoryAnnotationCollection`]
//! - [`listener`] — Change notification and [`Subscription`] handles
//! - [`expansion`] — [`ExpansionTrackingCollection`], a path-truncating decorator
//! - [`table`] — Column model consumed by tree-table views
//! - [`structure`] — [`StructureLibrary`]: record templates dropped as annotation groups

pub mod annotation;
pub mod attributes;
pub mod collection;
pub mod error;
pub mod expansion;
pub mod listener;
pub mod memory;
pub mod structure;
pub mod table;

pub use annotation::{Annotation, AnnotationId, AnnotationKind};
pub use attributes::Attributes;
pub use collection::{same_structure, AnnotationCollection};
pub use error::{AnnoError, AnnoResult};
pub use expansion::ExpansionTrackingCollection;
pub use listener::{AnnotationsChanged, Listener, Listeners, Subscription};
pub use memory::MemoryAnnotationCollection;
pub use structure::{FieldDef, Layout, StructureDef, StructureError, StructureLibrary, StructureResult};
pub use table::{AnnotationColumn, AnnotationTable, CellValue};
