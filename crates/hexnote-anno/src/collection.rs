//! The [`AnnotationCollection`] trait.
//!
//! Views and storage talk to annotations only through this trait, which
//! lets decorators such as
//! [`ExpansionTrackingCollection`](crate::ExpansionTrackingCollection) wrap
//! a concrete collection and intercept individual calls.

use std::sync::Arc;

use hexnote_interp::Interpreter;

use crate::annotation::{Annotation, AnnotationId};
use crate::attributes::Attributes;
use crate::error::AnnoResult;
use crate::listener::{Listener, Subscription};

/// A tree of non-overlapping annotations rooted at a group that spans the
/// whole binary.
///
/// All methods run on the thread that owns the collection. Mutations are
/// atomic: either the tree is fully updated and exactly one change event is
/// fired, or an error is returned and the tree is untouched.
pub trait AnnotationCollection {
    /// Id of the root group.
    fn root(&self) -> AnnotationId {
        AnnotationId::ROOT
    }

    /// The root group. It always exists.
    fn root_group(&self) -> &Annotation;

    /// Look up an annotation.
    fn get(&self, id: AnnotationId) -> Option<&Annotation>;

    /// Children of a group, sorted by start position. Empty for leaves and
    /// unknown ids.
    fn children(&self, id: AnnotationId) -> &[AnnotationId];

    /// The group owning `id`; `None` for the root and unknown ids.
    fn parent(&self, id: AnnotationId) -> Option<AnnotationId>;

    /// Number of annotations, not counting the root.
    fn len(&self) -> usize;

    /// Insert an annotation into the deepest group that contains it.
    ///
    /// A group whose range covers existing siblings adopts them as its
    /// children. Partial overlap with an existing annotation fails with
    /// [`AnnoError::Overlapping`](crate::AnnoError::Overlapping); a range outside the root fails with
    /// [`AnnoError::OutOfBounds`](crate::AnnoError::OutOfBounds).
    fn add(&mut self, annotation: Annotation) -> AnnoResult<AnnotationId>;

    /// Remove an annotation together with its subtree.
    ///
    /// Removing an id that is not in the tree fails with
    /// [`AnnoError::NotFound`](crate::AnnoError::NotFound); removing the root
    /// fails with [`AnnoError::RootImmutable`](crate::AnnoError::RootImmutable).
    fn remove(&mut self, id: AnnotationId) -> AnnoResult<()>;

    /// Mutable access to an annotation's attributes. Attribute edits do not
    /// fire change events.
    fn attributes_mut(&mut self, id: AnnotationId) -> AnnoResult<&mut Attributes>;

    /// Swap a leaf's interpreter. Groups have no interpreter and reject this
    /// with [`AnnoError::UnsupportedMutation`](crate::AnnoError::UnsupportedMutation).
    fn set_interpreter(
        &mut self,
        id: AnnotationId,
        interpreter: Arc<dyn Interpreter>,
    ) -> AnnoResult<()>;

    /// The chain of annotations covering `position`, from a child of the
    /// root down to the innermost annotation.
    ///
    /// Returns `None` if `position` lies outside the root group and an empty
    /// path if no top-level annotation covers it.
    fn path_at(&self, position: u64) -> Option<Vec<AnnotationId>>;

    /// Register a change listener.
    fn subscribe(&self, listener: Listener) -> Subscription;

    /// Direct children of the root.
    fn top_level(&self) -> &[AnnotationId] {
        self.children(self.root())
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every annotation below the root in pre-order, paired with its depth
    /// (top-level annotations have depth 0).
    fn walk(&self) -> Vec<(usize, AnnotationId)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<(usize, AnnotationId)> = self
            .top_level()
            .iter()
            .rev()
            .map(|id| (0, *id))
            .collect();
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            stack.extend(self.children(id).iter().rev().map(|child| (depth + 1, *child)));
        }
        out
    }

    /// Set or clear an annotation's note.
    fn set_note(&mut self, id: AnnotationId, note: Option<String>) -> AnnoResult<()> {
        let attributes = self.attributes_mut(id)?;
        match note {
            Some(note) => attributes.set_note(note),
            None => attributes.clear_note(),
        }
        Ok(())
    }

    /// Find the annotation whose range is exactly `position..position + length`.
    fn find_exact(&self, position: u64, length: u64) -> Option<AnnotationId> {
        self.path_at(position)?.into_iter().find(|id| {
            self.get(*id)
                .is_some_and(|a| a.range().position() == position && a.range().length() == length)
        })
    }
}

/// Structural equality of two collections: same root, and recursively the
/// same ranges, kinds, interpreter identities, attributes and child order.
/// Annotation ids are not compared.
pub fn same_structure<A, B>(a: &A, b: &B) -> bool
where
    A: AnnotationCollection + ?Sized,
    B: AnnotationCollection + ?Sized,
{
    fn same_subtree<A, B>(a: &A, a_id: AnnotationId, b: &B, b_id: AnnotationId) -> bool
    where
        A: AnnotationCollection + ?Sized,
        B: AnnotationCollection + ?Sized,
    {
        let (Some(a_node), Some(b_node)) = (a.get(a_id), b.get(b_id)) else {
            return false;
        };
        let a_children = a.children(a_id);
        let b_children = b.children(b_id);
        a_node.same_as(b_node)
            && a_children.len() == b_children.len()
            && a_children
                .iter()
                .zip(b_children)
                .all(|(x, y)| same_subtree(a, *x, b, *y))
    }

    same_subtree(a, a.root(), b, b.root())
}

