//! Arena-backed annotation collection.
//!
//! [`MemoryAnnotationCollection`] stores every annotation in a `HashMap`
//! keyed by [`AnnotationId`]. Each node records its parent and its ordered
//! child list, so lookups in either direction are direct and no reference
//! cycles exist. The root group is held outside the map so it can never go
//! missing.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range as IndexRange;
use std::sync::Arc;

use hexnote_interp::Interpreter;
use hexnote_types::{Binary, Range};
use tracing::debug;

use crate::annotation::{Annotation, AnnotationId};
use crate::attributes::Attributes;
use crate::collection::AnnotationCollection;
use crate::error::{AnnoError, AnnoResult};
use crate::listener::{AnnotationsChanged, Listener, Listeners, Subscription};

#[derive(Clone, Debug)]
struct Node {
    annotation: Annotation,
    parent: Option<AnnotationId>,
    children: Vec<AnnotationId>,
}

impl Node {
    fn new(annotation: Annotation, parent: Option<AnnotationId>) -> Self {
        Self {
            annotation,
            parent,
            children: Vec::new(),
        }
    }
}

/// Where a new annotation goes: under `parent` at child index `index`,
/// taking over the siblings in `adopt` (which starts at `index`).
#[derive(Debug, PartialEq, Eq)]
struct Placement {
    parent: AnnotationId,
    adopt: IndexRange<usize>,
}

/// The standard in-memory [`AnnotationCollection`].
pub struct MemoryAnnotationCollection {
    root: Node,
    nodes: HashMap<AnnotationId, Node>,
    next_id: u64,
    listeners: Listeners,
}

impl fmt::Debug for MemoryAnnotationCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryAnnotationCollection")
            .field("root", &self.root.annotation.range())
            .field("annotations", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Clones the tree only. The clone starts with no listeners.
impl Clone for MemoryAnnotationCollection {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            nodes: self.nodes.clone(),
            next_id: self.next_id,
            listeners: Listeners::new(),
        }
    }
}

impl MemoryAnnotationCollection {
    /// An empty collection over a binary of `length` bytes.
    pub fn new(length: u64) -> AnnoResult<Self> {
        let range = Range::new(0, length)?;
        Ok(Self::with_root(Annotation::group(range)))
    }

    /// An empty collection spanning `binary`.
    pub fn for_binary(binary: &dyn Binary) -> AnnoResult<Self> {
        Self::new(binary.length())
    }

    /// An empty collection whose root is `root`. Only the root's range and
    /// attributes are used; a leaf is turned into a group over the same
    /// range.
    pub fn with_root(root: Annotation) -> Self {
        let root = if root.is_group() {
            root
        } else {
            Annotation::group(root.range()).with_attributes(root.attributes().clone())
        };
        Self {
            root: Node::new(root, None),
            nodes: HashMap::new(),
            next_id: AnnotationId::ROOT.as_u64() + 1,
            listeners: Listeners::new(),
        }
    }

    /// Append `annotation` as the last child of `parent` without checking
    /// the tree invariants and without notifying listeners.
    ///
    /// This exists for loaders that rebuild an already-valid tree in
    /// document order; everything else should use
    /// [`add`](AnnotationCollection::add).
    pub fn attach(&mut self, parent: AnnotationId, annotation: Annotation) -> AnnoResult<AnnotationId> {
        match self.node(parent) {
            Some(node) if node.annotation.is_group() => {}
            Some(_) => {
                return Err(AnnoError::UnsupportedMutation(format!(
                    "leaf {parent} cannot own children"
                )))
            }
            None => return Err(AnnoError::NotFound(parent)),
        }
        let id = self.issue_id();
        self.nodes.insert(id, Node::new(annotation, Some(parent)));
        if let Some(node) = self.node_mut(parent) {
            node.children.push(id);
        }
        Ok(id)
    }

    fn issue_id(&mut self) -> AnnotationId {
        let id = AnnotationId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }

    fn node(&self, id: AnnotationId) -> Option<&Node> {
        if id.is_root() {
            Some(&self.root)
        } else {
            self.nodes.get(&id)
        }
    }

    fn node_mut(&mut self, id: AnnotationId) -> Option<&mut Node> {
        if id.is_root() {
            Some(&mut self.root)
        } else {
            self.nodes.get_mut(&id)
        }
    }

    fn range_of(&self, id: AnnotationId) -> Range {
        // Every id in a child list has a node.
        self.node(id)
            .map(|node| node.annotation.range())
            .unwrap_or(self.root.annotation.range())
    }

    /// Children of `parent` whose ranges share bytes with `range`, as an
    /// index range into the child list. Siblings are sorted and disjoint,
    /// so their end offsets are sorted too.
    fn overlapping_children(&self, parent: &Node, range: &Range) -> IndexRange<usize> {
        let children = &parent.children;
        let start = children.partition_point(|c| self.range_of(*c).end() <= range.position());
        let end = start
            + children[start..]
                .iter()
                .take_while(|c| self.range_of(**c).position() < range.end())
                .count();
        start..end
    }

    /// Resolve where `annotation` belongs without touching the tree.
    fn locate(&self, annotation: &Annotation) -> AnnoResult<Placement> {
        let range = annotation.range();
        let bounds = self.root.annotation.range();
        if !bounds.contains(&range) {
            return Err(AnnoError::OutOfBounds { range, bounds });
        }

        let mut parent_id = AnnotationId::ROOT;
        loop {
            let parent = self.node(parent_id).ok_or(AnnoError::NotFound(parent_id))?;
            let overlapping = self.overlapping_children(parent, &range);
            let conflict = |id: AnnotationId| AnnoError::Overlapping {
                range,
                conflict: id,
                conflict_range: self.range_of(id),
            };

            if overlapping.len() == 1 {
                let sibling_id = parent.children[overlapping.start];
                let sibling = self.node(sibling_id).ok_or(AnnoError::NotFound(sibling_id))?;
                let sibling_range = sibling.annotation.range();
                if sibling_range.contains(&range) {
                    if sibling.annotation.is_group() {
                        parent_id = sibling_id;
                        continue;
                    }
                    // A group may wrap a leaf of exactly the same extent.
                    if !(annotation.is_group() && sibling_range == range) {
                        return Err(conflict(sibling_id));
                    }
                }
            }

            for &sibling_id in &parent.children[overlapping.clone()] {
                if range.partially_overlaps(&self.range_of(sibling_id)) || annotation.is_leaf() {
                    return Err(conflict(sibling_id));
                }
            }

            return Ok(Placement {
                parent: parent_id,
                adopt: overlapping,
            });
        }
    }

    fn descendants(&self, id: AnnotationId) -> Vec<AnnotationId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.node(current) {
                stack.extend(node.children.iter().copied());
            }
            out.push(current);
        }
        out
    }
}

impl AnnotationCollection for MemoryAnnotationCollection {
    fn root_group(&self) -> &Annotation {
        &self.root.annotation
    }

    fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.node(id).map(|node| &node.annotation)
    }

    fn children(&self, id: AnnotationId) -> &[AnnotationId] {
        self.node(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    fn parent(&self, id: AnnotationId) -> Option<AnnotationId> {
        self.node(id).and_then(|node| node.parent)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn add(&mut self, annotation: Annotation) -> AnnoResult<AnnotationId> {
        let placement = self.locate(&annotation)?;
        let range = annotation.range();
        let id = self.issue_id();

        let parent = self
            .node_mut(placement.parent)
            .ok_or(AnnoError::NotFound(placement.parent))?;
        let adopted: Vec<AnnotationId> = parent.children.drain(placement.adopt.clone()).collect();
        parent.children.insert(placement.adopt.start, id);

        for child in &adopted {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = Some(id);
            }
        }
        let mut node = Node::new(annotation, Some(placement.parent));
        node.children = adopted;
        let adopted_count = node.children.len();
        self.nodes.insert(id, node);

        debug!(%id, %range, parent = %placement.parent, adopted = adopted_count, "added annotation");
        self.listeners.fire(&AnnotationsChanged::Added(id));
        Ok(id)
    }

    fn remove(&mut self, id: AnnotationId) -> AnnoResult<()> {
        if id.is_root() {
            return Err(AnnoError::RootImmutable);
        }
        let parent_id = self
            .nodes
            .get(&id)
            .ok_or(AnnoError::NotFound(id))?
            .parent
            .unwrap_or(AnnotationId::ROOT);

        if let Some(parent) = self.node_mut(parent_id) {
            parent.children.retain(|child| *child != id);
        }
        let subtree = self.descendants(id);
        for removed in &subtree {
            self.nodes.remove(removed);
        }

        debug!(%id, removed = subtree.len(), "removed annotation");
        self.listeners.fire(&AnnotationsChanged::Removed(id));
        Ok(())
    }

    fn attributes_mut(&mut self, id: AnnotationId) -> AnnoResult<&mut Attributes> {
        self.node_mut(id)
            .map(|node| node.annotation.attributes_mut())
            .ok_or(AnnoError::NotFound(id))
    }

    fn set_interpreter(
        &mut self,
        id: AnnotationId,
        interpreter: Arc<dyn Interpreter>,
    ) -> AnnoResult<()> {
        let node = self.node_mut(id).ok_or(AnnoError::NotFound(id))?;
        if node.annotation.replace_interpreter(interpreter) {
            Ok(())
        } else {
            Err(AnnoError::UnsupportedMutation(format!(
                "group {id} has no interpreter"
            )))
        }
    }

    fn path_at(&self, position: u64) -> Option<Vec<AnnotationId>> {
        if !self.root.annotation.range().contains_position(position) {
            return None;
        }
        let mut path = Vec::new();
        let mut current = &self.root;
        loop {
            let index = current
                .children
                .partition_point(|c| self.range_of(*c).position() <= position);
            let Some(&candidate) = index.checked_sub(1).and_then(|i| current.children.get(i)) else {
                break;
            };
            let Some(node) = self.node(candidate) else {
                break;
            };
            if !node.annotation.range().contains_position(position) {
                break;
            }
            path.push(candidate);
            if node.annotation.is_leaf() {
                break;
            }
            current = node;
        }
        Some(path)
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        self.listeners.subscribe(listener)
    }
}
