//! Collapse/expand state layered over another collection.

use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use hexnote_interp::Interpreter;
use tracing::debug;

use crate::annotation::{Annotation, AnnotationId};
use crate::attributes::Attributes;
use crate::collection::AnnotationCollection;
use crate::error::{AnnoError, AnnoResult};
use crate::listener::{AnnotationsChanged, Listener, Listeners, Subscription};

/// Wraps a collection and remembers which groups a view has collapsed.
///
/// Path lookups stop at the first collapsed group, so a view never selects
/// something hidden inside one. Structural changes from the wrapped
/// collection are re-announced to this collection's own listeners, and
/// collapsing or expanding a group fires
/// [`AnnotationsChanged::ExpansionChanged`].
#[derive(Debug)]
pub struct ExpansionTrackingCollection<C: AnnotationCollection> {
    inner: C,
    collapsed: HashSet<AnnotationId>,
    listeners: Listeners,
    forward: Option<Subscription>,
}

impl<C: AnnotationCollection> ExpansionTrackingCollection<C> {
    /// Wrap `inner`. Everything starts expanded.
    pub fn new(inner: C) -> Self {
        let listeners = Listeners::new();
        let relay = listeners.clone();
        let forward = inner.subscribe(Rc::new(move |event: &AnnotationsChanged| relay.fire(event)));
        Self {
            inner,
            collapsed: HashSet::new(),
            listeners,
            forward: Some(forward),
        }
    }

    pub fn is_collapsed(&self, id: AnnotationId) -> bool {
        self.collapsed.contains(&id)
    }

    pub fn collapse(&mut self, id: AnnotationId) -> AnnoResult<()> {
        self.set_collapsed(id, true)
    }

    pub fn expand(&mut self, id: AnnotationId) -> AnnoResult<()> {
        self.set_collapsed(id, false)
    }

    /// Flip `id` between collapsed and expanded.
    pub fn toggle(&mut self, id: AnnotationId) -> AnnoResult<()> {
        let collapsed = self.is_collapsed(id);
        self.set_collapsed(id, !collapsed)
    }

    fn set_collapsed(&mut self, id: AnnotationId, collapsed: bool) -> AnnoResult<()> {
        if self.inner.get(id).is_none() {
            return Err(AnnoError::NotFound(id));
        }
        let changed = if collapsed {
            self.collapsed.insert(id)
        } else {
            self.collapsed.remove(&id)
        };
        if changed {
            debug!(%id, collapsed, "expansion changed");
            self.listeners.fire(&AnnotationsChanged::ExpansionChanged(id));
        }
        Ok(())
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Unwrap, detaching from the inner collection's notifications.
    pub fn into_inner(mut self) -> C {
        if let Some(forward) = self.forward.take() {
            forward.cancel();
        }
        self.inner
    }
}

impl<C: AnnotationCollection> AnnotationCollection for ExpansionTrackingCollection<C> {
    fn root_group(&self) -> &Annotation {
        self.inner.root_group()
    }

    fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.inner.get(id)
    }

    fn children(&self, id: AnnotationId) -> &[AnnotationId] {
        self.inner.children(id)
    }

    fn parent(&self, id: AnnotationId) -> Option<AnnotationId> {
        self.inner.parent(id)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn add(&mut self, annotation: Annotation) -> AnnoResult<AnnotationId> {
        self.inner.add(annotation)
    }

    fn remove(&mut self, id: AnnotationId) -> AnnoResult<()> {
        self.inner.remove(id)?;
        let inner = &self.inner;
        self.collapsed.retain(|collapsed| inner.get(*collapsed).is_some());
        Ok(())
    }

    fn attributes_mut(&mut self, id: AnnotationId) -> AnnoResult<&mut Attributes> {
        self.inner.attributes_mut(id)
    }

    fn set_interpreter(
        &mut self,
        id: AnnotationId,
        interpreter: Arc<dyn Interpreter>,
    ) -> AnnoResult<()> {
        self.inner.set_interpreter(id, interpreter)
    }

    fn path_at(&self, position: u64) -> Option<Vec<AnnotationId>> {
        let mut path = self.inner.path_at(position)?;
        if let Some(index) = path.iter().position(|id| self.is_collapsed(*id)) {
            path.truncate(index + 1);
        }
        Some(path)
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        self.listeners.subscribe(listener)
    }
}
