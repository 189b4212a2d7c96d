//! The persisted notebook document.
//!
//! ```json
//! {
//!   "version": 1,
//!   "binary": "file:///data/sample.bin",
//!   "root": {
//!     "kind": "group", "position": 0, "length": 100,
//!     "children": [
//!       { "kind": "leaf", "position": 9, "length": 4, "note": "count",
//!         "interpreter": { "type": "uint32le" } }
//!     ]
//!   }
//! }
//! ```
//!
//! Keys a node carries beyond the ones above are kept as custom attributes
//! and written back unchanged. Unknown top-level keys become notebook
//! properties and are written back the same way.

use std::collections::BTreeMap;

use hexnote_anno::{
    AnnoError, Annotation, AnnotationCollection, AnnotationId, AnnotationKind, Attributes,
};
use hexnote_interp::{InterpreterRegistry, OptionValues};
use hexnote_types::{ParametricStyle, Range};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{NotebookError, NotebookResult};

/// Document format version written by this crate.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    /// Location of the annotated binary (URL or path).
    pub binary: String,
    pub root: NodeDoc,
    /// Top-level keys other than the three above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Group,
    Leaf,
}

/// One annotation and, for groups, its subtree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDoc {
    pub kind: NodeKind,
    pub position: u64,
    pub length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ParametricStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<InterpreterDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDoc>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpreterDoc {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "OptionValues::is_empty")]
    pub options: OptionValues,
}

impl NodeDoc {
    /// Snapshot the subtree rooted at `id`.
    pub fn capture<C>(collection: &C, id: AnnotationId) -> NotebookResult<Self>
    where
        C: AnnotationCollection + ?Sized,
    {
        let annotation = collection.get(id).ok_or(AnnoError::NotFound(id))?;
        let attributes = annotation.attributes();
        let children = collection
            .children(id)
            .iter()
            .map(|child| Self::capture(collection, *child))
            .collect::<NotebookResult<Vec<_>>>()?;
        let (kind, interpreter) = match annotation.kind() {
            AnnotationKind::Group => (NodeKind::Group, None),
            AnnotationKind::Leaf(interpreter) => {
                let descriptor = interpreter.descriptor();
                let doc = InterpreterDoc {
                    type_name: descriptor.type_name,
                    options: descriptor.options,
                };
                (NodeKind::Leaf, Some(doc))
            }
        };

        Ok(Self {
            kind,
            position: annotation.range().position(),
            length: annotation.range().length(),
            note: attributes.note().map(str::to_string),
            style: attributes.style().copied(),
            interpreter,
            children,
            extra: attributes
                .custom_entries()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        })
    }

    pub fn range(&self) -> NotebookResult<Range> {
        Ok(Range::new(self.position, self.length)?)
    }

    /// Rebuild this node's attribute map.
    pub fn attributes(&self) -> NotebookResult<Attributes> {
        let mut attributes = Attributes::new();
        if let Some(note) = &self.note {
            attributes.set_note(note.as_str());
        }
        attributes.set_style(self.style);
        for (key, value) in &self.extra {
            attributes.set_custom(key.as_str(), value.clone())?;
        }
        Ok(attributes)
    }

    /// Number of nodes in this subtree, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(NodeDoc::count).sum::<usize>()
    }

    /// Names of unknown keys anywhere in this subtree.
    pub fn extra_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.extra.keys().cloned().collect();
        for child in &self.children {
            keys.extend(child.extra_keys());
        }
        keys.sort();
        keys.dedup();
        keys
    }

    /// Checks that every node has the shape its kind requires.
    pub fn check_shape(&self) -> NotebookResult<()> {
        let range = self.range()?;
        match self.kind {
            NodeKind::Leaf => {
                if self.interpreter.is_none() {
                    return Err(invalid(format!("leaf at {range} has no interpreter")));
                }
                if !self.children.is_empty() {
                    return Err(invalid(format!("leaf at {range} has children")));
                }
            }
            NodeKind::Group => {
                if self.interpreter.is_some() {
                    return Err(invalid(format!("group at {range} has an interpreter")));
                }
            }
        }
        self.children.iter().try_for_each(NodeDoc::check_shape)
    }

    /// Checks the containment invariants: children sorted, pairwise
    /// disjoint, and inside their parent.
    pub fn check_layout(&self) -> NotebookResult<()> {
        let range = self.range()?;
        let mut previous: Option<Range> = None;
        for child in &self.children {
            let child_range = child.range()?;
            if !range.contains(&child_range) {
                return Err(invalid(format!(
                    "child {child_range} lies outside its parent {range}"
                )));
            }
            if let Some(previous) = previous {
                if previous.end() > child_range.position() {
                    return Err(invalid(format!(
                        "child {child_range} overlaps or precedes sibling {previous}"
                    )));
                }
            }
            previous = Some(child_range);
            child.check_layout()?;
        }
        Ok(())
    }

    /// Turn this node, without its children, into a detached annotation,
    /// resolving a leaf's interpreter through `registry`.
    pub fn to_annotation(&self, registry: &InterpreterRegistry) -> NotebookResult<Annotation> {
        let range = self.range()?;
        let annotation = match (self.kind, &self.interpreter) {
            (NodeKind::Leaf, Some(interpreter)) => Annotation::leaf(
                range,
                registry.create(&interpreter.type_name, &interpreter.options)?,
            ),
            (NodeKind::Leaf, None) => {
                return Err(invalid(format!("leaf at {range} has no interpreter")))
            }
            (NodeKind::Group, _) => Annotation::group(range),
        };
        Ok(annotation.with_attributes(self.attributes()?))
    }
}

fn invalid(reason: String) -> NotebookError {
    NotebookError::InvalidDocument(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexnote_interp::OptionValue;
    use serde_json::json;

    fn leaf(position: u64, length: u64) -> NodeDoc {
        NodeDoc {
            kind: NodeKind::Leaf,
            position,
            length,
            note: None,
            style: None,
            interpreter: Some(InterpreterDoc {
                type_name: "null".into(),
                options: OptionValues::new(),
            }),
            children: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    fn group(position: u64, length: u64, children: Vec<NodeDoc>) -> NodeDoc {
        NodeDoc {
            kind: NodeKind::Group,
            interpreter: None,
            children,
            ..leaf(position, length)
        }
    }

    #[test]
    fn unknown_keys_land_in_extra() {
        let node: NodeDoc = serde_json::from_value(json!({
            "kind": "leaf",
            "position": 2,
            "length": 4,
            "interpreter": {"type": "string", "options": {"charset": "UTF-16LE"}},
            "origin": {"tool": "import"}
        }))
        .unwrap();
        assert_eq!(node.extra.get("origin"), Some(&json!({"tool": "import"})));
        assert_eq!(
            node.interpreter.as_ref().unwrap().options.get("charset"),
            Some(&OptionValue::from("UTF-16LE"))
        );

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back["origin"], json!({"tool": "import"}));
        assert!(back.get("children").is_none());
        assert!(back.get("note").is_none());
    }

    #[test]
    fn layout_checks() {
        assert!(group(0, 20, vec![leaf(0, 4), leaf(4, 4)]).check_layout().is_ok());
        assert!(matches!(
            group(0, 20, vec![leaf(4, 4), leaf(0, 4)]).check_layout(),
            Err(NotebookError::InvalidDocument(_))
        ));
        assert!(matches!(
            group(0, 20, vec![leaf(0, 4), leaf(2, 4)]).check_layout(),
            Err(NotebookError::InvalidDocument(_))
        ));
        assert!(matches!(
            group(0, 20, vec![group(10, 4, vec![leaf(12, 4)])]).check_layout(),
            Err(NotebookError::InvalidDocument(_))
        ));
    }

    #[test]
    fn shape_checks() {
        let mut bad_leaf = leaf(0, 4);
        bad_leaf.children.push(leaf(0, 2));
        assert!(matches!(
            group(0, 20, vec![bad_leaf]).check_shape(),
            Err(NotebookError::InvalidDocument(_))
        ));

        let mut bare_leaf = leaf(0, 4);
        bare_leaf.interpreter = None;
        assert!(matches!(bare_leaf.check_shape(), Err(NotebookError::InvalidDocument(_))));

        let mut typed_group = group(0, 4, Vec::new());
        typed_group.interpreter = leaf(0, 4).interpreter;
        assert!(matches!(typed_group.check_shape(), Err(NotebookError::InvalidDocument(_))));
    }

    #[test]
    fn zero_length_is_a_range_error() {
        assert!(matches!(leaf(3, 0).range(), Err(NotebookError::Type(_))));
    }

    #[test]
    fn count_and_extra_keys() {
        let mut inner = leaf(0, 4);
        inner.extra.insert("b".into(), json!(1));
        let mut root = group(0, 10, vec![inner, leaf(4, 4)]);
        root.extra.insert("a".into(), json!(true));
        assert_eq!(root.count(), 3);
        assert_eq!(root.extra_keys(), vec!["a".to_string(), "b".to_string()]);
    }
}
