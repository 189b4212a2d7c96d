//! Reading and writing notebooks.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use hexnote_anno::{AnnotationCollection, AnnotationId, MemoryAnnotationCollection};
use hexnote_interp::InterpreterRegistry;
use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::document::{Document, NodeDoc, NodeKind, FORMAT_VERSION};
use crate::error::{NotebookError, NotebookResult};
use crate::notebook::Notebook;

/// Serializes notebooks to JSON and back.
///
/// Leaf interpreters are rebuilt through the injected registry, so a
/// storage can only read notebooks whose interpreter types it knows.
#[derive(Clone, Debug)]
pub struct NotebookStorage {
    registry: Arc<InterpreterRegistry>,
    config: StorageConfig,
}

impl NotebookStorage {
    pub fn new(registry: Arc<InterpreterRegistry>) -> Self {
        Self::with_config(registry, StorageConfig::default())
    }

    pub fn with_config(registry: Arc<InterpreterRegistry>, config: StorageConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &InterpreterRegistry {
        &self.registry
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Render `notebook` as a JSON document.
    pub fn render(&self, notebook: &Notebook) -> NotebookResult<Vec<u8>> {
        let annotations = notebook.annotations();
        let document = Document {
            version: FORMAT_VERSION,
            binary: notebook.binary_location().to_string(),
            root: NodeDoc::capture(annotations, annotations.root())?,
            extra: notebook.properties().clone(),
        };
        let mut rendered = if self.config.pretty {
            serde_json::to_vec_pretty(&document)?
        } else {
            serde_json::to_vec(&document)?
        };
        rendered.push(b'\n');
        Ok(rendered)
    }

    /// Write `notebook` to `sink`.
    ///
    /// The document is rendered completely before the first byte is
    /// written, so a serialization problem never leaves partial output.
    /// Sink failures surface as [`NotebookError::Io`].
    pub fn write<W: Write>(&self, notebook: &Notebook, mut sink: W) -> NotebookResult<()> {
        let rendered = self.render(notebook)?;
        sink.write_all(&rendered)?;
        sink.flush()?;
        debug!(
            location = notebook.binary_location(),
            annotations = notebook.annotations().len(),
            bytes = rendered.len(),
            "wrote notebook"
        );
        Ok(())
    }

    /// Read a notebook from `source`.
    ///
    /// The whole source is read before parsing begins; a failing source
    /// yields [`NotebookError::Io`] and no notebook.
    pub fn read<R: Read>(&self, mut source: R) -> NotebookResult<Notebook> {
        let mut text = String::new();
        source.read_to_string(&mut text)?;
        self.parse(&text)
    }

    /// Parse a notebook from JSON text.
    pub fn parse(&self, text: &str) -> NotebookResult<Notebook> {
        let document: Document = serde_json::from_str(text)?;
        if document.version != FORMAT_VERSION {
            return Err(NotebookError::UnsupportedVersion(document.version));
        }
        if document.root.kind != NodeKind::Group {
            return Err(NotebookError::InvalidDocument(
                "root node must be a group".to_string(),
            ));
        }
        document.root.check_shape()?;
        if self.config.validate_on_load {
            document.root.check_layout()?;
        }
        let extra = document.root.extra_keys();
        if !extra.is_empty() {
            warn!(keys = ?extra, "preserving unknown notebook attributes");
        }
        if !document.extra.is_empty() {
            let keys: Vec<&str> = document.extra.keys().map(String::as_str).collect();
            warn!(keys = ?keys, "preserving unknown notebook properties");
        }

        let root = document.root.to_annotation(&self.registry)?;
        let mut annotations = MemoryAnnotationCollection::with_root(root);
        let mut pending: Vec<(AnnotationId, &NodeDoc)> = document
            .root
            .children
            .iter()
            .map(|child| (AnnotationId::ROOT, child))
            .collect();
        // Children are attached in document order, parents before children.
        pending.reverse();
        while let Some((parent, node)) = pending.pop() {
            let id = annotations.attach(parent, node.to_annotation(&self.registry)?)?;
            pending.extend(node.children.iter().rev().map(|child| (id, child)));
        }

        debug!(
            location = %document.binary,
            annotations = document.root.count() - 1,
            "read notebook"
        );
        Ok(Notebook::new(document.binary, annotations).with_properties(document.extra))
    }

    pub fn write_file(&self, notebook: &Notebook, path: impl AsRef<Path>) -> NotebookResult<()> {
        let file = File::create(path.as_ref())?;
        self.write(notebook, BufWriter::new(file))
    }

    pub fn read_file(&self, path: impl AsRef<Path>) -> NotebookResult<Notebook> {
        self.read(File::open(path.as_ref())?)
    }

    /// Whether `path` carries the configured notebook extension.
    pub fn is_notebook_path(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.config.file_extension))
    }
}
