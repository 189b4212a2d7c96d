use std::collections::BTreeMap;
use std::path::PathBuf;

use hexnote_anno::MemoryAnnotationCollection;
use hexnote_types::Binary;
use serde_json::Value as JsonValue;

use crate::error::NotebookResult;

const FILE_SCHEME: &str = "file://";

/// A reference to a binary plus the annotations made on it.
///
/// The notebook never holds the binary's bytes, only where to find them.
/// Document-level keys written by other tools are kept in `properties`.
#[derive(Clone, Debug)]
pub struct Notebook {
    binary_location: String,
    annotations: MemoryAnnotationCollection,
    properties: BTreeMap<String, JsonValue>,
}

impl Notebook {
    pub fn new(binary_location: impl Into<String>, annotations: MemoryAnnotationCollection) -> Self {
        Self {
            binary_location: binary_location.into(),
            annotations,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, JsonValue>) -> Self {
        self.properties = properties;
        self
    }

    /// An empty notebook whose root group spans `binary`.
    pub fn for_binary(binary_location: impl Into<String>, binary: &dyn Binary) -> NotebookResult<Self> {
        Ok(Self::new(
            binary_location,
            MemoryAnnotationCollection::for_binary(binary)?,
        ))
    }

    pub fn binary_location(&self) -> &str {
        &self.binary_location
    }

    /// The location as a local path: `file://` URLs and scheme-less
    /// locations. Other URL schemes yield `None`.
    pub fn binary_path(&self) -> Option<PathBuf> {
        if let Some(path) = self.binary_location.strip_prefix(FILE_SCHEME) {
            return Some(PathBuf::from(path));
        }
        match self.binary_location.split_once("://") {
            Some(_) => None,
            None => Some(PathBuf::from(&self.binary_location)),
        }
    }

    pub fn annotations(&self) -> &MemoryAnnotationCollection {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut MemoryAnnotationCollection {
        &mut self.annotations
    }

    pub fn properties(&self) -> &BTreeMap<String, JsonValue> {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut BTreeMap<String, JsonValue> {
        &mut self.properties
    }

    pub fn into_parts(self) -> (String, MemoryAnnotationCollection) {
        (self.binary_location, self.annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexnote_anno::AnnotationCollection;
    use hexnote_types::ByteBinary;
    use std::path::Path;

    fn notebook(location: &str) -> Notebook {
        Notebook::new(location, MemoryAnnotationCollection::new(8).unwrap())
    }

    #[test]
    fn for_binary_spans_binary() {
        let binary = ByteBinary::from(vec![0u8; 42]);
        let nb = Notebook::for_binary("data.bin", &binary).unwrap();
        assert_eq!(nb.annotations().root_group().range().length(), 42);
        assert_eq!(nb.binary_location(), "data.bin");
    }

    #[test]
    fn binary_path_resolution() {
        assert_eq!(
            notebook("file:///tmp/a.bin").binary_path().as_deref(),
            Some(Path::new("/tmp/a.bin"))
        );
        assert_eq!(
            notebook("rel/a.bin").binary_path().as_deref(),
            Some(Path::new("rel/a.bin"))
        );
        assert_eq!(notebook("http://example.com/a.bin").binary_path(), None);
    }
}
