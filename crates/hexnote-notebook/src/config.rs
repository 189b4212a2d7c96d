use serde::{Deserialize, Serialize};

/// Settings for [`NotebookStorage`](crate::NotebookStorage).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Write indented JSON.
    pub pretty: bool,
    /// Extension of notebook files, without the dot.
    pub file_extension: String,
    /// Reject documents whose children are unsorted, overlapping, or stick
    /// out of their parent.
    pub validate_on_load: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            file_extension: "hex".to_string(),
            validate_on_load: true,
        }
    }
}

impl StorageConfig {
    /// Compact output and no load-time validation.
    pub fn lenient() -> Self {
        Self {
            pretty: false,
            validate_on_load: false,
            ..Default::default()
        }
    }
}
