use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use hexnote_notebook::StorageConfig;
use serde::{Deserialize, Serialize};

/// Settings read from the file passed with `--config`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub storage: StorageConfig,
    /// Structure definitions used by `drop` when `--structures` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structures: Option<PathBuf>,
}

impl CliConfig {
    /// Load `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        assert_eq!(CliConfig::load(None).unwrap(), CliConfig::default());
    }

    #[test]
    fn storage_table() {
        let config = CliConfig::parse(
            "[storage]\npretty = false\nfile_extension = \"hxn\"\n",
        )
        .unwrap();
        assert!(!config.storage.pretty);
        assert_eq!(config.storage.file_extension, "hxn");
        assert!(config.storage.validate_on_load);
    }

    #[test]
    fn structures_path() {
        let config = CliConfig::parse("structures = \"formats/riff.toml\"\n").unwrap();
        assert_eq!(config.structures, Some(PathBuf::from("formats/riff.toml")));
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(CliConfig::parse("").unwrap(), CliConfig::default());
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
