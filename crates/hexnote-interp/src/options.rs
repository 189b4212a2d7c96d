//! Interpreter configuration options.
//!
//! Every interpreter type declares an ordered list of [`OptionSpec`]s. The
//! concrete configuration of an interpreter instance is an [`OptionValues`]
//! map, which keeps its keys in declaration order so that persisted
//! documents list options the same way every time.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{InterpError, InterpResult};

/// The type an option value must have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptionType {
    Text,
    Integer,
    Boolean,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// A single option value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Boolean(bool),
    Integer(i64),
    Text(String),
}

impl OptionValue {
    /// The type of this value.
    pub fn option_type(&self) -> OptionType {
        match self {
            Self::Boolean(_) => OptionType::Boolean,
            Self::Integer(_) => OptionType::Integer,
            Self::Text(_) => OptionType::Text,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a value given on a command line or in a form field, guided by
    /// the expected type.
    pub fn parse_as(raw: &str, option_type: OptionType) -> Option<Self> {
        match option_type {
            OptionType::Text => Some(Self::Text(raw.to_string())),
            OptionType::Integer => raw.parse().ok().map(Self::Integer),
            OptionType::Boolean => raw.parse().ok().map(Self::Boolean),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Declaration of one configuration option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionSpec {
    /// Stable key used in persisted documents.
    pub key: &'static str,
    /// Label shown to users.
    pub display_name: &'static str,
    pub value_type: OptionType,
    pub default_value: OptionValue,
}

/// Ordered option key/value pairs.
///
/// Serializes as a map whose entries appear in insertion order, and keeps
/// document order when deserialized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionValues {
    entries: IndexMap<String, OptionValue>,
}

impl OptionValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check `self` against an interpreter's declared options and return a
    /// complete configuration in declaration order, with defaults filled in
    /// for omitted keys.
    pub fn resolve(&self, type_name: &str, specs: &[OptionSpec]) -> InterpResult<OptionValues> {
        if let Some(key) = self
            .entries
            .keys()
            .find(|key| !specs.iter().any(|spec| spec.key == key.as_str()))
        {
            return Err(InterpError::UnknownOption {
                type_name: type_name.to_string(),
                key: key.clone(),
            });
        }

        let mut resolved = OptionValues::new();
        for spec in specs {
            let value = self.get(spec.key).unwrap_or(&spec.default_value);
            if value.option_type() != spec.value_type {
                return Err(InterpError::InvalidOption {
                    key: spec.key.to_string(),
                    reason: format!(
                        "expected {}, got {}",
                        spec.value_type,
                        value.option_type()
                    ),
                });
            }
            resolved.insert(spec.key, value.clone());
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charset_spec() -> OptionSpec {
        OptionSpec {
            key: "charset",
            display_name: "Character Set",
            value_type: OptionType::Text,
            default_value: OptionValue::Text("UTF-8".into()),
        }
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut values = OptionValues::new().with("a", "1").with("b", "2");
        values.insert("a", "3");
        let keys: Vec<&str> = values.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(values.get("a"), Some(&OptionValue::Text("3".into())));
    }

    #[test]
    fn resolve_fills_defaults() {
        let resolved = OptionValues::new()
            .resolve("string", &[charset_spec()])
            .unwrap();
        assert_eq!(resolved.get("charset").and_then(|v| v.as_text()), Some("UTF-8"));
    }

    #[test]
    fn resolve_rejects_unknown_keys() {
        let err = OptionValues::new()
            .with("width", OptionValue::Integer(3))
            .resolve("string", &[charset_spec()])
            .unwrap_err();
        assert_eq!(
            err,
            InterpError::UnknownOption {
                type_name: "string".into(),
                key: "width".into()
            }
        );
    }

    #[test]
    fn resolve_rejects_mistyped_values() {
        let err = OptionValues::new()
            .with("charset", OptionValue::Integer(8))
            .resolve("string", &[charset_spec()])
            .unwrap_err();
        assert!(matches!(err, InterpError::InvalidOption { .. }));
    }

    #[test]
    fn serde_keeps_document_order() {
        let json = r#"{"zeta":"z","alpha":1,"mid":true}"#;
        let values: OptionValues = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = values.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(values.get("alpha"), Some(&OptionValue::Integer(1)));
        assert_eq!(values.get("mid"), Some(&OptionValue::Boolean(true)));
        assert_eq!(serde_json::to_string(&values).unwrap(), json);
    }

    #[test]
    fn duplicate_keys_keep_first_position() {
        let values: OptionValues = serde_json::from_str(r#"{"a":1,"b":2,"a":3}"#).unwrap();
        let keys: Vec<&str> = values.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(values.get("a"), Some(&OptionValue::Integer(3)));
    }

    #[test]
    fn parse_as_follows_type() {
        assert_eq!(
            OptionValue::parse_as("42", OptionType::Integer),
            Some(OptionValue::Integer(42))
        );
        assert_eq!(OptionValue::parse_as("nope", OptionType::Boolean), None);
    }
}
