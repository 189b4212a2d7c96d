//! Per-annotation attribute maps.

use std::collections::BTreeMap;

use hexnote_types::ParametricStyle;
use serde_json::Value as JsonValue;

use crate::error::{AnnoError, AnnoResult};

/// Keys with a fixed meaning in persisted annotations. They cannot be used
/// for custom attributes.
pub const RESERVED_KEYS: &[&str] = &[
    "kind",
    "position",
    "length",
    "note",
    "style",
    "interpreter",
    "children",
];

/// The attributes attached to one annotation: an optional note, an optional
/// custom style, and any number of custom entries.
///
/// Custom entries hold arbitrary JSON payloads so that attributes written by
/// newer tools survive a read-modify-write cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes {
    note: Option<String>,
    style: Option<ParametricStyle>,
    custom: BTreeMap<String, JsonValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Set the note. An empty string clears it.
    pub fn set_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        self.note = if note.is_empty() { None } else { Some(note) };
    }

    pub fn clear_note(&mut self) {
        self.note = None;
    }

    pub fn style(&self) -> Option<&ParametricStyle> {
        self.style.as_ref()
    }

    pub fn set_style(&mut self, style: Option<ParametricStyle>) {
        self.style = style;
    }

    pub fn custom(&self, key: &str) -> Option<&JsonValue> {
        self.custom.get(key)
    }

    /// Set a custom attribute, returning the previous value.
    pub fn set_custom(
        &mut self,
        key: impl Into<String>,
        value: JsonValue,
    ) -> AnnoResult<Option<JsonValue>> {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(AnnoError::UnsupportedMutation(format!(
                "attribute key {key:?} is reserved"
            )));
        }
        Ok(self.custom.insert(key, value))
    }

    pub fn remove_custom(&mut self, key: &str) -> Option<JsonValue> {
        self.custom.remove(key)
    }

    /// Custom entries in key order.
    pub fn custom_entries(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.custom.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.note.is_none() && self.style.is_none() && self.custom.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexnote_types::{Color, StrokeStyle};
    use serde_json::json;

    #[test]
    fn empty_note_clears() {
        let mut attrs = Attributes::new();
        attrs.set_note("Test");
        assert_eq!(attrs.note(), Some("Test"));
        attrs.set_note("");
        assert_eq!(attrs.note(), None);
        assert!(attrs.is_empty());
    }

    #[test]
    fn style_is_stored() {
        let mut attrs = Attributes::new();
        let style = ParametricStyle::new(StrokeStyle::Dashed, Color::RED, Color::WHITE);
        attrs.set_style(Some(style));
        assert_eq!(attrs.style(), Some(&style));
    }

    #[test]
    fn custom_entries_replace_and_remove() {
        let mut attrs = Attributes::new();
        assert_eq!(attrs.set_custom("origin", json!("parser")).unwrap(), None);
        assert_eq!(
            attrs.set_custom("origin", json!({"tool": "dsl"})).unwrap(),
            Some(json!("parser"))
        );
        assert_eq!(attrs.custom("origin"), Some(&json!({"tool": "dsl"})));
        assert_eq!(attrs.remove_custom("origin"), Some(json!({"tool": "dsl"})));
        assert!(attrs.is_empty());
    }

    #[test]
    fn reserved_keys_are_rejected() {
        let mut attrs = Attributes::new();
        assert!(matches!(
            attrs.set_custom("note", json!("x")),
            Err(AnnoError::UnsupportedMutation(_))
        ));
        assert!(attrs.is_empty());
    }
}
