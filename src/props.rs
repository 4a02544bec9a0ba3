//! Props - ordered, immutable-per-update property bags.
//!
//! An element's props arrive as one bag per update and are never mutated in
//! place; updates are expressed as an ordered diff between the previous and
//! the next bag. Each node kind declares a set of *consumed* keys (slot
//! positions, item ids, page metadata) that are stripped before the rest is
//! forwarded to generic native property application, so structural keys never
//! leak into styling/attribute code.

use std::fmt;

// =============================================================================
// Prop Value
// =============================================================================

/// A single property value.
///
/// Closed, data-only: the declarative description carries no behavior.
/// Event handlers and render callbacks belong to the driving framework and
/// never cross into this engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl PropValue {
    /// Text rendering used for native list-entry labels and diagnostics.
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// =============================================================================
// Props
// =============================================================================

/// An ordered key → value bag.
///
/// Keys keep their declaration order, which the diff preserves. Lookup is a
/// linear scan: prop bags stay small (tens of keys), so an index map would
/// buy nothing here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    entries: Vec<(String, PropValue)>,
}

impl Props {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, replacing any existing value for the key
    /// without disturbing its position.
    pub fn with(mut self, key: &str, value: impl Into<PropValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace a value.
    pub fn set(&mut self, key: &str, value: impl Into<PropValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// String value for a key, if present and textual.
    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(PropValue::Text(v)) => Some(v),
            _ => None,
        }
    }

    /// Integer value for a key, if present and numeric.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(PropValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Float value for a key; integers coerce.
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(PropValue::Float(v)) => Some(*v),
            Some(PropValue::Int(v)) => Some(*v as f64),
            _ => None,
        }
    }

    /// Number of keys in the bag.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy of this bag without the given keys.
    ///
    /// Used to strip a node kind's consumed keys before forwarding the rest
    /// to native property application.
    pub fn without(&self, consumed: &[&str]) -> Props {
        Props {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| !consumed.contains(&k.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Check whether any of the given keys changed between two bags.
    pub fn any_changed(old: &Props, new: &Props, keys: &[&str]) -> bool {
        keys.iter().any(|key| old.get(key) != new.get(key))
    }
}

// =============================================================================
// Diff
// =============================================================================

/// One changed property: `Some` for added/updated, `None` for removed.
#[derive(Debug, Clone, PartialEq)]
pub struct PropChange {
    pub key: String,
    pub value: Option<PropValue>,
}

/// Ordered diff between two bags.
///
/// Added and updated keys come first, in the new bag's order; keys that
/// vanished follow, in the old bag's order, with `None` values so the native
/// layer can reset them.
pub fn diff(old: &Props, new: &Props) -> Vec<PropChange> {
    let mut changes = Vec::new();

    for (key, value) in new.iter() {
        if old.get(key) != Some(value) {
            changes.push(PropChange {
                key: key.to_string(),
                value: Some(value.clone()),
            });
        }
    }

    for (key, _) in old.iter() {
        if new.get(key).is_none() {
            changes.push(PropChange {
                key: key.to_string(),
                value: None,
            });
        }
    }

    changes
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut props = Props::new().with("a", 1).with("b", 2);
        props.set("a", 10);

        let keys: Vec<&str> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(props.get_int("a"), Some(10));
    }

    #[test]
    fn test_without_strips_consumed_keys() {
        let props = Props::new()
            .with("position", "start")
            .with("label", "Save")
            .with("sensitive", true);

        let stripped = props.without(&["position"]);
        assert!(stripped.get("position").is_none());
        assert_eq!(stripped.get_text("label"), Some("Save"));
        assert_eq!(stripped.len(), 2);
    }

    #[test]
    fn test_diff_orders_updates_before_removals() {
        let old = Props::new().with("a", 1).with("b", 2).with("c", 3);
        let new = Props::new().with("b", 2).with("c", 30).with("d", 4);

        let changes = diff(&old, &new);
        let keys: Vec<(&str, bool)> = changes
            .iter()
            .map(|c| (c.key.as_str(), c.value.is_some()))
            .collect();

        // "b" is unchanged and absent; updates in new order, removal last.
        assert_eq!(keys, vec![("c", true), ("d", true), ("a", false)]);
    }

    #[test]
    fn test_diff_empty_when_equal() {
        let props = Props::new().with("a", 1).with("b", "x");
        assert!(diff(&props, &props.clone()).is_empty());
    }

    #[test]
    fn test_get_float_coerces_ints() {
        let props = Props::new().with("value", 5);
        assert_eq!(props.get_float("value"), Some(5.0));
    }

    #[test]
    fn test_any_changed() {
        let old = Props::new().with("column", 0).with("row", 1);
        let new = Props::new().with("column", 0).with("row", 2);

        assert!(Props::any_changed(&old, &new, &["column", "row"]));
        assert!(!Props::any_changed(&old, &new, &["column"]));
    }
}
