//! Item nodes - id-keyed entries of model-backed collections.
//!
//! An item owns no native handle; it is one entry of the nearest ancestor's
//! store or menu model, identified by an application-supplied stable id.
//! Updates under the same id patch the native entry in place, which is what
//! keeps native list-entry identity (and cached row state) stable.

use crate::props::{PropValue, Props};
use crate::registry::ItemKind;

/// State of one item node.
pub(crate) struct ItemState {
    pub kind: ItemKind,
    pub id: String,
    pub value: PropValue,
}

impl ItemState {
    /// Keys this item kind consumes from the prop bag.
    pub fn consumed_keys(kind: ItemKind) -> &'static [&'static str] {
        match kind {
            ItemKind::Model => &["id", "item"],
            ItemKind::Menu => &["id", "label"],
        }
    }

    pub fn new(kind: ItemKind, props: &Props) -> Self {
        Self {
            kind,
            id: props.get_text("id").unwrap_or_default().to_string(),
            value: Self::value_from(kind, props),
        }
    }

    /// The backing value: the `item` prop for model entries, the `label`
    /// prop for menu entries.
    pub fn value_from(kind: ItemKind, props: &Props) -> PropValue {
        let key = match kind {
            ItemKind::Model => "item",
            ItemKind::Menu => "label",
        };
        props
            .get(key)
            .cloned()
            .unwrap_or_else(|| PropValue::Text(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_item_reads_id_and_item() {
        let props = Props::new().with("id", "b").with("item", "bravo");
        let item = ItemState::new(ItemKind::Model, &props);
        assert_eq!(item.id, "b");
        assert_eq!(item.value, PropValue::Text("bravo".to_string()));
    }

    #[test]
    fn test_menu_entry_reads_label() {
        let props = Props::new().with("id", "file").with("label", "File");
        let item = ItemState::new(ItemKind::Menu, &props);
        assert_eq!(item.value, PropValue::Text("File".to_string()));
    }

    #[test]
    fn test_missing_value_defaults_to_empty_text() {
        let item = ItemState::new(ItemKind::Model, &Props::new().with("id", "x"));
        assert_eq!(item.value, PropValue::Text(String::new()));
    }
}
