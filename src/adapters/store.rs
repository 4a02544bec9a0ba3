//! Store - id-keyed backing state for model-driven collections.
//!
//! A store keeps two parallel ordered sequences in lockstep: the
//! application-side item values, keyed by application-supplied ids, and the
//! native list-model entries that render them. Ids are unique within a
//! store; order matches declaration order except where an explicit
//! insert-before reorders it.
//!
//! Lookups are linear scans. That is a deliberate scaling limit: these
//! stores back interactive lists, not data tables, and the constant factors
//! of an index map are not worth carrying here.

use crate::props::PropValue;
use crate::toolkit::capability::ItemModelHost;
use crate::types::EntryId;

/// One stored item and the native entry rendering it.
#[derive(Debug, Clone)]
struct StoreItem {
    id: String,
    value: PropValue,
    entry: EntryId,
}

/// Ordered id → value mapping mirrored into a native list model.
#[derive(Debug, Default)]
pub struct Store {
    items: Vec<StoreItem>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of an id. Linear scan.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Native entry identity behind an id.
    pub fn entry_id(&self, id: &str) -> Option<EntryId> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.entry)
    }

    /// Current value behind an id.
    pub fn value(&self, id: &str) -> Option<&PropValue> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| &item.value)
    }

    /// Append an item and its native entry.
    ///
    /// A duplicate id replaces the existing item in place instead of
    /// growing the store.
    pub fn append(&mut self, model: &dyn ItemModelHost, id: &str, value: PropValue) {
        if self.position(id).is_some() {
            tracing::debug!(id, "duplicate item id, updating in place");
            self.update(model, id, value);
            return;
        }

        let index = self.items.len();
        let entry = model.insert_entry(index, &value.display());
        self.items.push(StoreItem {
            id: id.to_string(),
            value,
            entry,
        });
    }

    /// Insert before an existing item; a missing anchor degrades to append.
    pub fn insert_before(
        &mut self,
        model: &dyn ItemModelHost,
        id: &str,
        value: PropValue,
        before_id: &str,
    ) {
        let Some(index) = self.position(before_id) else {
            self.append(model, id, value);
            return;
        };

        let entry = model.insert_entry(index, &value.display());
        self.items.insert(
            index,
            StoreItem {
                id: id.to_string(),
                value,
                entry,
            },
        );
    }

    /// Remove an item; unknown ids are a no-op.
    pub fn remove(&mut self, model: &dyn ItemModelHost, id: &str) {
        if let Some(index) = self.position(id) {
            model.remove_entry(index);
            self.items.remove(index);
        }
    }

    /// Replace the value behind an id in place.
    ///
    /// The native entry is updated, never recreated, so its identity (and
    /// any cached native rendering state) survives the update.
    pub fn update(&mut self, model: &dyn ItemModelHost, id: &str, value: PropValue) {
        if let Some(index) = self.position(id) {
            model.update_entry(index, &value.display());
            self.items[index].value = value;
        }
    }

    /// Rename an id while keeping its position and native entry.
    pub fn rename(&mut self, id: &str, new_id: &str) {
        if let Some(index) = self.position(id) {
            self.items[index].id = new_id.to_string();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::Toolkit;
    use crate::toolkit::headless::HeadlessToolkit;

    fn model() -> (HeadlessToolkit, crate::toolkit::Container) {
        let toolkit = HeadlessToolkit::new();
        let view = toolkit
            .create(&toolkit.lookup_class("GtkListView").unwrap())
            .unwrap();
        (toolkit, view)
    }

    #[test]
    fn test_append_then_remove_restores_length() {
        let (toolkit, view) = model();
        let host = view.handle();
        let mut store = Store::new();

        store.append(host.as_item_model().unwrap(), "a", "alpha".into());
        assert_eq!(toolkit.entries_of(&view).len(), 1);

        store.remove(host.as_item_model().unwrap(), "a");
        assert_eq!(toolkit.entries_of(&view).len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_before_keeps_relative_order_after_anchor_removal() {
        let (toolkit, view) = model();
        let host = view.handle();
        let mut store = Store::new();

        store.append(host.as_item_model().unwrap(), "a", "alpha".into());
        store.append(host.as_item_model().unwrap(), "y", "yankee".into());
        store.insert_before(host.as_item_model().unwrap(), "x", "xray".into(), "y");
        store.remove(host.as_item_model().unwrap(), "y");

        let labels: Vec<String> = toolkit
            .entries_of(&view)
            .into_iter()
            .map(|(_, label)| label)
            .collect();
        assert_eq!(labels, vec!["alpha", "xray"]);
        assert_eq!(store.position("x"), Some(1));
    }

    #[test]
    fn test_insert_before_missing_anchor_appends() {
        let (toolkit, view) = model();
        let host = view.handle();
        let mut store = Store::new();

        store.append(host.as_item_model().unwrap(), "a", "alpha".into());
        store.insert_before(host.as_item_model().unwrap(), "b", "bravo".into(), "ghost");

        let labels: Vec<String> = toolkit
            .entries_of(&view)
            .into_iter()
            .map(|(_, label)| label)
            .collect();
        assert_eq!(labels, vec!["alpha", "bravo"]);
    }

    #[test]
    fn test_update_preserves_entry_identity() {
        let (toolkit, view) = model();
        let host = view.handle();
        let mut store = Store::new();

        store.append(host.as_item_model().unwrap(), "b", "before".into());
        let entry = store.entry_id("b").unwrap();

        store.update(host.as_item_model().unwrap(), "b", "after".into());

        assert_eq!(store.entry_id("b"), Some(entry));
        let entries = toolkit.entries_of(&view);
        assert_eq!(entries[0], (entry, "after".to_string()));
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let (toolkit, view) = model();
        let host = view.handle();
        let mut store = Store::new();

        store.append(host.as_item_model().unwrap(), "a", "alpha".into());
        store.remove(host.as_item_model().unwrap(), "a");
        store.remove(host.as_item_model().unwrap(), "a");

        assert_eq!(toolkit.entries_of(&view).len(), 0);
    }

    #[test]
    fn test_rename_keeps_position_and_entry() {
        let (_toolkit, view) = model();
        let host = view.handle();
        let mut store = Store::new();

        store.append(host.as_item_model().unwrap(), "a", "alpha".into());
        store.append(host.as_item_model().unwrap(), "b", "bravo".into());
        let entry = store.entry_id("a").unwrap();

        store.rename("a", "a2");

        assert_eq!(store.position("a2"), Some(0));
        assert_eq!(store.entry_id("a2"), Some(entry));
        assert!(store.position("a").is_none());
    }
}
