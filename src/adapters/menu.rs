//! Menu model - ordered entries mirrored into a native menu.
//!
//! Menu-bearing containers (the application root, menu-button widgets)
//! accept id-keyed entry nodes just like list stores do, but the native
//! surface is a menu model rather than a list model, and the menubar itself
//! is shown only while at least one entry exists.

use crate::props::PropValue;
use crate::toolkit::capability::MenuHost;

#[derive(Debug, Clone)]
struct MenuEntry {
    id: String,
    label: String,
}

/// Ordered menu entries plus menubar visibility management.
#[derive(Debug, Default)]
pub struct MenuModel {
    entries: Vec<MenuEntry>,
}

impl MenuModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the menu has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of an entry id. Linear scan, same stance as the store.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// Append an entry; shows the menubar on the first one.
    pub fn append(&mut self, host: &dyn MenuHost, id: &str, value: &PropValue) {
        let label = value.display();
        host.insert_menu_entry(self.entries.len(), &label);
        self.entries.push(MenuEntry {
            id: id.to_string(),
            label,
        });
        host.set_menubar_visible(true);
    }

    /// Insert before an existing entry; a missing anchor appends.
    pub fn insert_before(&mut self, host: &dyn MenuHost, id: &str, value: &PropValue, before_id: &str) {
        let Some(index) = self.position(before_id) else {
            self.append(host, id, value);
            return;
        };

        let label = value.display();
        host.insert_menu_entry(index, &label);
        self.entries.insert(
            index,
            MenuEntry {
                id: id.to_string(),
                label,
            },
        );
        host.set_menubar_visible(true);
    }

    /// Remove an entry; hides the menubar when the last one goes.
    pub fn remove(&mut self, host: &dyn MenuHost, id: &str) {
        if let Some(index) = self.position(id) {
            host.remove_menu_entry(index);
            self.entries.remove(index);
            if self.entries.is_empty() {
                host.set_menubar_visible(false);
            }
        }
    }

    /// Relabel an entry in place.
    pub fn update(&mut self, host: &dyn MenuHost, id: &str, value: &PropValue) {
        if let Some(index) = self.position(id) {
            let label = value.display();
            host.update_menu_entry(index, &label);
            self.entries[index].label = label;
        }
    }

    /// Rename an entry id while keeping its position.
    pub fn rename(&mut self, id: &str, new_id: &str) {
        if let Some(index) = self.position(id) {
            self.entries[index].id = new_id.to_string();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
