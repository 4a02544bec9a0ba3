//! Capability predicates - structural tests on native handles.
//!
//! Attach/detach logic never dispatches on a concrete container type. It
//! asks what a handle can *do*: accept an ordered append, hold a single
//! child, attach a grid cell, back a list model. Each capability is a flag
//! (cheap policy checks, registry matching) paired with a narrow trait (the
//! actual native calls). A handle advertises a flag if and only if its
//! wrapper hands out the matching trait, so one generic slot or item
//! implementation serves many unrelated native widget kinds without a shared
//! base class.

use crate::toolkit::Container;
use crate::types::{EntryId, GridSpot, MarkSpec, PageProps};

// =============================================================================
// Capability Flags
// =============================================================================

bitflags::bitflags! {
    /// Capability set advertised by a native class or handle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Capabilities: u32 {
        const NONE = 0;
        /// Ordered multi-child append.
        const ORDERED_APPEND = 1 << 0;
        /// Order-aware insertion before a sibling.
        const ORDERED_INSERT = 1 << 1;
        /// Index-addressed insertion (list-box style).
        const INDEXED_INSERT = 1 << 2;
        /// The handle itself is an indexable row of its parent.
        const INDEXED_ROW = 1 << 3;
        /// Single-child replace slot.
        const SINGLE_CHILD = 1 << 4;
        /// Child removal.
        const REMOVE = 1 << 5;
        /// Cell-addressed grid attachment.
        const GRID = 1 << 6;
        /// Named-page stack (stack, notebook).
        const PAGED_STACK = 1 << 7;
        /// List-model-backed item container.
        const ITEM_MODEL = 1 << 8;
        /// Prefix/suffix row attachment.
        const EDGE_ROWS = 1 << 9;
        /// Nested row / action attachment (expander rows).
        const ROW_CHILDREN = 1 << 10;
        /// Top/bottom toolbar bars.
        const TOOLBAR_BARS = 1 << 11;
        /// Pack-start/pack-end edges.
        const PACK_EDGES = 1 << 12;
        /// Scale ticks / calendar day highlights.
        const MARKS = 1 << 13;
        /// Native menu model.
        const MENU = 1 << 14;
        /// Present/close lifecycle (windows, dialogs).
        const PRESENT = 1 << 15;
        /// Accepts presentable top-level children (the application root).
        const TOP_LEVEL = 1 << 16;
    }
}

// =============================================================================
// Child Management
// =============================================================================

/// Ordered multi-child append.
pub trait OrderedChildren {
    fn append(&self, child: &Container);
}

/// Order-aware insertion before an existing sibling.
pub trait OrderedInsert {
    fn insert_before(&self, child: &Container, before: &Container);
}

/// Index-addressed insertion; pairs with [`IndexedRow`] on the sibling.
pub trait IndexedInsert {
    fn insert_at(&self, child: &Container, index: usize);
}

/// A handle that knows its row index within its parent.
pub trait IndexedRow {
    fn index(&self) -> Option<usize>;
}

/// Single-child replace slot.
pub trait SingleChildHost {
    fn set_child(&self, child: Option<&Container>);
}

/// Child removal.
///
/// Implementations tolerate a child that is no longer attached; the engine
/// additionally guards with a parent-identity check before calling in.
pub trait RemovableChildren {
    fn remove(&self, child: &Container);
}

// =============================================================================
// Container-Specific Attachment
// =============================================================================

/// Cell-addressed grid attachment.
pub trait GridHost {
    fn attach(&self, child: &Container, spot: &GridSpot);
    fn detach(&self, child: &Container);
}

/// Named-page stacks and notebooks.
pub trait PagedStackHost {
    fn add_page(&self, child: &Container, props: &PageProps);

    /// Order-aware page insertion. Containers without one (view stacks)
    /// inherit this default, which degrades to an ordinary add.
    fn insert_page_before(&self, child: &Container, props: &PageProps, _before: &Container) {
        self.add_page(child, props);
    }

    fn remove_page(&self, child: &Container);
    fn update_page(&self, child: &Container, props: &PageProps);
    fn page_by_name(&self, name: &str) -> Option<Container>;
    fn show_page(&self, child: &Container);
}

/// List-model entries addressed by index; identity of an entry survives
/// in-place updates.
pub trait ItemModelHost {
    fn insert_entry(&self, index: usize, label: &str) -> EntryId;
    fn remove_entry(&self, index: usize);
    fn update_entry(&self, index: usize, label: &str);
    fn entry_count(&self) -> usize;
}

/// Prefix/suffix rows (action-row style widgets).
pub trait EdgeRowHost {
    fn add_prefix(&self, child: &Container);
    fn add_suffix(&self, child: &Container);
}

/// Nested rows and action widgets (expander-row style widgets).
pub trait RowHost {
    fn add_row(&self, child: &Container);
    fn add_action(&self, child: &Container);
}

/// Top/bottom toolbar bars.
pub trait ToolbarHost {
    fn add_top_bar(&self, child: &Container);
    fn add_bottom_bar(&self, child: &Container);
}

/// Pack-start/pack-end edges (header bars, action bars).
pub trait PackHost {
    fn pack_start(&self, child: &Container);
    fn pack_end(&self, child: &Container);
}

/// Scale ticks and calendar day highlights, owned by the host's native API.
pub trait MarkHost {
    fn add_mark(&self, mark: &MarkSpec);
    fn remove_mark(&self, mark: &MarkSpec);
}

/// Ordered native menu model plus menubar visibility.
pub trait MenuHost {
    fn insert_menu_entry(&self, index: usize, label: &str);
    fn remove_menu_entry(&self, index: usize);
    fn update_menu_entry(&self, index: usize, label: &str);
    fn menu_entry_count(&self) -> usize;
    fn set_menubar_visible(&self, visible: bool);
}

/// Present/close lifecycle for top-level handles.
pub trait Presentable {
    fn present(&self);
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_flags_are_disjoint() {
        let all = Capabilities::all();
        assert!(all.contains(Capabilities::ORDERED_APPEND));
        assert!(all.contains(Capabilities::TOP_LEVEL));
        // Every declared flag is a distinct bit.
        assert_eq!(all.bits().count_ones(), 17);
    }

    #[test]
    fn test_capability_union_checks() {
        let caps = Capabilities::ORDERED_APPEND | Capabilities::REMOVE;
        assert!(caps.contains(Capabilities::ORDERED_APPEND));
        assert!(!caps.contains(Capabilities::SINGLE_CHILD));
        assert!(caps.intersects(Capabilities::REMOVE | Capabilities::GRID));
    }
}
