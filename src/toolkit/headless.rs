//! Headless backend - an in-memory implementation of the toolkit boundary.
//!
//! Stands in for a real display toolkit: it records parent/child relations,
//! attachment regions, list-model entries, marks, pages and property
//! applications so the test-suite can observe every native effect the engine
//! issues. Mirrors the native toolkit's strictness where it matters - a
//! widget can only ever have one parent, and attaching an already-parented
//! widget is a hard failure, which is exactly the condition the commit
//! scheduler's High/Normal ordering exists to prevent.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};
use crate::props::PropValue;
use crate::toolkit::capability::{
    Capabilities, EdgeRowHost, GridHost, IndexedInsert, IndexedRow, ItemModelHost, MarkHost,
    MenuHost, OrderedChildren, OrderedInsert, PackHost, PagedStackHost, Presentable,
    RemovableChildren, SingleChildHost, RowHost, ToolbarHost,
};
use crate::toolkit::{Container, NativeHandle, Toolkit, WidgetClass};
use crate::types::{EntryId, GridSpot, HandleId, MarkSpec, PageProps};

// =============================================================================
// Shared State
// =============================================================================

struct HeadlessState {
    next_handle: Cell<HandleId>,
    next_entry: Cell<EntryId>,
    classes: RefCell<HashMap<String, Capabilities>>,
    widgets: RefCell<HashMap<HandleId, Rc<HeadlessWidget>>>,
    root: RefCell<Option<Container>>,
    quit_requested: Cell<bool>,
}

impl HeadlessState {
    fn widget(&self, id: HandleId) -> Option<Rc<HeadlessWidget>> {
        self.widgets.borrow().get(&id).cloned()
    }

    fn container(&self, id: HandleId) -> Option<Container> {
        self.widget(id).map(|w| Container::new(w as Rc<dyn NativeHandle>))
    }
}

// =============================================================================
// Headless Widget
// =============================================================================

/// One recorded native widget.
pub struct HeadlessWidget {
    id: HandleId,
    class: String,
    caps: Capabilities,
    state: Weak<HeadlessState>,
    alive: Cell<bool>,
    parent: Cell<Option<HandleId>>,
    children: RefCell<Vec<HandleId>>,
    /// Attachment region per child, e.g. "prefix", "pack-end", "top-bar".
    regions: RefCell<Vec<(HandleId, &'static str)>>,
    cells: RefCell<Vec<(HandleId, GridSpot)>>,
    pages: RefCell<Vec<(HandleId, PageProps)>>,
    visible_page: Cell<Option<HandleId>>,
    entries: RefCell<Vec<(EntryId, String)>>,
    marks: RefCell<Vec<MarkSpec>>,
    menu: RefCell<Vec<String>>,
    menubar_visible: Cell<bool>,
    presented: Cell<u32>,
    applied: RefCell<Vec<(String, Option<PropValue>)>>,
}

impl HeadlessWidget {
    fn with_state<R>(&self, f: impl FnOnce(&HeadlessState) -> R) -> R {
        let state = self.state.upgrade().expect("headless state dropped");
        f(&state)
    }

    /// Attach a child at `index` (or the end), enforcing single-parent.
    ///
    /// A child already parented *here* is treated as a reorder and released
    /// first; a child parented anywhere else is a hard failure, exactly as
    /// a real toolkit rejects transient double-parent states.
    fn adopt(&self, child: &Container, index: Option<usize>) {
        self.release(child);
        self.with_state(|state| {
            let widget = state
                .widget(child.id())
                .expect("unknown headless widget attached");
            assert!(
                widget.parent.get().is_none(),
                "{child:?} attached while still parented"
            );
            widget.parent.set(Some(self.id));
        });

        let mut children = self.children.borrow_mut();
        match index {
            Some(index) if index <= children.len() => children.insert(index, child.id()),
            _ => children.push(child.id()),
        }
    }

    /// Detach a child if it is actually ours; stale requests no-op.
    fn release(&self, child: &Container) {
        let owned = self.with_state(|state| match state.widget(child.id()) {
            Some(widget) if widget.parent.get() == Some(self.id) => {
                widget.parent.set(None);
                true
            }
            _ => false,
        });

        if owned {
            self.children.borrow_mut().retain(|id| *id != child.id());
            self.regions.borrow_mut().retain(|(id, _)| *id != child.id());
            self.cells.borrow_mut().retain(|(id, _)| *id != child.id());
            self.pages.borrow_mut().retain(|(id, _)| *id != child.id());
            if self.visible_page.get() == Some(child.id()) {
                self.visible_page.set(None);
            }
        }
    }

    fn adopt_in_region(&self, child: &Container, region: &'static str) {
        self.adopt(child, None);
        self.regions.borrow_mut().push((child.id(), region));
    }

    /// Destroy this widget and release its subtree.
    fn destroy(&self) {
        if !self.alive.replace(false) {
            return;
        }

        if let Some(parent) = self.parent.get().and_then(|id| self.with_state(|s| s.widget(id))) {
            parent.release(&self.with_state(|s| s.container(self.id)).expect("self registered"));
        }

        let children: Vec<HandleId> = self.children.borrow_mut().drain(..).collect();
        self.regions.borrow_mut().clear();
        self.cells.borrow_mut().clear();
        self.pages.borrow_mut().clear();
        for id in children {
            if let Some(child) = self.with_state(|s| s.widget(id)) {
                child.parent.set(None);
                child.destroy();
            }
        }
    }
}

impl NativeHandle for HeadlessWidget {
    fn id(&self) -> HandleId {
        self.id
    }

    fn class_name(&self) -> &str {
        &self.class
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn parent(&self) -> Option<Container> {
        let parent = self.parent.get()?;
        self.with_state(|state| state.container(parent))
    }

    fn is_alive(&self) -> bool {
        self.alive.get()
    }

    fn as_ordered(&self) -> Option<&dyn OrderedChildren> {
        self.caps
            .contains(Capabilities::ORDERED_APPEND)
            .then_some(self as &dyn OrderedChildren)
    }

    fn as_ordered_insert(&self) -> Option<&dyn OrderedInsert> {
        self.caps
            .contains(Capabilities::ORDERED_INSERT)
            .then_some(self as &dyn OrderedInsert)
    }

    fn as_indexed_insert(&self) -> Option<&dyn IndexedInsert> {
        self.caps
            .contains(Capabilities::INDEXED_INSERT)
            .then_some(self as &dyn IndexedInsert)
    }

    fn as_indexed_row(&self) -> Option<&dyn IndexedRow> {
        Some(self as &dyn IndexedRow)
    }

    fn as_single_child(&self) -> Option<&dyn SingleChildHost> {
        self.caps
            .contains(Capabilities::SINGLE_CHILD)
            .then_some(self as &dyn SingleChildHost)
    }

    fn as_removable(&self) -> Option<&dyn RemovableChildren> {
        self.caps
            .contains(Capabilities::REMOVE)
            .then_some(self as &dyn RemovableChildren)
    }

    fn as_grid(&self) -> Option<&dyn GridHost> {
        self.caps
            .contains(Capabilities::GRID)
            .then_some(self as &dyn GridHost)
    }

    fn as_paged_stack(&self) -> Option<&dyn PagedStackHost> {
        self.caps
            .contains(Capabilities::PAGED_STACK)
            .then_some(self as &dyn PagedStackHost)
    }

    fn as_item_model(&self) -> Option<&dyn ItemModelHost> {
        self.caps
            .contains(Capabilities::ITEM_MODEL)
            .then_some(self as &dyn ItemModelHost)
    }

    fn as_edge_rows(&self) -> Option<&dyn EdgeRowHost> {
        self.caps
            .contains(Capabilities::EDGE_ROWS)
            .then_some(self as &dyn EdgeRowHost)
    }

    fn as_rows(&self) -> Option<&dyn RowHost> {
        self.caps
            .contains(Capabilities::ROW_CHILDREN)
            .then_some(self as &dyn RowHost)
    }

    fn as_toolbar(&self) -> Option<&dyn ToolbarHost> {
        self.caps
            .contains(Capabilities::TOOLBAR_BARS)
            .then_some(self as &dyn ToolbarHost)
    }

    fn as_pack(&self) -> Option<&dyn PackHost> {
        self.caps
            .contains(Capabilities::PACK_EDGES)
            .then_some(self as &dyn PackHost)
    }

    fn as_marks(&self) -> Option<&dyn MarkHost> {
        self.caps
            .contains(Capabilities::MARKS)
            .then_some(self as &dyn MarkHost)
    }

    fn as_menu(&self) -> Option<&dyn MenuHost> {
        self.caps
            .contains(Capabilities::MENU)
            .then_some(self as &dyn MenuHost)
    }

    fn as_presentable(&self) -> Option<&dyn Presentable> {
        self.caps
            .contains(Capabilities::PRESENT)
            .then_some(self as &dyn Presentable)
    }
}

// =============================================================================
// Capability Implementations
// =============================================================================

impl OrderedChildren for HeadlessWidget {
    fn append(&self, child: &Container) {
        self.adopt(child, None);
    }
}

impl OrderedInsert for HeadlessWidget {
    fn insert_before(&self, child: &Container, before: &Container) {
        // Release a reordered child before computing the index, so the
        // anchor's position reflects the post-removal list.
        self.release(child);
        let index = self
            .children
            .borrow()
            .iter()
            .position(|id| *id == before.id());
        self.adopt(child, index);
    }
}

impl IndexedInsert for HeadlessWidget {
    fn insert_at(&self, child: &Container, index: usize) {
        self.adopt(child, Some(index));
    }
}

impl IndexedRow for HeadlessWidget {
    fn index(&self) -> Option<usize> {
        let parent = self.parent.get()?;
        let parent = self.with_state(|state| state.widget(parent))?;
        let index = parent.children.borrow().iter().position(|id| *id == self.id);
        index
    }
}

impl SingleChildHost for HeadlessWidget {
    fn set_child(&self, child: Option<&Container>) {
        let previous: Vec<HandleId> = self.children.borrow().clone();
        for id in previous {
            if let Some(container) = self.with_state(|state| state.container(id)) {
                self.release(&container);
            }
        }
        if let Some(child) = child {
            self.adopt(child, None);
        }
    }
}

impl RemovableChildren for HeadlessWidget {
    fn remove(&self, child: &Container) {
        self.release(child);
    }
}

impl GridHost for HeadlessWidget {
    fn attach(&self, child: &Container, spot: &GridSpot) {
        self.adopt(child, None);
        self.cells.borrow_mut().push((child.id(), *spot));
    }

    fn detach(&self, child: &Container) {
        self.release(child);
    }
}

impl PagedStackHost for HeadlessWidget {
    fn add_page(&self, child: &Container, props: &PageProps) {
        self.adopt(child, None);
        self.pages.borrow_mut().push((child.id(), props.clone()));
    }

    fn insert_page_before(&self, child: &Container, props: &PageProps, before: &Container) {
        // Only notebook-like classes are order-aware; stacks fall back to
        // the trait default of appending.
        if !self.caps.contains(Capabilities::ORDERED_INSERT) {
            self.add_page(child, props);
            return;
        }

        self.release(child);
        let index = self
            .pages
            .borrow()
            .iter()
            .position(|(id, _)| *id == before.id());
        match index {
            Some(index) => {
                self.adopt(child, Some(index));
                self.pages.borrow_mut().insert(index, (child.id(), props.clone()));
            }
            None => self.add_page(child, props),
        }
    }

    fn remove_page(&self, child: &Container) {
        self.release(child);
    }

    fn update_page(&self, child: &Container, props: &PageProps) {
        let mut pages = self.pages.borrow_mut();
        if let Some(page) = pages.iter_mut().find(|(id, _)| *id == child.id()) {
            page.1 = props.clone();
        }
    }

    fn page_by_name(&self, name: &str) -> Option<Container> {
        let id = self
            .pages
            .borrow()
            .iter()
            .find(|(_, props)| props.name.as_deref() == Some(name))
            .map(|(id, _)| *id)?;
        self.with_state(|state| state.container(id))
    }

    fn show_page(&self, child: &Container) {
        self.visible_page.set(Some(child.id()));
    }
}

impl ItemModelHost for HeadlessWidget {
    fn insert_entry(&self, index: usize, label: &str) -> EntryId {
        let entry = self.with_state(|state| {
            let entry = state.next_entry.get();
            state.next_entry.set(entry + 1);
            entry
        });

        let mut entries = self.entries.borrow_mut();
        let index = index.min(entries.len());
        entries.insert(index, (entry, label.to_string()));
        entry
    }

    fn remove_entry(&self, index: usize) {
        let mut entries = self.entries.borrow_mut();
        if index < entries.len() {
            entries.remove(index);
        }
    }

    fn update_entry(&self, index: usize, label: &str) {
        let mut entries = self.entries.borrow_mut();
        if let Some(entry) = entries.get_mut(index) {
            entry.1 = label.to_string();
        }
    }

    fn entry_count(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl EdgeRowHost for HeadlessWidget {
    fn add_prefix(&self, child: &Container) {
        self.adopt_in_region(child, "prefix");
    }

    fn add_suffix(&self, child: &Container) {
        self.adopt_in_region(child, "suffix");
    }
}

impl RowHost for HeadlessWidget {
    fn add_row(&self, child: &Container) {
        self.adopt_in_region(child, "row");
    }

    fn add_action(&self, child: &Container) {
        self.adopt_in_region(child, "action");
    }
}

impl ToolbarHost for HeadlessWidget {
    fn add_top_bar(&self, child: &Container) {
        self.adopt_in_region(child, "top-bar");
    }

    fn add_bottom_bar(&self, child: &Container) {
        self.adopt_in_region(child, "bottom-bar");
    }
}

impl PackHost for HeadlessWidget {
    fn pack_start(&self, child: &Container) {
        self.adopt_in_region(child, "pack-start");
    }

    fn pack_end(&self, child: &Container) {
        self.adopt_in_region(child, "pack-end");
    }
}

impl MarkHost for HeadlessWidget {
    fn add_mark(&self, mark: &MarkSpec) {
        self.marks.borrow_mut().push(mark.clone());
    }

    fn remove_mark(&self, mark: &MarkSpec) {
        let mut marks = self.marks.borrow_mut();
        if let Some(index) = marks.iter().position(|m| m == mark) {
            marks.remove(index);
        }
    }
}

impl MenuHost for HeadlessWidget {
    fn insert_menu_entry(&self, index: usize, label: &str) {
        let mut menu = self.menu.borrow_mut();
        let index = index.min(menu.len());
        menu.insert(index, label.to_string());
    }

    fn remove_menu_entry(&self, index: usize) {
        let mut menu = self.menu.borrow_mut();
        if index < menu.len() {
            menu.remove(index);
        }
    }

    fn update_menu_entry(&self, index: usize, label: &str) {
        let mut menu = self.menu.borrow_mut();
        if let Some(entry) = menu.get_mut(index) {
            *entry = label.to_string();
        }
    }

    fn menu_entry_count(&self) -> usize {
        self.menu.borrow().len()
    }

    fn set_menubar_visible(&self, visible: bool) {
        self.menubar_visible.set(visible);
    }
}

impl Presentable for HeadlessWidget {
    fn present(&self) {
        self.presented.set(self.presented.get() + 1);
    }

    fn close(&self) {
        self.destroy();
    }
}

// =============================================================================
// Headless Toolkit
// =============================================================================

/// The in-memory toolkit.
///
/// # Example
///
/// ```
/// use graft::toolkit::headless::HeadlessToolkit;
/// use graft::toolkit::Toolkit;
///
/// let toolkit = HeadlessToolkit::new();
/// let class = toolkit.lookup_class("GtkBox").unwrap();
/// let parent = toolkit.create(&class).unwrap();
/// let child = toolkit.create(&toolkit.lookup_class("GtkLabel").unwrap()).unwrap();
///
/// parent.handle().as_ordered().unwrap().append(&child);
/// assert_eq!(toolkit.children_of(&parent), vec![child]);
/// ```
#[derive(Clone)]
pub struct HeadlessToolkit {
    state: Rc<HeadlessState>,
}

impl Default for HeadlessToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessToolkit {
    /// Create a toolkit with the default class table and a fresh
    /// application root.
    pub fn new() -> Self {
        let state = Rc::new(HeadlessState {
            next_handle: Cell::new(1),
            next_entry: Cell::new(1),
            classes: RefCell::new(HashMap::new()),
            widgets: RefCell::new(HashMap::new()),
            root: RefCell::new(None),
            quit_requested: Cell::new(false),
        });
        let toolkit = Self { state };
        toolkit.register_default_classes();

        let root_class = toolkit
            .lookup_class("GtkApplication")
            .expect("default class table");
        let root = toolkit.allocate(&root_class);
        *toolkit.state.root.borrow_mut() = Some(root);

        toolkit
    }

    /// Register (or replace) a class in the lookup table.
    pub fn register_class(&self, name: &str, capabilities: Capabilities) {
        self.state
            .classes
            .borrow_mut()
            .insert(name.to_string(), capabilities);
    }

    fn register_default_classes(&self) {
        use Capabilities as C;

        let classes: &[(&str, Capabilities)] = &[
            ("GtkApplication", C::TOP_LEVEL | C::MENU),
            ("GtkWindow", C::SINGLE_CHILD | C::REMOVE | C::PRESENT),
            ("AdwDialog", C::SINGLE_CHILD | C::REMOVE | C::PRESENT),
            ("GtkBox", C::ORDERED_APPEND | C::ORDERED_INSERT | C::REMOVE),
            ("GtkListBox", C::ORDERED_APPEND | C::INDEXED_INSERT | C::REMOVE),
            ("GtkButton", C::SINGLE_CHILD | C::REMOVE),
            ("GtkLabel", C::NONE),
            ("GtkGrid", C::GRID | C::REMOVE),
            ("GtkStack", C::PAGED_STACK | C::REMOVE),
            (
                "GtkNotebook",
                C::PAGED_STACK | C::ORDERED_INSERT | C::REMOVE,
            ),
            ("GtkHeaderBar", C::PACK_EDGES | C::REMOVE),
            ("GtkActionBar", C::PACK_EDGES | C::REMOVE),
            (
                "AdwToolbarView",
                C::TOOLBAR_BARS | C::SINGLE_CHILD | C::REMOVE,
            ),
            ("AdwActionRow", C::EDGE_ROWS | C::REMOVE),
            (
                "AdwExpanderRow",
                C::EDGE_ROWS | C::ROW_CHILDREN | C::REMOVE,
            ),
            ("GtkListView", C::ITEM_MODEL),
            ("GtkDropDown", C::ITEM_MODEL),
            ("GtkScale", C::MARKS),
            ("GtkCalendar", C::MARKS),
        ];

        for (name, caps) in classes {
            self.register_class(name, *caps);
        }
    }

    fn allocate(&self, class: &WidgetClass) -> Container {
        let id = self.state.next_handle.get();
        self.state.next_handle.set(id + 1);

        let widget = Rc::new(HeadlessWidget {
            id,
            class: class.name.clone(),
            caps: class.capabilities,
            state: Rc::downgrade(&self.state),
            alive: Cell::new(true),
            parent: Cell::new(None),
            children: RefCell::new(Vec::new()),
            regions: RefCell::new(Vec::new()),
            cells: RefCell::new(Vec::new()),
            pages: RefCell::new(Vec::new()),
            visible_page: Cell::new(None),
            entries: RefCell::new(Vec::new()),
            marks: RefCell::new(Vec::new()),
            menu: RefCell::new(Vec::new()),
            menubar_visible: Cell::new(false),
            presented: Cell::new(0),
            applied: RefCell::new(Vec::new()),
        });

        self.state.widgets.borrow_mut().insert(id, widget.clone());
        Container::new(widget as Rc<dyn NativeHandle>)
    }

    fn widget(&self, container: &Container) -> Rc<HeadlessWidget> {
        self.state
            .widget(container.id())
            .expect("container does not belong to this toolkit")
    }

    // =========================================================================
    // Observation (test support)
    // =========================================================================

    /// Ordered native children of a container.
    pub fn children_of(&self, container: &Container) -> Vec<Container> {
        let widget = self.widget(container);
        let ids: Vec<HandleId> = widget.children.borrow().clone();
        ids.iter()
            .filter_map(|id| self.state.container(*id))
            .collect()
    }

    /// Native parent of a container.
    pub fn parent_of(&self, container: &Container) -> Option<Container> {
        self.widget(container).parent()
    }

    /// Attachment region recorded for a child ("prefix", "pack-end", ...).
    pub fn region_of(&self, parent: &Container, child: &Container) -> Option<&'static str> {
        self.widget(parent)
            .regions
            .borrow()
            .iter()
            .find(|(id, _)| *id == child.id())
            .map(|(_, region)| *region)
    }

    /// Grid cell recorded for a child.
    pub fn cell_of(&self, parent: &Container, child: &Container) -> Option<GridSpot> {
        self.widget(parent)
            .cells
            .borrow()
            .iter()
            .find(|(id, _)| *id == child.id())
            .map(|(_, spot)| *spot)
    }

    /// Pages of a paged stack, in native order.
    pub fn pages_of(&self, container: &Container) -> Vec<(Container, PageProps)> {
        self.widget(container)
            .pages
            .borrow()
            .iter()
            .filter_map(|(id, props)| Some((self.state.container(*id)?, props.clone())))
            .collect()
    }

    /// Currently visible page of a paged stack.
    pub fn visible_page_of(&self, container: &Container) -> Option<Container> {
        let id = self.widget(container).visible_page.get()?;
        self.state.container(id)
    }

    /// List-model entries with their native identities.
    pub fn entries_of(&self, container: &Container) -> Vec<(EntryId, String)> {
        self.widget(container).entries.borrow().clone()
    }

    /// Marks recorded on a mark host.
    pub fn marks_of(&self, container: &Container) -> Vec<MarkSpec> {
        self.widget(container).marks.borrow().clone()
    }

    /// Menu entry labels in native order.
    pub fn menu_of(&self, container: &Container) -> Vec<String> {
        self.widget(container).menu.borrow().clone()
    }

    /// Whether the menubar is currently shown.
    pub fn menubar_visible(&self, container: &Container) -> bool {
        self.widget(container).menubar_visible.get()
    }

    /// How many times a presentable handle was presented.
    pub fn presented_count(&self, container: &Container) -> u32 {
        self.widget(container).presented.get()
    }

    /// Properties applied to a container, in application order.
    pub fn applied_to(&self, container: &Container) -> Vec<(String, Option<PropValue>)> {
        self.widget(container).applied.borrow().clone()
    }

    /// Number of live widgets currently attached to any parent.
    pub fn attached_count(&self) -> usize {
        self.state
            .widgets
            .borrow()
            .values()
            .filter(|w| w.alive.get() && w.parent.get().is_some())
            .count()
    }

    /// Whether quit was requested.
    pub fn quit_requested(&self) -> bool {
        self.state.quit_requested.get()
    }
}

impl Toolkit for HeadlessToolkit {
    fn lookup_class(&self, name: &str) -> Option<WidgetClass> {
        let capabilities = *self.state.classes.borrow().get(name)?;
        Some(WidgetClass {
            name: name.to_string(),
            capabilities,
        })
    }

    fn create(&self, class: &WidgetClass) -> Result<Container> {
        if self.state.classes.borrow().get(&class.name).is_none() {
            return Err(Error::Toolkit(format!("unknown class '{}'", class.name)));
        }
        Ok(self.allocate(class))
    }

    fn apply_property(
        &self,
        container: &Container,
        key: &str,
        value: Option<&PropValue>,
    ) -> Result<()> {
        self.widget(container)
            .applied
            .borrow_mut()
            .push((key.to_string(), value.cloned()));
        Ok(())
    }

    fn root(&self) -> Container {
        self.state
            .root
            .borrow()
            .clone()
            .expect("root created at construction")
    }

    fn quit(&self) {
        self.state.quit_requested.set(true);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn toolkit_and(class: &str) -> (HeadlessToolkit, Container) {
        let toolkit = HeadlessToolkit::new();
        let class = toolkit.lookup_class(class).unwrap();
        let container = toolkit.create(&class).unwrap();
        (toolkit, container)
    }

    fn label(toolkit: &HeadlessToolkit) -> Container {
        toolkit
            .create(&toolkit.lookup_class("GtkLabel").unwrap())
            .unwrap()
    }

    #[test]
    fn test_container_equality_is_handle_based() {
        let (toolkit, a) = toolkit_and("GtkBox");
        let a_again = toolkit.children_of(&toolkit.root());
        assert!(a_again.is_empty());

        let clone = a.clone();
        assert_eq!(a, clone);

        let b = toolkit
            .create(&toolkit.lookup_class("GtkBox").unwrap())
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_ordered_insert_before_missing_sibling_appends() {
        let (toolkit, parent) = toolkit_and("GtkBox");
        let a = label(&toolkit);
        let b = label(&toolkit);
        let ghost = label(&toolkit);

        parent.handle().as_ordered().unwrap().append(&a);
        parent
            .handle()
            .as_ordered_insert()
            .unwrap()
            .insert_before(&b, &ghost);

        assert_eq!(toolkit.children_of(&parent), vec![a, b]);
    }

    #[test]
    #[should_panic(expected = "still parented")]
    fn test_double_parent_is_rejected() {
        let (toolkit, parent) = toolkit_and("GtkBox");
        let other = toolkit
            .create(&toolkit.lookup_class("GtkBox").unwrap())
            .unwrap();
        let child = label(&toolkit);

        parent.handle().as_ordered().unwrap().append(&child);
        other.handle().as_ordered().unwrap().append(&child);
    }

    #[test]
    fn test_remove_of_foreign_child_is_noop() {
        let (toolkit, parent) = toolkit_and("GtkBox");
        let other = toolkit
            .create(&toolkit.lookup_class("GtkBox").unwrap())
            .unwrap();
        let child = label(&toolkit);

        parent.handle().as_ordered().unwrap().append(&child);
        other.handle().as_removable().unwrap().remove(&child);

        assert_eq!(toolkit.parent_of(&child), Some(parent));
    }

    #[test]
    fn test_single_child_replaces() {
        let (toolkit, button) = toolkit_and("GtkButton");
        let first = label(&toolkit);
        let second = label(&toolkit);

        button.handle().as_single_child().unwrap().set_child(Some(&first));
        button
            .handle()
            .as_single_child()
            .unwrap()
            .set_child(Some(&second));

        assert_eq!(toolkit.children_of(&button), vec![second]);
        assert!(toolkit.parent_of(&first).is_none());
    }

    #[test]
    fn test_entry_identity_survives_update() {
        let (toolkit, view) = toolkit_and("GtkListView");
        let model = view.handle().as_item_model().unwrap();

        let first = model.insert_entry(0, "a");
        model.insert_entry(1, "b");
        model.update_entry(0, "a2");

        let entries = toolkit.entries_of(&view);
        assert_eq!(entries[0], (first, "a2".to_string()));
        assert_eq!(model.entry_count(), 2);
    }

    #[test]
    fn test_notebook_page_insert_is_order_aware() {
        let (toolkit, notebook) = toolkit_and("GtkNotebook");
        let stack = notebook.handle().as_paged_stack().unwrap();
        let a = label(&toolkit);
        let b = label(&toolkit);
        let c = label(&toolkit);

        stack.add_page(&a, &PageProps::default());
        stack.add_page(&c, &PageProps::default());
        stack.insert_page_before(&b, &PageProps::default(), &c);

        let order: Vec<Container> = toolkit.pages_of(&notebook).into_iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn test_stack_page_insert_degrades_to_append() {
        let (toolkit, stack_widget) = toolkit_and("GtkStack");
        let stack = stack_widget.handle().as_paged_stack().unwrap();
        let a = label(&toolkit);
        let b = label(&toolkit);

        stack.add_page(&a, &PageProps::default());
        stack.insert_page_before(&b, &PageProps::default(), &a);

        let order: Vec<Container> = toolkit
            .pages_of(&stack_widget)
            .into_iter()
            .map(|(c, _)| c)
            .collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_close_releases_subtree() {
        let (toolkit, window) = toolkit_and("GtkWindow");
        let child = label(&toolkit);
        window.handle().as_single_child().unwrap().set_child(Some(&child));
        assert_eq!(toolkit.attached_count(), 1);

        window.handle().as_presentable().unwrap().close();
        assert!(!window.is_alive());
        assert_eq!(toolkit.attached_count(), 0);
    }
}
