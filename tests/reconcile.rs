//! Driver-level reconciliation scenarios against the headless backend.

use std::rc::Rc;

use graft::driver::{DriverOptions, TreeDriver};
use graft::error::Error;
use graft::props::Props;
use graft::registry::TypeRegistry;
use graft::toolkit::capability::Capabilities;
use graft::toolkit::headless::HeadlessToolkit;
use graft::toolkit::{Container, Toolkit};
use graft::types::MarkSpec;
use graft::Node;

/// Opt-in diagnostics: `GRAFT_LOG=trace cargo test -- --nocapture`.
fn init_diagnostics() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("GRAFT_LOG"))
        .try_init();
}

fn fixture() -> (HeadlessToolkit, TreeDriver) {
    init_diagnostics();
    let toolkit = HeadlessToolkit::new();
    let driver = TreeDriver::create(
        Rc::new(toolkit.clone()),
        Rc::new(TypeRegistry::with_defaults()),
        DriverOptions::default(),
    )
    .unwrap();
    (toolkit, driver)
}

fn construct(driver: &TreeDriver, type_name: &str, props: Props) -> Node {
    driver.construct(type_name, props, None).unwrap()
}

fn containers(nodes: &[&Node]) -> Vec<Container> {
    nodes
        .iter()
        .map(|n| n.container().expect("widget node"))
        .collect()
}

// =============================================================================
// Sibling Order
// =============================================================================

#[test]
fn native_sibling_order_tracks_virtual_order() {
    let (toolkit, driver) = fixture();
    let parent = construct(&driver, "Box", Props::new());
    let a = construct(&driver, "Label", Props::new());
    let b = construct(&driver, "Label", Props::new());
    let c = construct(&driver, "Label", Props::new());
    let d = construct(&driver, "Label", Props::new());
    let pc = parent.container().unwrap();

    driver.append_child(&parent, &a).unwrap();
    assert_eq!(toolkit.children_of(&pc), containers(&[&a]));

    driver.append_child(&parent, &c).unwrap();
    assert_eq!(toolkit.children_of(&pc), containers(&[&a, &c]));

    driver.insert_before(&parent, &b, &c).unwrap();
    assert_eq!(toolkit.children_of(&pc), containers(&[&a, &b, &c]));

    driver.insert_before(&parent, &d, &a).unwrap();
    assert_eq!(toolkit.children_of(&pc), containers(&[&d, &a, &b, &c]));

    driver.remove_child(&parent, &a).unwrap();
    assert_eq!(toolkit.children_of(&pc), containers(&[&d, &b, &c]));

    // Reorder: move d before c.
    driver.insert_before(&parent, &d, &c).unwrap();
    assert_eq!(toolkit.children_of(&pc), containers(&[&b, &d, &c]));
    assert_eq!(parent.child_count(), 3);
}

#[test]
fn removing_a_node_twice_is_a_noop() {
    let (toolkit, driver) = fixture();
    let parent = construct(&driver, "Box", Props::new());
    let child = construct(&driver, "Label", Props::new());
    let pc = parent.container().unwrap();

    driver.append_child(&parent, &child).unwrap();
    driver.remove_child(&parent, &child).unwrap();
    driver.remove_child(&parent, &child).unwrap();

    assert!(toolkit.children_of(&pc).is_empty());
    assert_eq!(parent.child_count(), 0);
}

#[test]
fn list_box_insertion_goes_through_row_indices() {
    let (toolkit, driver) = fixture();
    let list = construct(&driver, "ListBox", Props::new());
    let a = construct(&driver, "Label", Props::new());
    let b = construct(&driver, "Label", Props::new());
    let c = construct(&driver, "Label", Props::new());
    let lc = list.container().unwrap();

    driver.append_child(&list, &a).unwrap();
    driver.append_child(&list, &c).unwrap();
    driver.insert_before(&list, &b, &c).unwrap();

    assert_eq!(toolkit.children_of(&lc), containers(&[&a, &b, &c]));
}

#[test]
fn insert_before_degrades_to_append_on_order_unaware_containers() {
    let (toolkit, driver) = fixture();
    toolkit.register_class(
        "PlainBin",
        Capabilities::ORDERED_APPEND | Capabilities::REMOVE,
    );

    let parent = construct(&driver, "PlainBin", Props::new());
    let a = construct(&driver, "Label", Props::new());
    let b = construct(&driver, "Label", Props::new());
    let pc = parent.container().unwrap();

    driver.append_child(&parent, &a).unwrap();
    driver.insert_before(&parent, &b, &a).unwrap();

    // Documented approximation: the insert landed at the end.
    assert_eq!(toolkit.children_of(&pc), containers(&[&a, &b]));
}

// =============================================================================
// Commit Batching
// =============================================================================

#[test]
fn native_mutations_wait_for_the_outermost_end_commit() {
    let (toolkit, driver) = fixture();
    let parent = construct(&driver, "Box", Props::new());
    let child = construct(&driver, "Label", Props::new());
    let pc = parent.container().unwrap();

    driver.begin_commit();
    driver.begin_commit();
    driver.append_child(&parent, &child).unwrap();

    // Virtual order is updated immediately; the native side is not.
    assert_eq!(parent.child_count(), 1);
    assert!(toolkit.children_of(&pc).is_empty());

    driver.end_commit();
    assert!(toolkit.children_of(&pc).is_empty());

    driver.end_commit();
    assert_eq!(toolkit.children_of(&pc), containers(&[&child]));
}

#[test]
fn cell_move_within_a_commit_detaches_before_reattaching() {
    let (toolkit, driver) = fixture();
    let grid = construct(&driver, "Grid", Props::new());
    let old_props = Props::new().with("column", 0).with("row", 0);
    let cell = construct(&driver, "Grid.Cell", old_props.clone());
    let widget = construct(&driver, "Label", Props::new());
    let gc = grid.container().unwrap();
    let wc = widget.container().unwrap();

    driver.append_child(&cell, &widget).unwrap();
    driver.append_child(&grid, &cell).unwrap();
    assert_eq!(toolkit.cell_of(&gc, &wc).map(|s| (s.column, s.row)), Some((0, 0)));

    // Within one commit, the high-priority detach must land before the
    // normal-priority reattach or the toolkit would see a double parent.
    let new_props = Props::new().with("column", 4).with("row", 1);
    driver.begin_commit();
    driver.commit_update(&cell, &old_props, &new_props).unwrap();
    driver.end_commit();

    assert_eq!(toolkit.cell_of(&gc, &wc).map(|s| (s.column, s.row)), Some((4, 1)));
    assert_eq!(toolkit.children_of(&gc), vec![wc]);
}

// =============================================================================
// Slots
// =============================================================================

#[test]
fn toolbar_slots_leave_no_orphans_after_unmount() {
    let (toolkit, driver) = fixture();
    let toolbar = construct(&driver, "ToolbarView", Props::new());
    let top = construct(&driver, "Toolbar.Top", Props::new());
    let bottom = construct(&driver, "Toolbar.Bottom", Props::new());
    let header = construct(&driver, "HeaderBar", Props::new());
    let status = construct(&driver, "Label", Props::new());
    let tc = toolbar.container().unwrap();

    driver.append_child(&top, &header).unwrap();
    driver.append_child(&bottom, &status).unwrap();
    driver.append_child(&toolbar, &top).unwrap();
    driver.append_child(&toolbar, &bottom).unwrap();

    assert_eq!(toolkit.region_of(&tc, &header.container().unwrap()), Some("top-bar"));
    assert_eq!(toolkit.region_of(&tc, &status.container().unwrap()), Some("bottom-bar"));
    assert_eq!(toolkit.attached_count(), 2);

    let window = construct(&driver, "Window", Props::new());
    driver.append_child(&window, &toolbar).unwrap();
    assert_eq!(toolkit.attached_count(), 3);

    driver.remove_child(&window, &toolbar).unwrap();

    // No native child of anything remains.
    assert_eq!(toolkit.attached_count(), 0);
}

#[test]
fn pack_slots_attach_to_their_edges() {
    let (toolkit, driver) = fixture();
    let bar = construct(&driver, "HeaderBar", Props::new());
    let start = construct(&driver, "Pack.Start", Props::new());
    let end = construct(&driver, "Pack.End", Props::new());
    let back = construct(&driver, "Button", Props::new());
    let menu = construct(&driver, "Button", Props::new());
    let bc = bar.container().unwrap();

    driver.append_child(&start, &back).unwrap();
    driver.append_child(&end, &menu).unwrap();
    driver.append_child(&bar, &start).unwrap();
    driver.append_child(&bar, &end).unwrap();

    assert_eq!(toolkit.region_of(&bc, &back.container().unwrap()), Some("pack-start"));
    assert_eq!(toolkit.region_of(&bc, &menu.container().unwrap()), Some("pack-end"));
}

#[test]
fn plain_children_of_a_bar_pack_at_the_start() {
    let (toolkit, driver) = fixture();
    let bar = construct(&driver, "ActionBar", Props::new());
    let button = construct(&driver, "Button", Props::new());
    let bc = bar.container().unwrap();

    driver.append_child(&bar, &button).unwrap();

    assert_eq!(toolkit.region_of(&bc, &button.container().unwrap()), Some("pack-start"));
}

#[test]
fn action_row_children_use_named_methods() {
    let (toolkit, driver) = fixture();
    let row = construct(&driver, "ActionRow", Props::new());
    let prefix = construct(&driver, "ActionRow.Prefix", Props::new());
    let suffix = construct(&driver, "ActionRow.Suffix", Props::new());
    let icon = construct(&driver, "Label", Props::new());
    let toggle = construct(&driver, "Button", Props::new());
    let rc = row.container().unwrap();

    driver.append_child(&prefix, &icon).unwrap();
    driver.append_child(&suffix, &toggle).unwrap();
    driver.append_child(&row, &prefix).unwrap();
    driver.append_child(&row, &suffix).unwrap();

    assert_eq!(toolkit.region_of(&rc, &icon.container().unwrap()), Some("prefix"));
    assert_eq!(toolkit.region_of(&rc, &toggle.container().unwrap()), Some("suffix"));
}

#[test]
fn slot_consumed_keys_never_reach_styling() {
    let (_toolkit, driver) = fixture();
    let cell = construct(
        &driver,
        "Grid.Cell",
        Props::new().with("column", 2).with("row", 3).with("hexpand", true),
    );

    let forwarded = cell.forwarded_props();
    assert!(forwarded.get("column").is_none());
    assert!(forwarded.get("row").is_none());
    assert_eq!(forwarded.len(), 1);
}

// =============================================================================
// Paged Stacks
// =============================================================================

#[test]
fn stack_pages_attach_with_metadata_and_visible_child_defers() {
    let (toolkit, driver) = fixture();
    let stack = construct(&driver, "Stack", Props::new());
    let sc = stack.container().unwrap();

    driver.begin_commit();
    let old = Props::new();
    let with_visible = Props::new().with("visible-child-name", "settings");
    driver.commit_update(&stack, &old, &with_visible).unwrap();

    let page = construct(
        &driver,
        "Stack.Page",
        Props::new().with("name", "settings").with("title", "Settings"),
    );
    let body = construct(&driver, "Label", Props::new());
    driver.append_child(&page, &body).unwrap();
    driver.append_child(&stack, &page).unwrap();
    driver.end_commit();

    let pages = toolkit.pages_of(&sc);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].1.name.as_deref(), Some("settings"));
    assert_eq!(pages[0].1.label(), "Settings");
    assert_eq!(toolkit.visible_page_of(&sc), body.container());
}

#[test]
fn notebook_page_insertion_is_order_aware() {
    let (toolkit, driver) = fixture();
    let notebook = construct(&driver, "Notebook", Props::new());
    let nc = notebook.container().unwrap();

    let mut bodies = Vec::new();
    let mut pages = Vec::new();
    for title in ["one", "three"] {
        let page = construct(&driver, "Notebook.Page", Props::new().with("title", title));
        let body = construct(&driver, "Label", Props::new());
        driver.append_child(&page, &body).unwrap();
        driver.append_child(&notebook, &page).unwrap();
        bodies.push(body);
        pages.push(page);
    }

    let two = construct(&driver, "Notebook.Page", Props::new().with("title", "two"));
    let two_body = construct(&driver, "Label", Props::new());
    driver.append_child(&two, &two_body).unwrap();
    driver.insert_before(&notebook, &two, &pages[1]).unwrap();

    let titles: Vec<String> = toolkit
        .pages_of(&nc)
        .into_iter()
        .map(|(_, props)| props.label().to_string())
        .collect();
    assert_eq!(titles, vec!["one", "two", "three"]);
}

#[test]
fn page_title_updates_in_place() {
    let (toolkit, driver) = fixture();
    let notebook = construct(&driver, "Notebook", Props::new());
    let old = Props::new().with("title", "Draft");
    let page = construct(&driver, "Notebook.Page", old.clone());
    let body = construct(&driver, "Label", Props::new());
    let nc = notebook.container().unwrap();

    driver.append_child(&page, &body).unwrap();
    driver.append_child(&notebook, &page).unwrap();

    let new = Props::new().with("title", "Final");
    driver.commit_update(&page, &old, &new).unwrap();

    let pages = toolkit.pages_of(&nc);
    assert_eq!(pages[0].1.label(), "Final");
    // Still the same native child, not a re-added page.
    assert_eq!(pages.len(), 1);
}

// =============================================================================
// Items and Stores
// =============================================================================

#[test]
fn store_mirrors_item_nodes_in_order() {
    let (toolkit, driver) = fixture();
    let view = construct(&driver, "ListView", Props::new());
    let vc = view.container().unwrap();

    let a = construct(&driver, "List.Item", Props::new().with("id", "a").with("item", "alpha"));
    let c = construct(&driver, "List.Item", Props::new().with("id", "c").with("item", "charlie"));
    let b = construct(&driver, "List.Item", Props::new().with("id", "b").with("item", "bravo"));

    driver.append_child(&view, &a).unwrap();
    driver.append_child(&view, &c).unwrap();
    driver.insert_before(&view, &b, &c).unwrap();

    let labels: Vec<String> = toolkit.entries_of(&vc).into_iter().map(|(_, l)| l).collect();
    assert_eq!(labels, vec!["alpha", "bravo", "charlie"]);

    driver.remove_child(&view, &c).unwrap();
    let labels: Vec<String> = toolkit.entries_of(&vc).into_iter().map(|(_, l)| l).collect();
    assert_eq!(labels, vec!["alpha", "bravo"]);
}

#[test]
fn item_value_update_keeps_native_entry_identity() {
    let (toolkit, driver) = fixture();
    let view = construct(&driver, "ListView", Props::new());
    let vc = view.container().unwrap();

    let old = Props::new().with("id", "b").with("item", "before");
    let item = construct(&driver, "List.Item", old.clone());
    driver.append_child(&view, &item).unwrap();

    let entry_before = toolkit.entries_of(&vc)[0].0;

    let new = Props::new().with("id", "b").with("item", "after");
    driver.commit_update(&item, &old, &new).unwrap();

    let entries = toolkit.entries_of(&vc);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0], (entry_before, "after".to_string()));
}

#[test]
fn appending_a_widget_to_an_item_container_is_a_structural_mismatch() {
    let (_toolkit, driver) = fixture();
    let view = construct(&driver, "ListView", Props::new());
    let label = construct(&driver, "Label", Props::new());

    let err = driver.append_child(&view, &label).unwrap_err();
    match err {
        Error::StructuralMismatch { ref child, ref parent, .. } => {
            assert_eq!(child, "Label");
            assert_eq!(parent, "ListView");
        }
        other => panic!("expected structural mismatch, got {other}"),
    }
    assert!(err.to_string().contains("cannot append 'Label' to 'ListView'"));
}

// =============================================================================
// Menus
// =============================================================================

#[test]
fn menu_entries_show_and_clear_the_menubar() {
    let (toolkit, driver) = fixture();
    let app = toolkit.root();

    let file = construct(&driver, "Menu.Entry", Props::new().with("id", "file").with("label", "File"));
    let help = construct(&driver, "Menu.Entry", Props::new().with("id", "help").with("label", "Help"));

    driver.append_child(driver.root(), &file).unwrap();
    driver.append_child(driver.root(), &help).unwrap();
    assert!(toolkit.menubar_visible(&app));
    assert_eq!(toolkit.menu_of(&app), vec!["File", "Help"]);

    driver.remove_child(driver.root(), &file).unwrap();
    driver.remove_child(driver.root(), &help).unwrap();
    assert!(!toolkit.menubar_visible(&app));
    assert!(toolkit.menu_of(&app).is_empty());
}

// =============================================================================
// Marks
// =============================================================================

#[test]
fn scale_marks_follow_their_node() {
    let (toolkit, driver) = fixture();
    let scale = construct(&driver, "Scale", Props::new());
    let sc = scale.container().unwrap();

    let old = Props::new().with("value", 0.25).with("label", "quarter");
    let mark = construct(&driver, "Scale.Mark", old.clone());
    driver.append_child(&scale, &mark).unwrap();
    assert_eq!(toolkit.marks_of(&sc).len(), 1);

    let new = Props::new().with("value", 0.75).with("label", "most");
    driver.commit_update(&mark, &old, &new).unwrap();
    match &toolkit.marks_of(&sc)[0] {
        MarkSpec::Scale { value, label, .. } => {
            assert_eq!(*value, 0.75);
            assert_eq!(label.as_deref(), Some("most"));
        }
        other => panic!("expected scale mark, got {other:?}"),
    }

    driver.remove_child(&scale, &mark).unwrap();
    assert!(toolkit.marks_of(&sc).is_empty());
}

#[test]
fn calendar_marks_attach_to_the_calendar() {
    let (toolkit, driver) = fixture();
    let calendar = construct(&driver, "Calendar", Props::new());
    let cc = calendar.container().unwrap();

    let mark = construct(&driver, "Calendar.Mark", Props::new().with("day", 14));
    driver.append_child(&calendar, &mark).unwrap();

    assert_eq!(toolkit.marks_of(&cc), vec![MarkSpec::Calendar { day: 14 }]);

    // A mark under a widget with no mark capability is rejected.
    let box_node = construct(&driver, "Box", Props::new());
    let stray = construct(&driver, "Calendar.Mark", Props::new().with("day", 1));
    let err = driver.append_child(&box_node, &stray).unwrap_err();
    assert!(err.to_string().starts_with("cannot append 'Calendar.Mark' to 'Box'"));
}

// =============================================================================
// Property Forwarding
// =============================================================================

#[test]
fn updates_forward_only_changed_unconsumed_props() {
    let (toolkit, driver) = fixture();
    let label = construct(&driver, "Label", Props::new().with("text", "a").with("dim", false));
    let lc = label.container().unwrap();
    let before = toolkit.applied_to(&lc).len();

    let old = Props::new().with("text", "a").with("dim", false);
    let new = Props::new().with("text", "b").with("dim", false);
    driver.commit_update(&label, &old, &new).unwrap();

    let applied = toolkit.applied_to(&lc);
    assert_eq!(applied.len(), before + 1);
    assert_eq!(applied.last().unwrap().0, "text");
}
