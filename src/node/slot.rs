//! Positional slot nodes.
//!
//! One contract covers every "named attachment point" pattern: a slot owns
//! no native handle, tracks its own ordered child widget list and a
//! reference to the capability-bearing ancestor. Gaining the ancestor
//! attaches everything currently held; losing it schedules a detach of
//! everything at high priority so destructive work lands before any
//! constructive callback from the same commit.

use std::cell::RefCell;
use std::rc::Rc;

use crate::props::Props;
use crate::registry::SlotKind;
use crate::scheduler::ScheduledCallback;
use crate::toolkit::Container;
use crate::types::{GridSpot, PackEdge, PageProps};

use super::Deferred;

// =============================================================================
// Host Calls
// =============================================================================

/// Attach one widget to a slot's ancestor according to the slot kind.
pub(crate) fn attach_to_host(
    host: &Container,
    kind: SlotKind,
    spot: &GridSpot,
    page: &PageProps,
    widget: &Container,
    before: Option<&Container>,
) {
    if !host.is_alive() {
        tracing::trace!(?host, "attach target already gone");
        return;
    }

    match kind {
        SlotKind::Cell => {
            if let Some(grid) = host.handle().as_grid() {
                grid.attach(widget, spot);
            }
        }
        SlotKind::Page => {
            if let Some(stack) = host.handle().as_paged_stack() {
                match before {
                    Some(before) => stack.insert_page_before(widget, page, before),
                    None => stack.add_page(widget, page),
                }
            }
        }
        SlotKind::Pack(edge) => {
            if let Some(pack) = host.handle().as_pack() {
                match edge {
                    PackEdge::Start => pack.pack_start(widget),
                    PackEdge::End => pack.pack_end(widget),
                }
            }
        }
    }
}

/// Detach one widget from an ancestor, tolerating handles that are already
/// gone or already re-parented elsewhere.
pub(crate) fn release_from_host(host: &Container, widget: &Container) {
    if !host.is_alive() || !widget.is_alive() {
        tracing::trace!(?widget, "detach target already gone");
        return;
    }
    if widget.parent().as_ref() != Some(host) {
        tracing::trace!(?widget, "detach target no longer attached here");
        return;
    }

    let handle = host.handle();
    if let Some(grid) = handle.as_grid() {
        grid.detach(widget);
    } else if let Some(stack) = handle.as_paged_stack() {
        stack.remove_page(widget);
    } else if let Some(removable) = handle.as_removable() {
        removable.remove(widget);
    } else if let Some(single) = handle.as_single_child() {
        single.set_child(None);
    }
}

// =============================================================================
// Slot State
// =============================================================================

struct PendingDetach {
    host: Container,
    widgets: Vec<Container>,
}

/// State of one positional slot node.
pub(crate) struct SlotState {
    pub kind: SlotKind,
    pub spot: GridSpot,
    pub page: PageProps,
    pub host: Option<Container>,
    pub held: Vec<Container>,
    /// One stored callback for "detach everything": re-scheduling it within
    /// a commit collapses to a single execution.
    detach_all: ScheduledCallback,
    pending: Rc<RefCell<Option<PendingDetach>>>,
}

impl SlotState {
    /// Keys this slot kind consumes from the prop bag.
    pub fn consumed_keys(kind: SlotKind) -> &'static [&'static str] {
        match kind {
            SlotKind::Cell => &["column", "row", "column-span", "row-span"],
            SlotKind::Page => &["name", "title"],
            SlotKind::Pack(_) => &[],
        }
    }

    pub fn new(kind: SlotKind, props: &Props) -> Self {
        let pending: Rc<RefCell<Option<PendingDetach>>> = Rc::new(RefCell::new(None));
        let detach_all = {
            let pending = pending.clone();
            ScheduledCallback::new(move || {
                if let Some(work) = pending.borrow_mut().take() {
                    for widget in &work.widgets {
                        release_from_host(&work.host, widget);
                    }
                }
            })
        };

        Self {
            kind,
            spot: grid_spot_from(props),
            page: page_props_from(props),
            host: None,
            held: Vec::new(),
            detach_all,
            pending,
        }
    }

    /// Gain or lose the capability-bearing ancestor.
    ///
    /// Setting a host attaches every held widget; clearing schedules a
    /// high-priority detach of the full held list.
    pub fn set_parent(
        &mut self,
        host: Option<Container>,
        anchor: Option<Container>,
        out: &mut Vec<Deferred>,
    ) {
        match host {
            Some(host) => {
                self.host = Some(host.clone());
                if !self.held.is_empty() {
                    out.push(Deferred::Normal(self.attach_callback(
                        host,
                        self.held.clone(),
                        anchor,
                    )));
                }
            }
            None => {
                if let Some(host) = self.host.take() {
                    *self.pending.borrow_mut() = Some(PendingDetach {
                        host,
                        widgets: self.held.clone(),
                    });
                    out.push(Deferred::High(self.detach_all.clone()));
                }
            }
        }
    }

    /// Hold a new child widget; attaches it if a host is present.
    pub fn add_child(
        &mut self,
        widget: Container,
        before: Option<&Container>,
        out: &mut Vec<Deferred>,
    ) {
        let index = before.and_then(|b| self.held.iter().position(|w| w == b));
        match index {
            Some(index) => self.held.insert(index, widget.clone()),
            None => self.held.push(widget.clone()),
        }

        if let Some(host) = self.host.clone() {
            out.push(Deferred::Normal(self.attach_callback(
                host,
                vec![widget],
                before.cloned(),
            )));
        }
    }

    /// Release a held child widget; idempotent.
    pub fn remove_child(&mut self, widget: &Container, out: &mut Vec<Deferred>) {
        let Some(index) = self.held.iter().position(|w| w == widget) else {
            return;
        };
        self.held.remove(index);

        if let Some(host) = self.host.clone() {
            let widget = widget.clone();
            out.push(Deferred::High(ScheduledCallback::new(move || {
                release_from_host(&host, &widget);
            })));
        }
    }

    /// Apply a prop update.
    ///
    /// A cell position change removes and re-adds the held widgets at the
    /// new cell rather than mutating in place; page metadata updates the
    /// native page directly.
    pub fn update_props(&mut self, old: &Props, new: &Props, out: &mut Vec<Deferred>) {
        match self.kind {
            SlotKind::Cell => {
                if Props::any_changed(old, new, Self::consumed_keys(SlotKind::Cell)) {
                    self.spot = grid_spot_from(new);
                    if let Some(host) = self.host.clone() {
                        for widget in self.held.clone() {
                            let detach_host = host.clone();
                            let detach_widget = widget.clone();
                            out.push(Deferred::High(ScheduledCallback::new(move || {
                                release_from_host(&detach_host, &detach_widget);
                            })));
                        }
                        out.push(Deferred::Normal(self.attach_callback(
                            host,
                            self.held.clone(),
                            None,
                        )));
                    }
                }
            }
            SlotKind::Page => {
                if Props::any_changed(old, new, Self::consumed_keys(SlotKind::Page)) {
                    self.page = page_props_from(new);
                    if let Some(host) = &self.host {
                        if let Some(stack) = host.handle().as_paged_stack() {
                            for widget in &self.held {
                                stack.update_page(widget, &self.page);
                            }
                        }
                    }
                }
            }
            SlotKind::Pack(_) => {}
        }
    }

    /// First held widget; stands in for this slot when a sibling needs an
    /// insertion anchor.
    pub fn anchor_widget(&self) -> Option<Container> {
        self.held.first().cloned()
    }

    fn attach_callback(
        &self,
        host: Container,
        widgets: Vec<Container>,
        anchor: Option<Container>,
    ) -> ScheduledCallback {
        let kind = self.kind;
        let spot = self.spot;
        let page = self.page.clone();
        ScheduledCallback::new(move || {
            for widget in &widgets {
                attach_to_host(&host, kind, &spot, &page, widget, anchor.as_ref());
            }
        })
    }
}

// =============================================================================
// Prop Extraction
// =============================================================================

fn grid_spot_from(props: &Props) -> GridSpot {
    GridSpot {
        column: props.get_int("column").unwrap_or(0) as i32,
        row: props.get_int("row").unwrap_or(0) as i32,
        column_span: props.get_int("column-span").unwrap_or(1) as i32,
        row_span: props.get_int("row-span").unwrap_or(1) as i32,
    }
}

fn page_props_from(props: &Props) -> PageProps {
    PageProps {
        name: props.get_text("name").map(str::to_string),
        title: props.get_text("title").map(str::to_string),
    }
}

// =============================================================================
// Tests
// =============================================================================
