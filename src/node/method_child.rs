//! Method-child nodes.
//!
//! Some ancestors expose no general child API at all - action rows take
//! `add_prefix`/`add_suffix`, expander rows take `add_row`/`add_action`,
//! toolbar views take `add_top_bar`/`add_bottom_bar`. A method child
//! delegates attachment to exactly one of those named methods, selected by
//! its element type name; removal goes through the ancestor's generic
//! remove with a parent-identity guard.

use std::cell::RefCell;
use std::rc::Rc;

use crate::registry::AttachMethod;
use crate::scheduler::ScheduledCallback;
use crate::toolkit::Container;
use crate::toolkit::capability::Capabilities;

use super::Deferred;
use super::slot::release_from_host;

// =============================================================================
// Method Table
// =============================================================================

/// Capability an ancestor must advertise for a given attachment method.
pub(crate) fn required_capability(method: AttachMethod) -> Capabilities {
    match method {
        AttachMethod::Prefix | AttachMethod::Suffix => Capabilities::EDGE_ROWS,
        AttachMethod::Row | AttachMethod::Action => Capabilities::ROW_CHILDREN,
        AttachMethod::TopBar | AttachMethod::BottomBar => Capabilities::TOOLBAR_BARS,
    }
}

/// Invoke the named attachment method on the host.
fn invoke(host: &Container, method: AttachMethod, widget: &Container) {
    if !host.is_alive() {
        tracing::trace!(?host, "attach target already gone");
        return;
    }

    let handle = host.handle();
    match method {
        AttachMethod::Prefix => {
            if let Some(rows) = handle.as_edge_rows() {
                rows.add_prefix(widget);
            }
        }
        AttachMethod::Suffix => {
            if let Some(rows) = handle.as_edge_rows() {
                rows.add_suffix(widget);
            }
        }
        AttachMethod::Row => {
            if let Some(rows) = handle.as_rows() {
                rows.add_row(widget);
            }
        }
        AttachMethod::Action => {
            if let Some(rows) = handle.as_rows() {
                rows.add_action(widget);
            }
        }
        AttachMethod::TopBar => {
            if let Some(toolbar) = handle.as_toolbar() {
                toolbar.add_top_bar(widget);
            }
        }
        AttachMethod::BottomBar => {
            if let Some(toolbar) = handle.as_toolbar() {
                toolbar.add_bottom_bar(widget);
            }
        }
    }
}

// =============================================================================
// Method-Child State
// =============================================================================

struct PendingDetach {
    host: Container,
    widgets: Vec<Container>,
}

/// State of one method-child node.
pub(crate) struct MethodChildState {
    pub method: AttachMethod,
    pub host: Option<Container>,
    pub held: Vec<Container>,
    detach_all: ScheduledCallback,
    pending: Rc<RefCell<Option<PendingDetach>>>,
}

impl MethodChildState {
    pub fn new(method: AttachMethod) -> Self {
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
            method,
            host: None,
            held: Vec::new(),
            detach_all,
            pending,
        }
    }

    /// Gain or lose the ancestor. Mirrors the slot contract.
    pub fn set_parent(&mut self, host: Option<Container>, out: &mut Vec<Deferred>) {
        match host {
            Some(host) => {
                self.host = Some(host.clone());
                if !self.held.is_empty() {
                    let method = self.method;
                    let widgets = self.held.clone();
                    out.push(Deferred::Normal(ScheduledCallback::new(move || {
                        for widget in &widgets {
                            invoke(&host, method, widget);
                        }
                    })));
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

    /// Hold a new child widget; insertion order within the named region is
    /// whatever the native method produces, so "insert before" degrades to
    /// the same attach.
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
            let method = self.method;
            out.push(Deferred::Normal(ScheduledCallback::new(move || {
                invoke(&host, method, &widget);
            })));
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

    /// First held widget, as an insertion anchor for siblings.
    pub fn anchor_widget(&self) -> Option<Container> {
        self.held.first().cloned()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{CommitScheduler, Priority};
    use crate::toolkit::Toolkit;
    use crate::toolkit::headless::HeadlessToolkit;

    fn run(out: Vec<Deferred>) {
        let scheduler = CommitScheduler::new();
        for deferred in out {
            match deferred {
                Deferred::High(cb) => scheduler.schedule_after_commit(cb, Priority::High),
                Deferred::Normal(cb) => scheduler.schedule_after_commit(cb, Priority::Normal),
            }
        }
    }

    #[test]
    fn test_attaches_through_named_method() {
        let toolkit = HeadlessToolkit::new();
        let row = toolkit
            .create(&toolkit.lookup_class("AdwActionRow").unwrap())
            .unwrap();
        let icon = toolkit
            .create(&toolkit.lookup_class("GtkLabel").unwrap())
            .unwrap();

        let mut child = MethodChildState::new(AttachMethod::Prefix);
        let mut out = Vec::new();
        child.add_child(icon.clone(), None, &mut out);
        child.set_parent(Some(row.clone()), &mut out);
        run(out);

        assert_eq!(toolkit.region_of(&row, &icon), Some("prefix"));
    }

    #[test]
    fn test_losing_parent_detaches_held_widgets() {
        let toolkit = HeadlessToolkit::new();
        let toolbar = toolkit
            .create(&toolkit.lookup_class("AdwToolbarView").unwrap())
            .unwrap();
        let bar = toolkit
            .create(&toolkit.lookup_class("GtkHeaderBar").unwrap())
            .unwrap();

        let mut child = MethodChildState::new(AttachMethod::TopBar);
        let mut out = Vec::new();
        child.add_child(bar.clone(), None, &mut out);
        child.set_parent(Some(toolbar.clone()), &mut out);
        run(out);
        assert_eq!(toolkit.region_of(&toolbar, &bar), Some("top-bar"));

        let mut out = Vec::new();
        child.set_parent(None, &mut out);
        run(out);
        assert!(toolkit.parent_of(&bar).is_none());
    }

    #[test]
    fn test_required_capability_per_method() {
        assert_eq!(
            required_capability(AttachMethod::Prefix),
            Capabilities::EDGE_ROWS
        );
        assert_eq!(
            required_capability(AttachMethod::Action),
            Capabilities::ROW_CHILDREN
        );
        assert_eq!(
            required_capability(AttachMethod::BottomBar),
            Capabilities::TOOLBAR_BARS
        );
    }
}
