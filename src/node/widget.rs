//! Widget-backed node state and generic capability attachment.
//!
//! A widget node owns exactly one native handle for its whole lifetime. How
//! its children arrive is decided per child: container adapters handle the
//! specialized contracts, and everything else lands here - the generic
//! "what can this container do" dispatch over single-child, ordered-append
//! and the insertion variants.

use crate::adapters::Adapter;
use crate::error::{ChildOp, Error, Result};
use crate::scheduler::ScheduledCallback;
use crate::toolkit::Container;
use crate::toolkit::capability::Capabilities;

use super::Deferred;
use super::slot::release_from_host;

// =============================================================================
// Widget State
// =============================================================================

/// State of one widget-backed node.
pub(crate) struct WidgetState {
    pub container: Container,
    pub adapter: Option<Adapter>,
    /// Stored paged-stack callback that re-applies a parked
    /// visible-child-name after pages attach. Built lazily; re-scheduling
    /// it within one commit collapses to a single run.
    pub sync_visible: Option<ScheduledCallback>,
}

impl WidgetState {
    pub fn new(container: Container) -> Self {
        let adapter = Adapter::for_capabilities(container.capabilities());
        Self {
            container,
            adapter,
            sync_visible: None,
        }
    }

    /// Keys consumed by this widget's adapter, if any.
    pub fn consumed_keys(&self) -> &'static [&'static str] {
        match self.adapter {
            Some(Adapter::PagedStack(_)) => &["visible-child-name"],
            _ => &[],
        }
    }

    /// Accepted-child description for mismatch errors.
    pub fn expected_children(&self) -> &'static str {
        match &self.adapter {
            Some(adapter) => adapter.expected_children(),
            None => expected_for(self.container.capabilities()),
        }
    }
}

fn expected_for(caps: Capabilities) -> &'static str {
    if caps.contains(Capabilities::SINGLE_CHILD) {
        "a single widget child"
    } else if caps.contains(Capabilities::ORDERED_APPEND) {
        "widget children"
    } else {
        "no children (leaf widget)"
    }
}

// =============================================================================
// Generic Attachment
// =============================================================================

/// Schedule a generic widget-to-container attach.
///
/// The capability check happens now, synchronously, so a structural
/// mismatch surfaces at the call; only the native mutation is deferred.
/// `insert_before` against a container with no order-aware insertion
/// degrades to an append - documented behavior, logged, never an error.
pub(crate) fn plan_attach(
    parent: &Container,
    parent_type: &str,
    child: &Container,
    child_type: &str,
    anchor: Option<Container>,
    op: ChildOp,
    out: &mut Vec<Deferred>,
) -> Result<()> {
    let caps = parent.capabilities();
    let parent = parent.clone();
    let child = child.clone();

    if caps.contains(Capabilities::SINGLE_CHILD) {
        out.push(Deferred::Normal(ScheduledCallback::new(move || {
            if !parent.is_alive() {
                return;
            }
            if let Some(single) = parent.handle().as_single_child() {
                single.set_child(Some(&child));
            }
        })));
        return Ok(());
    }

    if caps.contains(Capabilities::ORDERED_APPEND) {
        let had_anchor = anchor.is_some();
        let ordered_anchor = anchor.filter(|_| {
            caps.intersects(Capabilities::ORDERED_INSERT | Capabilities::INDEXED_INSERT)
        });

        if op == ChildOp::Insert && had_anchor && ordered_anchor.is_none() {
            tracing::debug!(
                parent = parent_type,
                child = child_type,
                "container has no order-aware insertion, degrading to append"
            );
        }

        out.push(Deferred::Normal(ScheduledCallback::new(move || {
            if !parent.is_alive() {
                return;
            }
            let handle = parent.handle();
            match &ordered_anchor {
                Some(anchor) if handle.as_ordered_insert().is_some() => {
                    handle
                        .as_ordered_insert()
                        .expect("checked")
                        .insert_before(&child, anchor);
                }
                Some(anchor) if handle.as_indexed_insert().is_some() => {
                    // The anchor's index is read at flush time; a sibling
                    // removed by an earlier high-priority callback simply
                    // shifts the insertion point.
                    let index = anchor
                        .handle()
                        .as_indexed_row()
                        .and_then(|row| row.index());
                    match index {
                        Some(index) => handle
                            .as_indexed_insert()
                            .expect("checked")
                            .insert_at(&child, index),
                        None => {
                            if let Some(ordered) = handle.as_ordered() {
                                ordered.append(&child);
                            }
                        }
                    }
                }
                _ => {
                    if let Some(ordered) = handle.as_ordered() {
                        ordered.append(&child);
                    }
                }
            }
        })));
        return Ok(());
    }

    Err(Error::mismatch(
        op,
        child_type,
        parent_type,
        expected_for(caps),
    ))
}

/// Schedule a generic detach at high priority, with stale-handle guards.
pub(crate) fn plan_detach(parent: &Container, child: &Container, out: &mut Vec<Deferred>) {
    let parent = parent.clone();
    let child = child.clone();
    out.push(Deferred::High(ScheduledCallback::new(move || {
        release_from_host(&parent, &child);
    })));
}

/// Schedule a present call for a top-level handle.
pub(crate) fn plan_present(container: &Container, out: &mut Vec<Deferred>) {
    let container = container.clone();
    out.push(Deferred::Normal(ScheduledCallback::new(move || {
        if !container.is_alive() {
            return;
        }
        if let Some(presentable) = container.handle().as_presentable() {
            presentable.present();
        }
    })));
}

/// Schedule a close/destroy for a top-level handle at high priority.
pub(crate) fn plan_close(container: &Container, out: &mut Vec<Deferred>) {
    let container = container.clone();
    out.push(Deferred::High(ScheduledCallback::new(move || {
        if !container.is_alive() {
            return;
        }
        if let Some(presentable) = container.handle().as_presentable() {
            presentable.close();
        }
    })));
}

// =============================================================================
// Tests
// =============================================================================
