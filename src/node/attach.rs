//! Child placement - the accepted-child policy and attach/detach dispatch.
//!
//! Every append/insert/remove funnels through here. The policy check runs
//! synchronously so a structurally invalid tree fails loudly at the call
//! site; the native mutations are planned under short borrows and handed to
//! the scheduler afterwards (detaches at high priority, attaches at
//! normal), which is what keeps a widget moving between parents from ever
//! being visible to the native toolkit in two places at once.

use crate::adapters::Adapter;
use crate::error::{ChildOp, Error, Result};
use crate::registry::{ItemKind, SlotKind};
use crate::scheduler::ScheduledCallback;
use crate::toolkit::Container;
use crate::toolkit::capability::Capabilities;
use crate::types::PageProps;

use super::method_child::required_capability;
use super::widget::{plan_attach, plan_close, plan_detach};
use super::{Deferred, KindTag, Node, NodeKind, OpCtx, schedule_all};

// =============================================================================
// Entry Points
// =============================================================================

pub(crate) fn append_child(parent: &Node, child: &Node, ctx: &OpCtx<'_>) -> Result<()> {
    place(parent, child, None, ChildOp::Append, ctx)
}

pub(crate) fn insert_before(
    parent: &Node,
    child: &Node,
    before: &Node,
    ctx: &OpCtx<'_>,
) -> Result<()> {
    place(parent, child, Some(before), ChildOp::Insert, ctx)
}

/// Remove a child. Removing a node that is not (or no longer) a child is an
/// idempotent no-op.
pub(crate) fn remove_child(parent: &Node, child: &Node, ctx: &OpCtx<'_>) -> Result<()> {
    let index = {
        let pinner = parent.inner();
        pinner.children.iter().position(|c| c.same_node(child))
    };
    let Some(index) = index else {
        tracing::trace!(
            parent = %parent.type_name(),
            child = %child.type_name(),
            "remove of a non-child, ignoring"
        );
        return Ok(());
    };

    let mut deferred = Vec::new();
    match parent.kind_tag() {
        KindTag::Widget => remove_from_widget(parent, child, &mut deferred)?,
        KindTag::Slot(_) | KindTag::MethodChild(_) => {
            remove_from_virtual(parent, child, &mut deferred)?;
        }
        // Items and marks never link children, so `index` above cannot
        // have matched.
        KindTag::Item(_) | KindTag::Mark(_) => unreachable!("leaf kinds hold no children"),
    }

    parent.inner_mut().children.remove(index);
    child.inner_mut().parent = None;
    schedule_all(ctx, deferred);
    Ok(())
}

// =============================================================================
// Placement
// =============================================================================

fn place(
    parent: &Node,
    child: &Node,
    before: Option<&Node>,
    op: ChildOp,
    ctx: &OpCtx<'_>,
) -> Result<()> {
    let mut deferred = Vec::new();

    match parent.kind_tag() {
        KindTag::Widget => place_into_widget(parent, child, before, op, &mut deferred)?,
        KindTag::Slot(_) | KindTag::MethodChild(_) => {
            place_into_virtual(parent, child, before, op, &mut deferred)?;
        }
        KindTag::Item(_) | KindTag::Mark(_) => {
            return Err(Error::mismatch(
                op,
                child.type_name(),
                parent.type_name(),
                "no children",
            ));
        }
    }

    link(parent, child, before);
    schedule_all(ctx, deferred);
    Ok(())
}

fn place_into_widget(
    parent: &Node,
    child: &Node,
    before: Option<&Node>,
    op: ChildOp,
    out: &mut Vec<Deferred>,
) -> Result<()> {
    let mut pinner = parent.inner_mut();
    let parent_type = pinner.type_name.clone();
    let NodeKind::Widget(ws) = &mut pinner.kind else {
        unreachable!("tag checked");
    };
    let container = ws.container.clone();
    let caps = container.capabilities();

    match child.kind_tag() {
        KindTag::Mark(_) => {
            if !caps.contains(Capabilities::MARKS) {
                return Err(Error::mismatch(
                    op,
                    child.type_name(),
                    parent_type,
                    ws.expected_children(),
                ));
            }
            let mut cinner = child.inner_mut();
            let NodeKind::Mark(mark) = &mut cinner.kind else {
                unreachable!("tag checked");
            };
            mark.apply(&container);
        }

        KindTag::Item(item_kind) => {
            let (id, value) = {
                let cinner = child.inner();
                let NodeKind::Item(item) = &cinner.kind else {
                    unreachable!("tag checked");
                };
                (item.id.clone(), item.value.clone())
            };
            let before_id = before.and_then(Node::item_id);

            match (&mut ws.adapter, item_kind) {
                (Some(Adapter::Store(store)), ItemKind::Model) => {
                    if let Some(model) = container.handle().as_item_model() {
                        match before_id {
                            Some(before_id) => {
                                store.insert_before(model, &id, value, &before_id);
                            }
                            None => store.append(model, &id, value),
                        }
                    }
                }
                (Some(Adapter::Menu(menu)), ItemKind::Menu) => {
                    if let Some(host) = container.handle().as_menu() {
                        match before_id {
                            Some(before_id) => {
                                menu.insert_before(host, &id, &value, &before_id);
                            }
                            None => menu.append(host, &id, &value),
                        }
                    }
                }
                _ => {
                    return Err(Error::mismatch(
                        op,
                        child.type_name(),
                        parent_type,
                        ws.expected_children(),
                    ));
                }
            }
        }

        KindTag::Slot(slot_kind) => {
            let required = match slot_kind {
                SlotKind::Cell => Capabilities::GRID,
                SlotKind::Page => Capabilities::PAGED_STACK,
                SlotKind::Pack(_) => Capabilities::PACK_EDGES,
            };
            if !caps.contains(required) {
                return Err(Error::mismatch(
                    op,
                    child.type_name(),
                    parent_type,
                    ws.expected_children(),
                ));
            }

            // The sync callback must run after the page attach; both are
            // Normal priority, so registration order decides.
            let sync = matches!(ws.adapter, Some(Adapter::PagedStack(_)))
                .then(|| visible_sync_callback(parent, ws));
            let anchor = before.and_then(Node::effective_widget);
            drop(pinner);

            let mut cinner = child.inner_mut();
            let NodeKind::Slot(slot) = &mut cinner.kind else {
                unreachable!("tag checked");
            };
            slot.set_parent(Some(container), anchor, out);
            if let Some(sync) = sync {
                out.push(Deferred::Normal(sync));
            }
        }

        KindTag::MethodChild(method) => {
            if !caps.contains(required_capability(method)) {
                return Err(Error::mismatch(
                    op,
                    child.type_name(),
                    parent_type,
                    ws.expected_children(),
                ));
            }
            drop(pinner);

            let mut cinner = child.inner_mut();
            let NodeKind::MethodChild(mc) = &mut cinner.kind else {
                unreachable!("tag checked");
            };
            mc.set_parent(Some(container), out);
        }

        KindTag::Widget => {
            let child_container = child.container().expect("widget child owns a container");

            if caps.contains(Capabilities::TOP_LEVEL) {
                // Top-level children have no structural attachment; the
                // driver presents them via mount().
            } else {
                match &ws.adapter {
                    None => {
                        let anchor = before.and_then(Node::effective_widget);
                        plan_attach(
                            &container,
                            &parent_type,
                            &child_container,
                            &child.type_name(),
                            anchor,
                            op,
                            out,
                        )?;
                    }
                    Some(Adapter::Bar) => {
                        let host = container.clone();
                        out.push(Deferred::Normal(ScheduledCallback::new(move || {
                            if !host.is_alive() {
                                return;
                            }
                            if let Some(pack) = host.handle().as_pack() {
                                pack.pack_start(&child_container);
                            }
                        })));
                    }
                    Some(Adapter::PagedStack(_)) => {
                        let sync = visible_sync_callback(parent, ws);
                        let host = container.clone();
                        out.push(Deferred::Normal(ScheduledCallback::new(move || {
                            if !host.is_alive() {
                                return;
                            }
                            if let Some(stack) = host.handle().as_paged_stack() {
                                stack.add_page(&child_container, &PageProps::default());
                            }
                        })));
                        out.push(Deferred::Normal(sync));
                    }
                    Some(
                        Adapter::Grid | Adapter::Rows | Adapter::Store(_) | Adapter::Menu(_),
                    ) => {
                        return Err(Error::mismatch(
                            op,
                            child.type_name(),
                            parent_type,
                            ws.expected_children(),
                        ));
                    }
                }
            }
        }
    }

    Ok(())
}

fn place_into_virtual(
    parent: &Node,
    child: &Node,
    before: Option<&Node>,
    op: ChildOp,
    out: &mut Vec<Deferred>,
) -> Result<()> {
    if child.kind_tag() != KindTag::Widget {
        return Err(Error::mismatch(
            op,
            child.type_name(),
            parent.type_name(),
            "a widget",
        ));
    }

    let widget = child.container().expect("widget child owns a container");
    let anchor = before.and_then(Node::effective_widget);

    let mut pinner = parent.inner_mut();
    match &mut pinner.kind {
        NodeKind::Slot(slot) => slot.add_child(widget, anchor.as_ref(), out),
        NodeKind::MethodChild(mc) => mc.add_child(widget, anchor.as_ref(), out),
        _ => unreachable!("tag checked"),
    }
    Ok(())
}

// =============================================================================
// Removal
// =============================================================================

fn remove_from_widget(parent: &Node, child: &Node, out: &mut Vec<Deferred>) -> Result<()> {
    let mut pinner = parent.inner_mut();
    let NodeKind::Widget(ws) = &mut pinner.kind else {
        unreachable!("tag checked");
    };
    let container = ws.container.clone();

    match child.kind_tag() {
        KindTag::Mark(_) => {
            drop(pinner);
            let mut cinner = child.inner_mut();
            let NodeKind::Mark(mark) = &mut cinner.kind else {
                unreachable!("tag checked");
            };
            mark.clear();
        }
        KindTag::Item(_) => {
            let id = child.item_id().expect("tag checked");
            match &mut ws.adapter {
                Some(Adapter::Store(store)) => {
                    if let Some(model) = container.handle().as_item_model() {
                        store.remove(model, &id);
                    }
                }
                Some(Adapter::Menu(menu)) => {
                    if let Some(host) = container.handle().as_menu() {
                        menu.remove(host, &id);
                    }
                }
                _ => {}
            }
        }
        KindTag::Slot(_) => {
            drop(pinner);
            let mut cinner = child.inner_mut();
            let NodeKind::Slot(slot) = &mut cinner.kind else {
                unreachable!("tag checked");
            };
            slot.set_parent(None, None, out);
        }
        KindTag::MethodChild(_) => {
            drop(pinner);
            let mut cinner = child.inner_mut();
            let NodeKind::MethodChild(mc) = &mut cinner.kind else {
                unreachable!("tag checked");
            };
            mc.set_parent(None, out);
        }
        KindTag::Widget => {
            let child_container = child.container().expect("widget child owns a container");
            if container.has(Capabilities::TOP_LEVEL) {
                plan_close(&child_container, out);
            } else {
                plan_detach(&container, &child_container, out);
            }
        }
    }

    Ok(())
}

fn remove_from_virtual(parent: &Node, child: &Node, out: &mut Vec<Deferred>) -> Result<()> {
    let Some(widget) = child.container() else {
        return Ok(());
    };

    let mut pinner = parent.inner_mut();
    match &mut pinner.kind {
        NodeKind::Slot(slot) => slot.remove_child(&widget, out),
        NodeKind::MethodChild(mc) => mc.remove_child(&widget, out),
        _ => unreachable!("tag checked"),
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Link the child into the parent's ordered child list, handling reorders
/// of an already-linked child.
fn link(parent: &Node, child: &Node, before: Option<&Node>) {
    let mut pinner = parent.inner_mut();
    if let Some(existing) = pinner.children.iter().position(|c| c.same_node(child)) {
        pinner.children.remove(existing);
    }

    let index = before.and_then(|b| pinner.children.iter().position(|c| c.same_node(b)));
    match index {
        Some(index) => pinner.children.insert(index, child.clone()),
        None => pinner.children.push(child.clone()),
    }
    drop(pinner);

    child.inner_mut().parent = Some(parent.downgrade());
}

/// The paged-stack's visible-child sync callback, created on first use.
/// The stored handle makes repeated scheduling within one commit collapse
/// into a single run after all page attachments of that commit.
fn visible_sync_callback(
    parent: &Node,
    ws: &mut super::widget::WidgetState,
) -> ScheduledCallback {
    if ws.sync_visible.is_none() {
        let weak = parent.downgrade();
        ws.sync_visible = Some(ScheduledCallback::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let Ok(mut inner) = inner.try_borrow_mut() else {
                return;
            };
            let NodeKind::Widget(ws) = &mut inner.kind else {
                return;
            };
            let container = ws.container.clone();
            if let Some(Adapter::PagedStack(ps)) = &mut ws.adapter {
                ps.apply_pending(&container);
            }
        }));
    }

    ws.sync_visible.clone().expect("just created")
}
