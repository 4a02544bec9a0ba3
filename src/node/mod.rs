//! Node hierarchy - the mutable structural units mirroring elements.
//!
//! A node is created once per element identity and lives until the driving
//! framework discards it: `Created → Initialized → Mounted → Updated* →
//! Unmounted`. Kinds form a closed enum - widget-backed, slot, item,
//! method-child, mark - with exhaustive matching at every dispatch point;
//! there is no open subclassing. A native handle, once allocated, belongs
//! to exactly one widget node until detachment; virtual kinds never own a
//! handle, only references used to issue attach/detach calls.

pub(crate) mod attach;
pub(crate) mod item;
pub(crate) mod mark;
pub(crate) mod method_child;
pub(crate) mod slot;
pub(crate) mod widget;

use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::adapters::Adapter;
use crate::error::Result;
use crate::props::{self, Props};
use crate::registry::{AttachMethod, Blueprint, ItemKind, MarkKind, SlotKind};
use crate::scheduler::{CommitScheduler, Priority, ScheduledCallback};
use crate::toolkit::{Container, ToolkitRef};
use crate::types::NodeState;

use item::ItemState;
use mark::MarkState;
use method_child::MethodChildState;
use slot::SlotState;
use widget::WidgetState;

// =============================================================================
// Operation Context
// =============================================================================

/// Everything a node operation needs from the driver: the toolkit for
/// property application and the scheduler for deferred native mutations.
pub(crate) struct OpCtx<'a> {
    pub toolkit: &'a ToolkitRef,
    pub scheduler: &'a Rc<CommitScheduler>,
}

/// A native mutation planned under a borrow and scheduled after it drops.
pub(crate) enum Deferred {
    High(ScheduledCallback),
    Normal(ScheduledCallback),
}

/// Hand planned mutations to the scheduler. Callers must not hold any node
/// borrow here: outside a commit the callbacks run on the spot.
pub(crate) fn schedule_all(ctx: &OpCtx<'_>, deferred: Vec<Deferred>) {
    for entry in deferred {
        match entry {
            Deferred::High(cb) => ctx.scheduler.schedule_after_commit(cb, Priority::High),
            Deferred::Normal(cb) => ctx.scheduler.schedule_after_commit(cb, Priority::Normal),
        }
    }
}

// =============================================================================
// Node Kinds
// =============================================================================

pub(crate) enum NodeKind {
    Widget(WidgetState),
    Slot(SlotState),
    Item(ItemState),
    MethodChild(MethodChildState),
    Mark(MarkState),
}

/// Copyable tag of a node kind, for dispatch without holding a borrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KindTag {
    Widget,
    Slot(SlotKind),
    Item(ItemKind),
    MethodChild(AttachMethod),
    Mark(MarkKind),
}

impl NodeKind {
    fn tag(&self) -> KindTag {
        match self {
            NodeKind::Widget(_) => KindTag::Widget,
            NodeKind::Slot(slot) => KindTag::Slot(slot.kind),
            NodeKind::Item(item) => KindTag::Item(item.kind),
            NodeKind::MethodChild(mc) => KindTag::MethodChild(mc.method),
            NodeKind::Mark(mark) => KindTag::Mark(mark.kind),
        }
    }

    /// Keys this kind strips from the prop bag before generic native
    /// property application.
    fn consumed_keys(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Widget(ws) => ws.consumed_keys(),
            NodeKind::Slot(slot) => SlotState::consumed_keys(slot.kind),
            NodeKind::Item(item) => ItemState::consumed_keys(item.kind),
            NodeKind::MethodChild(_) => &[],
            NodeKind::Mark(mark) => MarkState::consumed_keys(mark.kind),
        }
    }
}

// =============================================================================
// Node
// =============================================================================

pub(crate) struct NodeInner {
    pub type_name: String,
    pub props: Props,
    pub state: NodeState,
    pub parent: Option<Weak<RefCell<NodeInner>>>,
    pub children: Vec<Node>,
    pub kind: NodeKind,
}

/// Shared handle to one node. Cloning is cheap; identity is allocation
/// identity, and the parent's child list holds the owning clones.
#[derive(Clone)]
pub struct Node {
    inner: Rc<RefCell<NodeInner>>,
}

impl Node {
    /// Build a node from a resolved blueprint.
    ///
    /// Widget blueprints allocate their native handle here (or bind the
    /// existing container when the driver wraps one) and apply the initial
    /// non-consumed props; virtual kinds extract their structural props and
    /// allocate nothing.
    pub(crate) fn create(
        blueprint: Blueprint,
        type_name: &str,
        props: Props,
        existing: Option<Container>,
        ctx: &OpCtx<'_>,
    ) -> Result<Node> {
        let kind = match blueprint {
            Blueprint::Widget(class) => {
                let container = match existing {
                    Some(container) => container,
                    None => ctx.toolkit.create(&class)?,
                };
                let mut ws = WidgetState::new(container);

                if let Some(Adapter::PagedStack(ps)) = &mut ws.adapter {
                    if let Some(name) = props.get_text("visible-child-name") {
                        ps.set_visible(&ws.container, name);
                    }
                }

                let consumed = ws.consumed_keys();
                for (key, value) in props.iter() {
                    if consumed.contains(&key) {
                        continue;
                    }
                    ctx.toolkit.apply_property(&ws.container, key, Some(value))?;
                }

                NodeKind::Widget(ws)
            }
            Blueprint::Slot(kind) => NodeKind::Slot(SlotState::new(kind, &props)),
            Blueprint::Item(kind) => NodeKind::Item(ItemState::new(kind, &props)),
            Blueprint::MethodChild(method) => NodeKind::MethodChild(MethodChildState::new(method)),
            Blueprint::Mark(kind) => NodeKind::Mark(MarkState::new(kind, &props)),
        };

        tracing::debug!(type_name, "node initialized");

        Ok(Node {
            inner: Rc::new(RefCell::new(NodeInner {
                type_name: type_name.to_string(),
                props,
                state: NodeState::Initialized,
                parent: None,
                children: Vec::new(),
                kind,
            })),
        })
    }

    pub(crate) fn inner(&self) -> Ref<'_, NodeInner> {
        self.inner.borrow()
    }

    pub(crate) fn inner_mut(&self) -> RefMut<'_, NodeInner> {
        self.inner.borrow_mut()
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<NodeInner>> {
        Rc::downgrade(&self.inner)
    }

    /// Allocation identity.
    pub fn same_node(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Declared element type name.
    pub fn type_name(&self) -> String {
        self.inner().type_name.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> NodeState {
        self.inner().state
    }

    /// The current prop bag, as last committed.
    pub fn props(&self) -> Props {
        self.inner().props.clone()
    }

    /// The owned native handle; `None` for virtual kinds.
    pub fn container(&self) -> Option<Container> {
        match &self.inner().kind {
            NodeKind::Widget(ws) => Some(ws.container.clone()),
            _ => None,
        }
    }

    /// Ordered child nodes.
    pub fn children(&self) -> Vec<Node> {
        self.inner().children.clone()
    }

    /// Number of child nodes.
    pub fn child_count(&self) -> usize {
        self.inner().children.len()
    }

    pub(crate) fn kind_tag(&self) -> KindTag {
        self.inner().kind.tag()
    }

    /// The widget standing in for this node in native sibling order: a
    /// widget node's own container, or the first widget a virtual slot
    /// holds.
    pub(crate) fn effective_widget(&self) -> Option<Container> {
        match &self.inner().kind {
            NodeKind::Widget(ws) => Some(ws.container.clone()),
            NodeKind::Slot(slot) => slot.anchor_widget(),
            NodeKind::MethodChild(mc) => mc.anchor_widget(),
            NodeKind::Item(_) | NodeKind::Mark(_) => None,
        }
    }

    /// The item id, when this is an item node.
    pub(crate) fn item_id(&self) -> Option<String> {
        match &self.inner().kind {
            NodeKind::Item(item) => Some(item.id.clone()),
            _ => None,
        }
    }

    pub(crate) fn parent_node(&self) -> Option<Node> {
        let weak = self.inner().parent.clone()?;
        weak.upgrade().map(|inner| Node { inner })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Diff-apply a prop update.
    ///
    /// Consumed keys are special-cased per kind: a slot's cell position
    /// change removes and re-adds, an item's id/value change patches the
    /// store entry in place, a mark swap replaces the native mark, a paged
    /// stack's visible-child-name goes through deferral. Everything else is
    /// forwarded to generic native property application.
    pub(crate) fn update_props(&self, old: &Props, new: &Props, ctx: &OpCtx<'_>) -> Result<()> {
        let tag = self.kind_tag();
        let mut deferred = Vec::new();

        match tag {
            KindTag::Widget => {
                let mut inner = self.inner_mut();
                let NodeKind::Widget(ws) = &mut inner.kind else {
                    unreachable!("tag checked");
                };
                let container = ws.container.clone();

                if let Some(Adapter::PagedStack(ps)) = &mut ws.adapter {
                    let old_name = old.get_text("visible-child-name");
                    let new_name = new.get_text("visible-child-name");
                    if new_name != old_name {
                        if let Some(name) = new_name {
                            ps.set_visible(&container, name);
                        }
                    }
                }

                let consumed = ws.consumed_keys();
                drop(inner);

                for change in props::diff(old, new) {
                    if consumed.contains(&change.key.as_str()) {
                        continue;
                    }
                    ctx.toolkit
                        .apply_property(&container, &change.key, change.value.as_ref())?;
                }
            }
            KindTag::Slot(_) => {
                let mut inner = self.inner_mut();
                let NodeKind::Slot(slot) = &mut inner.kind else {
                    unreachable!("tag checked");
                };
                slot.update_props(old, new, &mut deferred);
            }
            KindTag::Item(_) => {
                self.update_item(new)?;
            }
            KindTag::Mark(_) => {
                let mut inner = self.inner_mut();
                let NodeKind::Mark(mark) = &mut inner.kind else {
                    unreachable!("tag checked");
                };
                mark.update(new);
            }
            KindTag::MethodChild(_) => {}
        }

        self.inner_mut().props = new.clone();
        schedule_all(ctx, deferred);
        Ok(())
    }

    /// Route an item change to the owning store or menu: rename keeps the
    /// position and native entry, a value change updates the entry in
    /// place - never detach-and-reattach.
    fn update_item(&self, new: &Props) -> Result<()> {
        let (kind, old_id, old_value) = {
            let inner = self.inner();
            let NodeKind::Item(item) = &inner.kind else {
                unreachable!("tag checked");
            };
            (item.kind, item.id.clone(), item.value.clone())
        };

        let new_id = new.get_text("id").unwrap_or_default().to_string();
        let new_value = ItemState::value_from(kind, new);
        let id_changed = new_id != old_id;
        let value_changed = new_value != old_value;

        if !id_changed && !value_changed {
            return Ok(());
        }

        if let Some(parent) = self.parent_node() {
            let mut pinner = parent.inner_mut();
            if let NodeKind::Widget(ws) = &mut pinner.kind {
                let container = ws.container.clone();
                match &mut ws.adapter {
                    Some(Adapter::Store(store)) => {
                        if let Some(model) = container.handle().as_item_model() {
                            if id_changed {
                                store.rename(&old_id, &new_id);
                            }
                            if value_changed {
                                store.update(model, &new_id, new_value.clone());
                            }
                        }
                    }
                    Some(Adapter::Menu(menu)) => {
                        if let Some(host) = container.handle().as_menu() {
                            if id_changed {
                                menu.rename(&old_id, &new_id);
                            }
                            if value_changed {
                                menu.update(host, &new_id, &new_value);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut inner = self.inner_mut();
        let NodeKind::Item(item) = &mut inner.kind else {
            unreachable!("tag checked");
        };
        item.id = new_id;
        item.value = new_value;
        Ok(())
    }

    /// Present this node if its handle has a present call. Invoked once by
    /// the driver for top-level children; a no-op everywhere else and safe
    /// to repeat.
    pub(crate) fn mount(&self, ctx: &OpCtx<'_>) {
        let mut deferred = Vec::new();
        {
            let mut inner = self.inner_mut();
            if inner.state != NodeState::Initialized {
                return;
            }
            inner.state = NodeState::Mounted;

            if let NodeKind::Widget(ws) = &inner.kind {
                if ws.container.handle().as_presentable().is_some() {
                    widget::plan_present(&ws.container, &mut deferred);
                }
            }
        }
        schedule_all(ctx, deferred);
    }

    /// Release native resources for this node and its subtree.
    ///
    /// Idempotent, and every scheduled detach self-guards, because the
    /// deferred callbacks may run after the native side already tore the
    /// target down independently.
    pub(crate) fn unmount(&self, ctx: &OpCtx<'_>) {
        if self.state() == NodeState::Unmounted {
            return;
        }

        for child in self.children() {
            child.unmount(ctx);
        }

        let mut deferred = Vec::new();
        {
            let mut inner = self.inner_mut();
            inner.state = NodeState::Unmounted;
            match &mut inner.kind {
                NodeKind::Slot(slot) => slot.set_parent(None, None, &mut deferred),
                NodeKind::MethodChild(mc) => mc.set_parent(None, &mut deferred),
                NodeKind::Mark(mark) => mark.clear(),
                NodeKind::Widget(ws) => {
                    if ws.container.handle().as_presentable().is_some() {
                        widget::plan_close(&ws.container, &mut deferred);
                    }
                }
                NodeKind::Item(_) => {}
            }
        }

        tracing::debug!(type_name = %self.type_name(), "node unmounted");
        schedule_all(ctx, deferred);
    }

    /// The prop bag with this kind's consumed keys stripped - what the
    /// styling/attribute layer is allowed to see.
    pub fn forwarded_props(&self) -> Props {
        let inner = self.inner();
        inner.props.without(inner.kind.consumed_keys())
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner();
        write!(f, "Node({}, {:?})", inner.type_name, inner.state)
    }
}
