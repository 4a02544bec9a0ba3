//! Tree driver - the host-configuration surface.
//!
//! The driving framework's reconciler talks to this engine through a small
//! fixed surface: construct a node for an element, mutate child lists,
//! commit prop updates, and bracket each commit pass. The driver owns the
//! glue - registry, scheduler, toolkit - and the root node wrapping the
//! application handle. It assumes nothing about *when* these calls happen
//! beyond "serially, on the owning thread".
//!
//! # Example
//!
//! ```
//! use graft::driver::{DriverOptions, TreeDriver};
//! use graft::props::Props;
//! use graft::registry::TypeRegistry;
//! use graft::toolkit::headless::HeadlessToolkit;
//! use std::rc::Rc;
//!
//! let toolkit = HeadlessToolkit::new();
//! let registry = Rc::new(TypeRegistry::with_defaults());
//! let driver = TreeDriver::create(
//!     Rc::new(toolkit.clone()),
//!     registry,
//!     DriverOptions::default(),
//! )
//! .unwrap();
//!
//! let window = driver
//!     .construct("Window", Props::new().with("title", "hello"), None)
//!     .unwrap();
//! driver.append_child(driver.root(), &window).unwrap();
//!
//! assert_eq!(toolkit.presented_count(&window.container().unwrap()), 1);
//! driver.quit();
//! assert!(toolkit.quit_requested());
//! ```

use std::rc::Rc;

use crate::error::Result;
use crate::node::{Node, OpCtx, attach};
use crate::props::Props;
use crate::registry::{Blueprint, TypeRegistry};
use crate::scheduler::CommitScheduler;
use crate::toolkit::{Container, ToolkitRef, WidgetClass};

// =============================================================================
// Options
// =============================================================================

/// Driver configuration.
#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    /// Props applied to the root node at creation (application title,
    /// menubar-related attributes).
    pub root_props: Props,
}

// =============================================================================
// Tree Driver
// =============================================================================

/// The engine's entry point: host-config surface plus the
/// create/update/quit application surface.
pub struct TreeDriver {
    toolkit: ToolkitRef,
    registry: Rc<TypeRegistry>,
    scheduler: Rc<CommitScheduler>,
    root: Node,
}

impl TreeDriver {
    /// Create a driver and its root node around the toolkit's application
    /// handle.
    pub fn create(
        toolkit: ToolkitRef,
        registry: Rc<TypeRegistry>,
        options: DriverOptions,
    ) -> Result<TreeDriver> {
        let scheduler = Rc::new(CommitScheduler::new());
        let root_container = toolkit.root();
        let class = WidgetClass {
            name: root_container.class_name().to_string(),
            capabilities: root_container.capabilities(),
        };

        let root = {
            let ctx = OpCtx {
                toolkit: &toolkit,
                scheduler: &scheduler,
            };
            let type_name = root_container.class_name().to_string();
            Node::create(
                Blueprint::Widget(class),
                &type_name,
                options.root_props,
                Some(root_container),
                &ctx,
            )?
        };

        Ok(TreeDriver {
            toolkit,
            registry,
            scheduler,
            root,
        })
    }

    fn ctx(&self) -> OpCtx<'_> {
        OpCtx {
            toolkit: &self.toolkit,
            scheduler: &self.scheduler,
        }
    }

    /// The root node wrapping the application handle.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The commit scheduler, for hosts that bracket commits directly.
    pub fn scheduler(&self) -> &Rc<CommitScheduler> {
        &self.scheduler
    }

    // =========================================================================
    // Host-Config Surface
    // =========================================================================

    /// Resolve and initialize a node for one element.
    ///
    /// `existing` binds the node to an already-allocated native container
    /// (wrapping the root, hot-reload re-binding) instead of creating one;
    /// it also participates in matcher predicates, which is how "wraps a
    /// calendar" and "child of a calendar" resolve differently.
    pub fn construct(
        &self,
        type_name: &str,
        props: Props,
        existing: Option<&Container>,
    ) -> Result<Node> {
        let blueprint = self.registry.resolve(
            type_name,
            existing,
            &self.toolkit.root(),
            self.toolkit.as_ref(),
        )?;
        Node::create(blueprint, type_name, props, existing.cloned(), &self.ctx())
    }

    /// Append a child to a parent's ordered child sequence.
    pub fn append_child(&self, parent: &Node, child: &Node) -> Result<()> {
        attach::append_child(parent, child, &self.ctx())?;
        if parent.same_node(&self.root) {
            child.mount(&self.ctx());
        }
        Ok(())
    }

    /// Insert a child before an existing sibling. Containers lacking
    /// order-aware insertion degrade to an append.
    pub fn insert_before(&self, parent: &Node, child: &Node, before: &Node) -> Result<()> {
        attach::insert_before(parent, child, before, &self.ctx())?;
        if parent.same_node(&self.root) {
            child.mount(&self.ctx());
        }
        Ok(())
    }

    /// Remove a child and release its subtree's native resources. Removing
    /// a node twice is a no-op.
    pub fn remove_child(&self, parent: &Node, child: &Node) -> Result<()> {
        attach::remove_child(parent, child, &self.ctx())?;
        child.unmount(&self.ctx());
        Ok(())
    }

    /// Diff-apply a prop update against a node.
    pub fn commit_update(&self, node: &Node, old: &Props, new: &Props) -> Result<()> {
        node.update_props(old, new, &self.ctx())
    }

    /// Enter one commit pass. Nests.
    pub fn begin_commit(&self) {
        self.scheduler.begin_commit();
    }

    /// Leave one commit pass; the outermost level flushes deferred native
    /// mutations, destructive ones first.
    pub fn end_commit(&self) {
        self.scheduler.end_commit();
    }

    // =========================================================================
    // Application Surface
    // =========================================================================

    /// Re-apply props to the root node.
    pub fn update(&self, props: Props) -> Result<()> {
        let old = self.root.props();
        self.commit_update(&self.root, &old, &props)
    }

    /// Tear the tree down and quit the toolkit: windows close, slots
    /// detach, the application handle is released.
    pub fn quit(&self) {
        self.root.unmount(&self.ctx());
        self.toolkit.quit();
        tracing::debug!("driver quit");
    }
}

// =============================================================================
// Tests
// =============================================================================
