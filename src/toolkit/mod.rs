//! Toolkit boundary - everything the engine knows about the native layer.
//!
//! The engine issues native calls exclusively through the capability traits
//! in [`capability`] and the [`Toolkit`] trait below; it never sees a
//! concrete widget type. Handle identity and equality belong to the native
//! layer: two [`Container`] wrappers are equal when the native layer says
//! they refer to the same handle.

pub mod capability;
pub mod headless;

use std::rc::Rc;

use crate::error::Result;
use crate::props::PropValue;
use crate::types::HandleId;
use capability::{
    Capabilities, EdgeRowHost, GridHost, IndexedInsert, IndexedRow, ItemModelHost, MarkHost,
    MenuHost, OrderedChildren, OrderedInsert, PackHost, PagedStackHost, Presentable,
    RemovableChildren, RowHost, SingleChildHost, ToolbarHost,
};

// =============================================================================
// Native Handle
// =============================================================================

/// One native widget (or application) handle.
///
/// Accessor methods return the capability traits the handle supports;
/// the default for each is "not supported". A wrapper must keep its
/// advertised [`Capabilities`] and its accessors in agreement.
pub trait NativeHandle {
    /// Native identity. Equality of handles is equality of ids.
    fn id(&self) -> HandleId;

    /// Native class name, e.g. `"GtkBox"`.
    fn class_name(&self) -> &str;

    /// Capability set of this handle.
    fn capabilities(&self) -> Capabilities;

    /// Current native parent, if attached anywhere.
    fn parent(&self) -> Option<Container>;

    /// False once the native side has released the handle. Detaches against
    /// a dead handle are swallowed as no-ops.
    fn is_alive(&self) -> bool;

    fn as_ordered(&self) -> Option<&dyn OrderedChildren> {
        None
    }
    fn as_ordered_insert(&self) -> Option<&dyn OrderedInsert> {
        None
    }
    fn as_indexed_insert(&self) -> Option<&dyn IndexedInsert> {
        None
    }
    fn as_indexed_row(&self) -> Option<&dyn IndexedRow> {
        None
    }
    fn as_single_child(&self) -> Option<&dyn SingleChildHost> {
        None
    }
    fn as_removable(&self) -> Option<&dyn RemovableChildren> {
        None
    }
    fn as_grid(&self) -> Option<&dyn GridHost> {
        None
    }
    fn as_paged_stack(&self) -> Option<&dyn PagedStackHost> {
        None
    }
    fn as_item_model(&self) -> Option<&dyn ItemModelHost> {
        None
    }
    fn as_edge_rows(&self) -> Option<&dyn EdgeRowHost> {
        None
    }
    fn as_rows(&self) -> Option<&dyn RowHost> {
        None
    }
    fn as_toolbar(&self) -> Option<&dyn ToolbarHost> {
        None
    }
    fn as_pack(&self) -> Option<&dyn PackHost> {
        None
    }
    fn as_marks(&self) -> Option<&dyn MarkHost> {
        None
    }
    fn as_menu(&self) -> Option<&dyn MenuHost> {
        None
    }
    fn as_presentable(&self) -> Option<&dyn Presentable> {
        None
    }
}

// =============================================================================
// Container
// =============================================================================

/// Shared wrapper around a native handle.
///
/// Cloning is cheap; equality is handle-based, so two wrappers around the
/// same native widget compare equal regardless of where they were cloned.
#[derive(Clone)]
pub struct Container {
    handle: Rc<dyn NativeHandle>,
}

impl Container {
    /// Wrap a native handle.
    pub fn new(handle: Rc<dyn NativeHandle>) -> Self {
        Self { handle }
    }

    /// Native identity of the wrapped handle.
    pub fn id(&self) -> HandleId {
        self.handle.id()
    }

    /// Native class name.
    pub fn class_name(&self) -> &str {
        self.handle.class_name()
    }

    /// Capability set.
    pub fn capabilities(&self) -> Capabilities {
        self.handle.capabilities()
    }

    /// Check one or more capability flags at once.
    pub fn has(&self, caps: Capabilities) -> bool {
        self.handle.capabilities().contains(caps)
    }

    /// Current native parent.
    pub fn parent(&self) -> Option<Container> {
        self.handle.parent()
    }

    /// Whether the native side still holds this handle.
    pub fn is_alive(&self) -> bool {
        self.handle.is_alive()
    }

    /// Access to the wrapped handle's capability accessors.
    pub fn handle(&self) -> &dyn NativeHandle {
        self.handle.as_ref()
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.handle.id() == other.handle.id()
    }
}

impl Eq for Container {}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.handle.class_name(), self.handle.id())
    }
}

// =============================================================================
// Widget Classes
// =============================================================================

/// A native class resolved from a declared element type name.
///
/// Made available to registry predicates so a matcher can test capabilities
/// before any instance exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetClass {
    pub name: String,
    pub capabilities: Capabilities,
}

// =============================================================================
// Toolkit
// =============================================================================

/// The native layer as the engine consumes it.
///
/// Widget construction, class lookup, generic property application and the
/// process-level root/quit surface. Everything else goes through the
/// capability traits on individual handles.
pub trait Toolkit {
    /// Resolve a namespace-qualified class name.
    fn lookup_class(&self, name: &str) -> Option<WidgetClass>;

    /// Allocate a fresh native widget of the given class.
    fn create(&self, class: &WidgetClass) -> Result<Container>;

    /// Apply one non-structural property; `None` resets the property.
    /// Receives only props the owning node did not consume.
    fn apply_property(
        &self,
        container: &Container,
        key: &str,
        value: Option<&PropValue>,
    ) -> Result<()>;

    /// The top-level native handle (the application).
    fn root(&self) -> Container;

    /// Tear the application down.
    fn quit(&self);
}

/// Shared toolkit reference as stored by the driver and captured by
/// deferred callbacks.
pub type ToolkitRef = Rc<dyn Toolkit>;
