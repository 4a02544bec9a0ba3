//! Type registry - resolving element types to node blueprints.
//!
//! Every element type name is resolved through a priority-ordered matcher
//! list: higher priority runs first, ties break by registration order, and
//! the first accepting predicate wins. This indirection exists because the
//! virtual and capability-matched node kinds must take precedence over the
//! generic "native widget" fallback for the same type-name context (a node
//! that *wraps* a calendar is not the same as one that is a *child of* a
//! calendar).
//!
//! The registry is built once at startup and handed to the tree driver by
//! reference; registration takes `&mut self`, so once the driver shares it
//! the table can no longer change.

use crate::error::{Error, Result};
use crate::toolkit::capability::Capabilities;
use crate::toolkit::{Container, Toolkit, WidgetClass};
use crate::types::PackEdge;

// =============================================================================
// Blueprints
// =============================================================================

/// What kind of node a resolved element type produces.
///
/// Blueprints are tags; the node module extracts the concrete slot
/// positions, item ids and mark specs from the element's props at
/// initialization.
#[derive(Debug, Clone, PartialEq)]
pub enum Blueprint {
    /// Widget-backed node of the given native class.
    Widget(WidgetClass),
    /// Positional slot (grid cell, page, pack edge).
    Slot(SlotKind),
    /// Id-keyed entry of a model-backed collection.
    Item(ItemKind),
    /// Child attached through one fixed named method on the parent.
    MethodChild(AttachMethod),
    /// Auxiliary decoration owned by the host's native API.
    Mark(MarkKind),
}

/// Positional slot kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Grid cell addressed by column/row/span props.
    Cell,
    /// Stack or notebook page carrying name/title props.
    Page,
    /// Pack edge of a header/action bar.
    Pack(PackEdge),
}

/// Item container families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// List-model entry (list views, drop-downs).
    Model,
    /// Menu-model entry.
    Menu,
}

/// The fixed table of named attachment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMethod {
    Prefix,
    Suffix,
    Row,
    Action,
    TopBar,
    BottomBar,
}

impl AttachMethod {
    /// Map an element type name onto an attachment method, if any.
    pub fn from_type(type_name: &str) -> Option<Self> {
        if type_name.ends_with(".Prefix") {
            Some(Self::Prefix)
        } else if type_name.ends_with(".Suffix") {
            Some(Self::Suffix)
        } else if type_name.ends_with(".Row") {
            Some(Self::Row)
        } else if type_name.ends_with(".Action") {
            Some(Self::Action)
        } else if type_name == "Toolbar.Top" {
            Some(Self::TopBar)
        } else if type_name == "Toolbar.Bottom" {
            Some(Self::BottomBar)
        } else {
            None
        }
    }
}

/// Mark families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Scale,
    Calendar,
}

// =============================================================================
// Matchers
// =============================================================================

/// Context a matcher predicate sees.
pub struct MatchCtx<'a> {
    /// Declared element type name.
    pub type_name: &'a str,
    /// Existing native container being wrapped, if any.
    pub existing: Option<&'a Container>,
    /// Native class the type name resolved to through the namespace table.
    pub class: Option<&'a WidgetClass>,
    /// The top-level native handle.
    pub root: &'a Container,
}

impl MatchCtx<'_> {
    /// Capabilities of the resolved class or the existing container.
    pub fn capabilities(&self) -> Capabilities {
        if let Some(existing) = self.existing {
            existing.capabilities()
        } else if let Some(class) = self.class {
            class.capabilities
        } else {
            Capabilities::NONE
        }
    }
}

type Predicate = Box<dyn Fn(&MatchCtx<'_>) -> bool>;
type Build = Box<dyn Fn(&MatchCtx<'_>) -> Blueprint>;

/// One registered matcher.
pub struct Matcher {
    name: &'static str,
    priority: i32,
    predicate: Predicate,
    build: Build,
}

impl Matcher {
    /// Create a matcher with the default priority of 0.
    pub fn new(
        name: &'static str,
        predicate: impl Fn(&MatchCtx<'_>) -> bool + 'static,
        build: impl Fn(&MatchCtx<'_>) -> Blueprint + 'static,
    ) -> Self {
        Self {
            name,
            priority: 0,
            predicate: Box::new(predicate),
            build: Box::new(build),
        }
    }

    /// Raise or lower the priority; higher runs first.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

// =============================================================================
// Registry
// =============================================================================

/// The priority-ordered matcher table plus the namespace-prefix table used
/// to resolve declared type names to native classes.
pub struct TypeRegistry {
    matchers: Vec<Matcher>,
    namespaces: Vec<String>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TypeRegistry {
    /// An empty registry: no matchers, bare-name class lookup only.
    pub fn new() -> Self {
        Self {
            matchers: Vec::new(),
            namespaces: vec![String::new()],
        }
    }

    /// The standard matcher set: marks, items, slots, method children, and
    /// the generic widget fallback, with the `Gtk`/`Adw` namespaces.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_namespace("Gtk");
        registry.register_namespace("Adw");

        registry.register(
            Matcher::new(
                "scale-mark",
                |ctx| ctx.type_name == "Scale.Mark",
                |_| Blueprint::Mark(MarkKind::Scale),
            )
            .with_priority(1),
        );
        registry.register(
            Matcher::new(
                "calendar-mark",
                |ctx| ctx.type_name == "Calendar.Mark",
                |_| Blueprint::Mark(MarkKind::Calendar),
            )
            .with_priority(1),
        );
        registry.register(
            Matcher::new(
                "menu-entry",
                |ctx| ctx.type_name == "Menu.Entry",
                |_| Blueprint::Item(ItemKind::Menu),
            )
            .with_priority(1),
        );
        registry.register(
            Matcher::new(
                "list-item",
                |ctx| ctx.type_name.ends_with(".Item"),
                |_| Blueprint::Item(ItemKind::Model),
            )
            .with_priority(1),
        );
        registry.register(
            Matcher::new(
                "grid-cell",
                |ctx| ctx.type_name == "Grid.Cell",
                |_| Blueprint::Slot(SlotKind::Cell),
            )
            .with_priority(1),
        );
        registry.register(
            Matcher::new(
                "page-slot",
                |ctx| ctx.type_name.ends_with(".Page"),
                |_| Blueprint::Slot(SlotKind::Page),
            )
            .with_priority(1),
        );
        registry.register(
            Matcher::new(
                "pack-slot",
                |ctx| ctx.type_name == "Pack.Start" || ctx.type_name == "Pack.End",
                |ctx| {
                    let edge = if ctx.type_name == "Pack.Start" {
                        PackEdge::Start
                    } else {
                        PackEdge::End
                    };
                    Blueprint::Slot(SlotKind::Pack(edge))
                },
            )
            .with_priority(1),
        );
        registry.register(
            Matcher::new(
                "method-child",
                |ctx| AttachMethod::from_type(ctx.type_name).is_some(),
                |ctx| {
                    let method =
                        AttachMethod::from_type(ctx.type_name).expect("predicate checked");
                    Blueprint::MethodChild(method)
                },
            )
            .with_priority(1),
        );
        // Generic widget fallback: anything that resolves to a native class.
        registry.register(Matcher::new(
            "widget",
            |ctx| ctx.class.is_some() || ctx.existing.is_some(),
            |ctx| {
                let class = match (ctx.class, ctx.existing) {
                    (Some(class), _) => class.clone(),
                    (None, Some(existing)) => WidgetClass {
                        name: existing.class_name().to_string(),
                        capabilities: existing.capabilities(),
                    },
                    (None, None) => unreachable!("predicate checked"),
                };
                Blueprint::Widget(class)
            },
        ));

        registry
    }

    /// Add a namespace prefix tried during class resolution.
    pub fn register_namespace(&mut self, prefix: &str) {
        self.namespaces.push(prefix.to_string());
    }

    /// Register a matcher. Stable-sorts by priority, so equal priorities
    /// keep their registration order.
    pub fn register(&mut self, matcher: Matcher) {
        self.matchers.push(matcher);
        self.matchers
            .sort_by_key(|m| std::cmp::Reverse(m.priority));
    }

    /// Resolve a declared type name through the namespace table.
    pub fn lookup_native_class(
        &self,
        type_name: &str,
        toolkit: &dyn Toolkit,
    ) -> Option<WidgetClass> {
        self.namespaces
            .iter()
            .find_map(|prefix| toolkit.lookup_class(&format!("{prefix}{type_name}")))
    }

    /// Resolve an element type to a blueprint.
    ///
    /// No accepting matcher is a fatal construction error naming the
    /// unresolved type.
    pub fn resolve(
        &self,
        type_name: &str,
        existing: Option<&Container>,
        root: &Container,
        toolkit: &dyn Toolkit,
    ) -> Result<Blueprint> {
        let class = self.lookup_native_class(type_name, toolkit);
        let ctx = MatchCtx {
            type_name,
            existing,
            class: class.as_ref(),
            root,
        };

        for matcher in &self.matchers {
            if (matcher.predicate)(&ctx) {
                tracing::trace!(type_name, matcher = matcher.name, "resolved element type");
                return Ok((matcher.build)(&ctx));
            }
        }

        Err(Error::UnresolvedType(type_name.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
