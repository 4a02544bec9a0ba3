//! # graft
//!
//! Reconciliation engine grafting a declarative component tree onto a
//! retained-mode native widget tree.
//!
//! An external UI framework describes the interface as immutable elements;
//! graft keeps a mutable node per element identity and mirrors every
//! structural and property change onto native widgets, accommodating the
//! attachment protocols real toolkits actually have: direct children, named
//! slots, list-model-backed items and capability-based containers.
//!
//! ## Architecture
//!
//! ```text
//! host framework → TreeDriver → Node hierarchy → capability traits → toolkit
//!                      │             │
//!                 TypeRegistry   CommitScheduler (deferred mutations,
//!                 (matchers)      destructive-before-constructive)
//! ```
//!
//! Everything is single-threaded and cooperative: "deferred" means
//! reordered within one thread around commit boundaries, never parallelism.
//! The engine performs no layout, rendering or event dispatch and does not
//! own the native event loop; it only maintains structural and property
//! correspondence between the two trees and issues native mutations in a
//! safe order.
//!
//! ## Modules
//!
//! - [`driver`] - the host-config surface and application entry points
//! - [`node`] - the node hierarchy (widget, slot, item, method-child, mark)
//! - [`registry`] - priority-ordered element-type resolution
//! - [`scheduler`] - the commit-depth counter and priority queues
//! - [`adapters`] - per-widget-kind child-attachment contracts
//! - [`toolkit`] - the native boundary: capability traits and the headless
//!   backend
//! - [`props`] - ordered prop bags and diffing

pub mod adapters;
pub mod driver;
pub mod error;
pub mod node;
pub mod props;
pub mod registry;
pub mod scheduler;
pub mod toolkit;
pub mod types;

// Re-export commonly used items
pub use driver::{DriverOptions, TreeDriver};
pub use error::{ChildOp, Error, Result};
pub use node::Node;
pub use props::{PropValue, Props};
pub use registry::{Blueprint, Matcher, TypeRegistry};
pub use scheduler::{CommitScheduler, Priority, ScheduledCallback};
pub use toolkit::capability::Capabilities;
pub use toolkit::{Container, NativeHandle, Toolkit, WidgetClass};
pub use types::{EntryId, GridSpot, HandleId, MarkPosition, MarkSpec, NodeState, PackEdge, PageProps};
