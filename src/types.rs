//! Core types for graft.
//!
//! These types define the foundation that everything builds on.
//! They flow between the node hierarchy, the container adapters and the
//! toolkit boundary, and define what the native layer understands.

// =============================================================================
// Identity
// =============================================================================

/// Identity of a native handle, assigned by the native layer.
///
/// Two wrappers around the same native widget carry the same `HandleId`;
/// handle equality is always decided by this id, never by wrapper identity.
pub type HandleId = u64;

/// Identity of one native list-model entry.
///
/// Stable across in-place updates: an entry keeps its `EntryId` when its
/// backing value is replaced under the same item id, which is what preserves
/// cached native rendering state for that row.
pub type EntryId = u64;

// =============================================================================
// Node Lifecycle
// =============================================================================

/// Lifecycle state of a node.
///
/// Transitions run strictly forward:
/// `Created → Initialized → Mounted → Unmounted`.
/// `Mounted` is only reached by top-level nodes; everything else goes from
/// `Initialized` straight to `Unmounted` when discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Created,
    Initialized,
    Mounted,
    Unmounted,
}

// =============================================================================
// Grid Cells
// =============================================================================

/// Position and span of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpot {
    pub column: i32,
    pub row: i32,
    pub column_span: i32,
    pub row_span: i32,
}

impl Default for GridSpot {
    fn default() -> Self {
        Self {
            column: 0,
            row: 0,
            column_span: 1,
            row_span: 1,
        }
    }
}

// =============================================================================
// Stack / Notebook Pages
// =============================================================================

/// Page metadata for paged-stack containers (stacks, notebooks).
///
/// `name` identifies the page for visible-child selection; `title` is the
/// user-visible tab or switcher label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageProps {
    pub name: Option<String>,
    pub title: Option<String>,
}

impl PageProps {
    /// Label shown for the page, falling back to the name.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }
}

// =============================================================================
// Pack Edges
// =============================================================================

/// Which edge of a packing container (header bar, action bar) a slot fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackEdge {
    #[default]
    Start,
    End,
}

// =============================================================================
// Marks
// =============================================================================

/// An auxiliary decoration owned by an ancestor's native API rather than by
/// a child widget: a scale tick or a calendar day highlight.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkSpec {
    /// Tick on a scale: value along the range, side of the trough, optional
    /// label.
    Scale {
        value: f64,
        position: MarkPosition,
        label: Option<String>,
    },
    /// Highlighted day-of-month on a calendar.
    Calendar { day: u32 },
}

/// Side of the trough a scale mark is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum MarkPosition {
    Top = 0,
    #[default]
    Bottom = 1,
    Left = 2,
    Right = 3,
}

impl From<i64> for MarkPosition {
    fn from(value: i64) -> Self {
        match value {
            0 => Self::Top,
            2 => Self::Left,
            3 => Self::Right,
            _ => Self::Bottom,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
