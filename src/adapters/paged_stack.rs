//! Paged-stack adapter state.
//!
//! Stacks and notebooks attach children as named pages. The one piece of
//! state the engine has to carry for them is visible-child deferral: the
//! framework may set `visible-child-name` before the named page exists, so
//! the name is parked here and re-applied once pages have attached.

use crate::toolkit::Container;
use crate::toolkit::capability::PagedStackHost;

/// Deferral state for one paged-stack widget.
#[derive(Debug, Default)]
pub struct PagedStack {
    pending_visible: Option<String>,
}

impl PagedStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the visible page, or park the name if no page carries it yet.
    pub fn set_visible(&mut self, host: &Container, name: &str) {
        self.pending_visible = Some(name.to_string());
        self.apply_pending(host);
    }

    /// Re-apply a parked name; called after pages attach.
    pub fn apply_pending(&mut self, host: &Container) {
        let Some(name) = self.pending_visible.as_deref() else {
            return;
        };
        let Some(stack) = host.handle().as_paged_stack() else {
            return;
        };

        if let Some(page) = stack.page_by_name(name) {
            stack.show_page(&page);
            self.pending_visible = None;
        }
    }

    /// Whether a name is still waiting for its page.
    pub fn has_pending(&self) -> bool {
        self.pending_visible.is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
