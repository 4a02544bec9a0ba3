//! Mark nodes - decorations owned by an ancestor's native API.
//!
//! A scale tick or calendar highlight has no widget of its own; the nearest
//! mark-hosting ancestor draws it. Changing the spec swaps the native mark
//! (remove old, add new), and removal tolerates a host that is already
//! gone.

use crate::props::Props;
use crate::registry::MarkKind;
use crate::toolkit::Container;
use crate::types::{MarkPosition, MarkSpec};

/// State of one mark node.
pub(crate) struct MarkState {
    pub kind: MarkKind,
    pub spec: MarkSpec,
    pub host: Option<Container>,
}

impl MarkState {
    /// Keys this mark kind consumes from the prop bag.
    pub fn consumed_keys(kind: MarkKind) -> &'static [&'static str] {
        match kind {
            MarkKind::Scale => &["value", "position", "label"],
            MarkKind::Calendar => &["day"],
        }
    }

    pub fn new(kind: MarkKind, props: &Props) -> Self {
        Self {
            kind,
            spec: Self::spec_from(kind, props),
            host: None,
        }
    }

    pub fn spec_from(kind: MarkKind, props: &Props) -> MarkSpec {
        match kind {
            MarkKind::Scale => MarkSpec::Scale {
                value: props.get_float("value").unwrap_or(0.0),
                position: props
                    .get_int("position")
                    .map(MarkPosition::from)
                    .unwrap_or_default(),
                label: props.get_text("label").map(str::to_string),
            },
            MarkKind::Calendar => MarkSpec::Calendar {
                day: props.get_int("day").unwrap_or(0) as u32,
            },
        }
    }

    /// Draw this mark on a host.
    pub fn apply(&mut self, host: &Container) {
        if let Some(marks) = host.handle().as_marks() {
            marks.add_mark(&self.spec);
        }
        self.host = Some(host.clone());
    }

    /// Erase this mark from its host, tolerating a host already gone.
    pub fn clear(&mut self) {
        if let Some(host) = self.host.take() {
            if !host.is_alive() {
                tracing::trace!(?host, "mark host already gone");
                return;
            }
            if let Some(marks) = host.handle().as_marks() {
                marks.remove_mark(&self.spec);
            }
        }
    }

    /// Swap the native mark when the spec changed.
    pub fn update(&mut self, new: &Props) {
        let next = Self::spec_from(self.kind, new);
        if next == self.spec {
            return;
        }

        if let Some(host) = self.host.clone() {
            if host.is_alive() {
                if let Some(marks) = host.handle().as_marks() {
                    marks.remove_mark(&self.spec);
                    marks.add_mark(&next);
                }
            }
        }
        self.spec = next;
    }
}
