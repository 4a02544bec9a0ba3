//! Error taxonomy.
//!
//! Only two failure classes are fatal: an element type that no registered
//! matcher resolves, and a child kind the parent's accepted-child policy
//! rejects. Native-layer failures pass through unchanged. Stale-handle
//! detaches and unmatched commit brackets are deliberately *not* errors;
//! those paths degrade to no-ops (see the scheduler and node modules).

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Structural operation that failed an accepted-child check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOp {
    Append,
    Insert,
    Remove,
}

impl fmt::Display for ChildOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Append => write!(f, "append"),
            Self::Insert => write!(f, "insert"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// Errors surfaced by the reconciliation engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No registered matcher accepted the element type.
    #[error("no registered node matcher for element type '{0}'")]
    UnresolvedType(String),

    /// The child's node kind is incompatible with the parent's
    /// accepted-child policy.
    #[error("cannot {op} '{child}' to '{parent}': expected {expected}")]
    StructuralMismatch {
        op: ChildOp,
        child: String,
        parent: String,
        expected: &'static str,
    },

    /// A native-layer failure, propagated unchanged.
    #[error("toolkit: {0}")]
    Toolkit(String),
}

impl Error {
    pub(crate) fn mismatch(
        op: ChildOp,
        child: impl Into<String>,
        parent: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::StructuralMismatch {
            op,
            child: child.into(),
            parent: parent.into(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_mismatch_message_names_both_types() {
        let err = Error::mismatch(ChildOp::Append, "GtkButton", "ListView", "List.Item");
        let message = err.to_string();
        assert_eq!(
            message,
            "cannot append 'GtkButton' to 'ListView': expected List.Item"
        );
    }

    #[test]
    fn test_unresolved_type_names_the_type() {
        let err = Error::UnresolvedType("Sprocket".to_string());
        assert!(err.to_string().contains("'Sprocket'"));
    }
}
