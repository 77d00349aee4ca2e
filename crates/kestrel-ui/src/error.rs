//! Error types for tree and widget operations.

use crate::tree::NodeId;

/// Errors reported synchronously by tree, dispatch and widget operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiError {
    /// The handle refers to a node that has been destroyed.
    InvalidHandle(NodeId),

    /// A widget could not be built; the partially built sub-tree was torn down.
    ConstructionFailure(Box<UiError>),

    /// The tree refused to allocate another node.
    CapacityExceeded { max_nodes: usize },

    /// The node exists but is not of the kind the operation needs.
    WrongKind {
        node: NodeId,
        expected: &'static str,
        found: &'static str,
    },

    /// A synchronous close was requested while the widget's own node is
    /// dispatching an event.
    DispatchInProgress(NodeId),
}

impl std::fmt::Display for UiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UiError::InvalidHandle(node) => write!(f, "Invalid handle: {} was destroyed", node),
            UiError::ConstructionFailure(cause) => {
                write!(f, "Widget construction failed: {}", cause)
            }
            UiError::CapacityExceeded { max_nodes } => {
                write!(f, "Node capacity exceeded (max {} nodes)", max_nodes)
            }
            UiError::WrongKind {
                node,
                expected,
                found,
            } => write!(f, "Node {} is a {}, expected {}", node, found, expected),
            UiError::DispatchInProgress(node) => write!(
                f,
                "Cannot close synchronously while {} is dispatching an event; use close_async",
                node
            ),
        }
    }
}

impl std::error::Error for UiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UiError::ConstructionFailure(cause) => Some(cause.as_ref()),
            _ => None,
        }
    }
}

/// Result type for UI operations.
pub type UiResult<T> = Result<T, UiError>;
