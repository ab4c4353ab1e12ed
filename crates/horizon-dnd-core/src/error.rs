//! Error types for Horizon DnD core primitives.

/// Errors that can occur while reading or mutating the document tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node ID is invalid or the node has been removed.
    #[error("Invalid or removed node ID")]
    InvalidNode,
    /// The widget ID is invalid or the widget has been removed.
    #[error("Invalid or removed widget ID")]
    InvalidWidget,
    /// Attempted to make a node or widget its own ancestor.
    #[error("Cannot set a node or widget as its own parent or ancestor")]
    CircularParentage,
    /// The operation requires an element but the node is a text node.
    #[error("Node is not an element")]
    NotAnElement,
    /// A widget parent chain was longer than the number of registered widgets.
    #[error("Widget parent chain does not terminate")]
    UnterminatedWidgetChain,
}

/// Errors produced by the command scheduler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// The task ID is invalid or the task has already finished.
    #[error("Invalid or finished scheduled task ID")]
    InvalidTaskId,
}

/// Result type for document operations.
pub type DomResult<T> = std::result::Result<T, DomError>;
