//! Error types for Horizon DnD.

use horizon_dnd_core::DomError;

/// Errors raised by the drag and drop core.
#[derive(Debug, thiserror::Error)]
pub enum DndError {
    /// A document operation failed.
    #[error("document error: {0}")]
    Dom(#[from] DomError),
    /// A JSON payload could not be parsed.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    /// A TOML configuration could not be parsed.
    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
    /// The event cannot be described as a mouse event.
    #[error("cannot snapshot a `{0}` event as a mouse event")]
    MouseEventSnapshot(&'static str),
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A drop handler was borrowed while it had to be inspected.
    #[error("drop handler is already borrowed")]
    HandlerBusy,
    /// An accept criterion configuration is malformed.
    #[error(transparent)]
    Criterion(#[from] CriterionError),
}

/// Reasons an accept criterion could not be evaluated.
///
/// Any of these rejects the drop; they exist so the rejection can be logged
/// with a cause.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CriterionError {
    /// No criterion is registered under the name.
    #[error("unknown accept criterion `{0}`")]
    UnknownCriterion(String),
    /// A required attribute is absent.
    #[error("criterion `{criterion}` is missing attribute `{attribute}`")]
    MissingAttribute {
        /// Criterion name.
        criterion: String,
        /// Attribute name.
        attribute: String,
    },
    /// An attribute has the wrong JSON type.
    #[error("criterion `{criterion}` has an ill-typed attribute `{attribute}`")]
    InvalidAttribute {
        /// Criterion name.
        criterion: String,
        /// Attribute name.
        attribute: String,
    },
    /// A combinator is missing a child configuration.
    #[error("criterion `{criterion}` has no child at index {index}")]
    MissingChild {
        /// Criterion name.
        criterion: String,
        /// Expected child index.
        index: usize,
    },
    /// A combinator has the wrong number of children.
    #[error("criterion `{criterion}` expects {expected} child criteria, found {found}")]
    ChildCount {
        /// Criterion name.
        criterion: String,
        /// Required number of children.
        expected: usize,
        /// Configured number of children.
        found: usize,
    },
    /// The criterion compares against the drop target but none is current.
    #[error("no current drop target")]
    NoDropTarget,
    /// A configuration root does not carry the criterion tag.
    #[error("expected criterion tag `-ac`, found `{0}`")]
    WrongTag(String),
    /// A document lookup failed during evaluation.
    #[error("document error: {0}")]
    Dom(#[from] DomError),
}

/// Result type for drag and drop operations.
pub type DndResult<T> = std::result::Result<T, DndError>;
