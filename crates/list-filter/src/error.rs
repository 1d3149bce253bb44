//! Error types for the filter pipeline.

use list_filter_core::CoreError;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors reported by the filter pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// A sort rule name that is not part of the rule set.
    #[error("Unknown sort rule '{0}'")]
    InvalidSortRule(String),

    /// The pipeline was used after `dispose()`.
    #[error("The filter has been disposed")]
    Disposed,

    /// A recomputation panicked inside the predicate or comparator.
    #[error("Recomputation {generation} failed: {message}")]
    Recompute { generation: u64, message: String },

    /// Runtime error from the event loop or worker.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl FilterError {
    /// Create an unknown sort rule error.
    pub fn invalid_sort_rule(name: impl Into<String>) -> Self {
        Self::InvalidSortRule(name.into())
    }

    /// Whether the caller passed a value outside the accepted set.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidSortRule(_))
    }

    /// Whether the operation was invoked in a state that forbids it.
    pub fn is_illegal_state(&self) -> bool {
        matches!(
            self,
            Self::Disposed | Self::Core(CoreError::EventLoopExited | CoreError::WorkerUnavailable)
        )
    }
}
