use thiserror::Error;

/// Errors from operations on a resource the session does not hold.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("browser not open")]
    BrowserNotOpen,

    #[error("session '{0}' not found")]
    SessionNotFound(String),
}

/// Errors reported by an action handler.
///
/// Every variant is recoverable by the run loop when the failing step sets
/// `continueOnError`; otherwise it aborts the run.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    #[error("invalid parameters for '{action}': {reason}")]
    InvalidParameters { action: String, reason: String },

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("process error: {0}")]
    Process(String),

    #[error("filesystem error: {0}")]
    FileSystem(String),
}

impl ActionError {
    /// Shorthand for a parameter validation failure.
    pub fn invalid(action: impl Into<String>, reason: impl Into<String>) -> Self {
        ActionError::InvalidParameters {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Whether this failure was caused by a missing resource.
    pub fn is_resource_error(&self) -> bool {
        matches!(self, ActionError::Resource(_))
    }
}
