//! Error status - how callers should react to an error

use std::fmt;

/// Whether an error is worth retrying.
///
/// The status travels with the error so that a handler several layers up can
/// still decide between "give up" and "try once more" without inspecting
/// message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// The error is final; retrying the same operation cannot succeed
    Permanent,
    /// The error is transient; the operation may succeed if retried
    Temporary,
    /// The error was temporary, but retries have been exhausted
    Persistent,
}

impl ErrorStatus {
    /// Check if an operation that failed with this status may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorStatus::Temporary)
    }

    /// Downgrade a temporary status after failed retries
    pub fn persist(self) -> Self {
        match self {
            ErrorStatus::Temporary => ErrorStatus::Persistent,
            other => other,
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorStatus::Permanent => write!(f, "permanent"),
            ErrorStatus::Temporary => write!(f, "temporary"),
            ErrorStatus::Persistent => write!(f, "persistent"),
        }
    }
}
