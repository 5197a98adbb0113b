//! Error kinds for codesmith operations

use std::fmt;

/// The kind of error that occurred.
///
/// This enum categorizes errors to help users write clear error handling logic.
/// Users can match on ErrorKind to decide how to handle specific error cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// The requested feature or operation is not supported
    Unsupported,

    /// Invalid configuration or parameters
    ConfigInvalid,

    // =========================================================================
    // Provider/generation errors
    // =========================================================================
    /// The generative API returned an error response
    ApiFailed,

    /// Authentication with the generative API failed
    AuthFailed,

    /// Rate limit or quota exceeded
    RateLimited,

    /// Network error while talking to the generative API
    NetworkFailed,

    /// The model returned a response with no usable content
    EmptyResponse,

    /// Failed to parse a response body
    ParseFailed,

    // =========================================================================
    // Execution errors
    // =========================================================================
    /// The interpreter process could not be started
    ExecFailed,

    /// Code execution exceeded its wall-clock limit
    ExecTimeout,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::Unsupported => "Unsupported",
            ErrorKind::ConfigInvalid => "ConfigInvalid",

            // Provider/generation
            ErrorKind::ApiFailed => "ApiFailed",
            ErrorKind::AuthFailed => "AuthFailed",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::NetworkFailed => "NetworkFailed",
            ErrorKind::EmptyResponse => "EmptyResponse",
            ErrorKind::ParseFailed => "ParseFailed",

            // Execution
            ErrorKind::ExecFailed => "ExecFailed",
            ErrorKind::ExecTimeout => "ExecTimeout",

            // IO
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::ApiFailed
                | ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::ExecTimeout
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::ApiFailed.to_string(), "ApiFailed");
        assert_eq!(ErrorKind::ExecTimeout.to_string(), "ExecTimeout");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::NetworkFailed.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::AuthFailed.is_retryable());
        assert!(!ErrorKind::EmptyResponse.is_retryable());
    }
}
