//! The main Error type for codesmith

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// The unified error type for all codesmith operations.
///
/// This error type provides:
/// - `kind`: What type of error occurred
/// - `message`: Human-readable description
/// - `status`: Whether the error is retryable
/// - `operation`: What operation caused the error
/// - `context`: Key-value pairs for debugging
/// - `source`: The underlying error (if any)
///
/// # Example
///
/// ```rust
/// use codesmith_error::{Error, ErrorKind, ErrorStatus};
///
/// let err = Error::new(ErrorKind::RateLimited, "quota exhausted for today")
///     .with_operation("provider::complete")
///     .with_status(ErrorStatus::Temporary)
///     .with_context("model", "gemini-2.0-flash")
///     .with_context("status", "429");
///
/// assert_eq!(err.kind(), ErrorKind::RateLimited);
/// assert!(err.status().is_retryable());
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let status = if kind.is_retryable() {
            ErrorStatus::Temporary
        } else {
            ErrorStatus::Permanent
        };

        Self {
            kind,
            message: message.into(),
            status,
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error status
    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    /// Get the operation that caused this error
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Get the context key-value pairs
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Get the source error (if any)
    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    // =========================================================================
    // Builders (chainable)
    // =========================================================================

    /// Set the error status
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Mark as temporary (retryable)
    pub fn temporary(mut self) -> Self {
        self.status = ErrorStatus::Temporary;
        self
    }

    /// Mark as permanent (not retryable)
    pub fn permanent(mut self) -> Self {
        self.status = ErrorStatus::Permanent;
        self
    }

    /// Set the operation that caused this error.
    ///
    /// If an operation was already set, the previous one is moved to context
    /// as "called" to preserve the call chain.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Set the source error.
    ///
    /// # Panics (debug only)
    /// Panics in debug mode if source was already set.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }

    // =========================================================================
    // Status mutations
    // =========================================================================

    /// Mark as persistent after failed retries
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }
}

// =============================================================================
// Display - compact, single-line format for logs
// =============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.context.is_empty() {
            write!(f, ", context {{ ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

// =============================================================================
// Debug - verbose, multi-line format for debugging
// =============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "    Source: {:?}", source)?;
        }

        Ok(())
    }
}

// =============================================================================
// std::error::Error implementation
// =============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// =============================================================================
// Convenient From implementations (be careful not to leak raw errors!)
// =============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

// =============================================================================
// Convenience constructors
// =============================================================================

impl Error {
    /// Create an Unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Create an Unsupported error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    /// Create a ConfigInvalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an ApiFailed error
    pub fn api_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ApiFailed, message)
    }

    /// Create an AuthFailed error
    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthFailed, message)
    }

    /// Create a RateLimited error
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    /// Create a NetworkFailed error
    pub fn network_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkFailed, message)
    }

    /// Create an EmptyResponse error
    pub fn empty_response() -> Self {
        Self::new(ErrorKind::EmptyResponse, "model returned no usable content")
    }

    /// Create a ParseFailed error
    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailed, message)
    }

    /// Create an ExecFailed error
    pub fn exec_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExecFailed, message)
    }

    /// Create an ExecTimeout error
    pub fn exec_timeout(secs: u64) -> Self {
        Self::new(
            ErrorKind::ExecTimeout,
            format!("execution exceeded {} second limit", secs),
        )
        .with_context("limit_secs", secs.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::EmptyResponse, "model returned no usable content");
        assert_eq!(err.kind(), ErrorKind::EmptyResponse);
        assert_eq!(err.message(), "model returned no usable content");
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::new(ErrorKind::ApiFailed, "internal error")
            .with_operation("provider::complete")
            .with_context("model", "gemini-2.0-flash")
            .with_context("status", "500");

        assert_eq!(err.operation(), "provider::complete");
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context()[0], ("model", "gemini-2.0-flash".to_string()));
    }

    #[test]
    fn test_operation_chaining() {
        let err = Error::new(ErrorKind::IoFailed, "write failed")
            .with_operation("exec::write_script")
            .with_operation("exec::run");

        assert_eq!(err.operation(), "exec::run");
        assert_eq!(err.context().len(), 1);
        assert_eq!(err.context()[0], ("called", "exec::write_script".to_string()));
    }

    #[test]
    fn test_temporary_status() {
        let err = Error::new(ErrorKind::RateLimited, "quota exhausted");
        assert!(err.is_retryable()); // RateLimited defaults to temporary

        let err = Error::new(ErrorKind::AuthFailed, "bad key");
        assert!(!err.is_retryable()); // AuthFailed defaults to permanent
    }

    #[test]
    fn test_persist() {
        let err = Error::new(ErrorKind::NetworkFailed, "connection refused").temporary();
        assert!(err.is_retryable());

        let err = err.persist();
        assert!(!err.is_retryable());
        assert_eq!(err.status(), ErrorStatus::Persistent);
    }

    #[test]
    fn test_display() {
        let err = Error::new(ErrorKind::ApiFailed, "model unavailable")
            .with_operation("provider::complete")
            .with_context("model", "gemini-2.0-flash")
            .with_context("attempt", "3");

        let display = format!("{}", err);
        assert!(display.contains("ApiFailed"));
        assert!(display.contains("temporary"));
        assert!(display.contains("provider::complete"));
        assert!(display.contains("model: gemini-2.0-flash"));
    }

    #[test]
    fn test_convenience_constructors() {
        let err = Error::empty_response();
        assert_eq!(err.kind(), ErrorKind::EmptyResponse);

        let err = Error::exec_timeout(10);
        assert_eq!(err.kind(), ErrorKind::ExecTimeout);
        assert!(err.message().contains("10"));

        let err = Error::exec_failed("python3 not found");
        assert_eq!(err.kind(), ErrorKind::ExecFailed);
    }

    #[test]
    fn test_set_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::new(ErrorKind::FileNotFound, "script vanished").set_source(io_err);

        assert!(err.source_ref().is_some());
    }
}
