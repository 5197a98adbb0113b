//! Core error types
//!
//! Re-exports codesmith-error and maps provider failures into it.

use crate::provider::ProviderError;

// Re-export the core error types
pub use codesmith_error::{Error, ErrorKind, ErrorStatus, Result};

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Network(msg) => Error::network_failed(msg),
            ProviderError::Api { status, message } => {
                Error::api_failed(message).with_context("status", status.to_string())
            }
            ProviderError::Parse(msg) => Error::parse_failed(msg),
            ProviderError::RateLimited { retry_after } => {
                let mut e = Error::rate_limited("rate limit exceeded");
                if let Some(secs) = retry_after {
                    e = e.with_context("retry_after_secs", secs.to_string());
                }
                e
            }
            ProviderError::AuthenticationFailed => {
                Error::auth_failed("authentication with the generative API failed")
            }
            ProviderError::Other(msg) => Error::unexpected(msg),
        }
        .with_operation("provider")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_mapping() {
        let err: Error = ProviderError::Network("connection refused".into()).into();
        assert_eq!(err.kind(), ErrorKind::NetworkFailed);
        assert!(err.is_retryable());

        let err: Error = ProviderError::AuthenticationFailed.into();
        assert_eq!(err.kind(), ErrorKind::AuthFailed);
        assert!(!err.is_retryable());

        let err: Error = ProviderError::Api {
            status: 500,
            message: "internal".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ApiFailed);
        assert!(err.context().iter().any(|(k, v)| *k == "status" && v == "500"));
    }

    #[test]
    fn test_rate_limited_carries_retry_after() {
        let err: Error = ProviderError::RateLimited {
            retry_after: Some(30),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err
            .context()
            .iter()
            .any(|(k, v)| *k == "retry_after_secs" && v == "30"));
    }
}
