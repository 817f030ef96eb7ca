//! # Error Handling
//!
//! Error taxonomy for provisioning operations. Two families exist:
//! [`ProvisionError::Validation`] for malformed input detected before any
//! remote call, and [`ProvisionError::Provisioning`] for remote platform
//! failures, always carrying the name of the failing remote operation.

use thiserror::Error;

use crate::platform::PlatformError;

/// Errors raised by idempotent resource operations and the orchestrator.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Malformed or missing input, detected locally. Never retried and
    /// never wraps a remote failure.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A remote call failed, or "succeeded" without returning an
    /// identifier the caller needs.
    #[error("{operation} failed: {message}")]
    Provisioning { operation: String, message: String },
}

impl ProvisionError {
    /// Wrap a platform failure with the name of the remote operation that
    /// issued it.
    pub fn remote(operation: &str, source: PlatformError) -> Self {
        Self::Provisioning {
            operation: operation.to_string(),
            message: source.to_string(),
        }
    }

    /// A create/search response that omitted the identifier we need.
    pub fn missing_id(operation: &str, subject: impl std::fmt::Display) -> Self {
        Self::Provisioning {
            operation: operation.to_string(),
            message: format!("{subject} returned no id"),
        }
    }

    /// Only remote failures are worth retrying; validation errors are
    /// deterministic and retrying them would just repeat the rejection.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provisioning { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_carries_operation_name() {
        let err = ProvisionError::remote(
            "search_groups",
            PlatformError::Http {
                status: 503,
                body: "upstream down".to_string(),
            },
        );
        assert!(err.to_string().starts_with("search_groups failed:"));
        assert!(err.is_retryable());
    }

    #[test]
    fn validation_error_is_not_retryable() {
        let err = ProvisionError::Validation("missing projectId".to_string());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "validation failed: missing projectId");
    }

    #[test]
    fn missing_id_names_the_subject() {
        let err = ProvisionError::missing_id("create_group", "group analysts@company.com");
        assert_eq!(
            err.to_string(),
            "create_group failed: group analysts@company.com returned no id"
        );
    }
}
