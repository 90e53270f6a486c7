//! Error types for authorization operations
//!
//! This module defines the errors surfaced by the command/query service
//! and the access guard. A denied authorization check is not an error at
//! the resolver level; it only becomes [`AuthzError::Forbidden`] when a
//! guard enforces it.

use policy_store::{PolicyId, RepositoryError};
use policy_types::ValidationError;
use thiserror::Error;

/// Authorization error types.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Malformed action, resource, subject, effect or role name
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Policy id does not exist
    #[error("Policy not found: {0}")]
    PolicyNotFound(PolicyId),

    /// Update/delete refused for a policy seeded from a predefined role
    #[error("Cannot modify system policy: {0}")]
    SystemPolicyProtected(PolicyId),

    /// Required command field missing
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// No caller identity on a guarded route
    #[error("Authentication required")]
    Unauthenticated,

    /// Caller is not permitted to perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Storage failure, propagated unchanged
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result type for authorization operations.
pub type AuthzResult<T> = Result<T, AuthzError>;

impl AuthzError {
    /// Check if this error should be logged at error level.
    ///
    /// Validation, not-found and forbidden outcomes are expected and
    /// should not be logged as errors.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AuthzError::Repository(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthzError::Validation(_) | AuthzError::MissingField(_) => 400,
            AuthzError::PolicyNotFound(_) => 404,
            AuthzError::SystemPolicyProtected(_) => 409,
            AuthzError::Unauthenticated => 401,
            AuthzError::Forbidden(_) => 403,
            AuthzError::Repository(RepositoryError::Unavailable(_)) => 503,
            AuthzError::Repository(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthzError::Validation(_) => "VALIDATION_FAILED",
            AuthzError::PolicyNotFound(_) => "POLICY_NOT_FOUND",
            AuthzError::SystemPolicyProtected(_) => "SYSTEM_POLICY_PROTECTED",
            AuthzError::MissingField(_) => "MISSING_FIELD",
            AuthzError::Unauthenticated => "UNAUTHENTICATED",
            AuthzError::Forbidden(_) => "FORBIDDEN",
            AuthzError::Repository(_) => "REPOSITORY_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let validation = AuthzError::from(ValidationError::BlankAction);
        assert_eq!(validation.status_code(), 400);
        assert_eq!(validation.error_code(), "VALIDATION_FAILED");
        assert!(!validation.is_server_error());

        let missing = AuthzError::PolicyNotFound(PolicyId::new("p-1"));
        assert_eq!(missing.status_code(), 404);
        assert_eq!(missing.to_string(), "Policy not found: p-1");

        assert_eq!(AuthzError::Forbidden("no".into()).status_code(), 403);
        assert_eq!(AuthzError::Unauthenticated.status_code(), 401);
        assert_eq!(
            AuthzError::SystemPolicyProtected(PolicyId::new("system:role:READER:0")).status_code(),
            409
        );
    }

    #[test]
    fn test_repository_errors_are_server_errors() {
        let down = AuthzError::from(RepositoryError::Unavailable("db down".into()));
        assert_eq!(down.status_code(), 503);
        assert!(down.is_server_error());
        assert_eq!(down.to_string(), "Repository unavailable: db down");

        let internal = AuthzError::from(RepositoryError::Internal("boom".into()));
        assert_eq!(internal.status_code(), 500);
    }
}
