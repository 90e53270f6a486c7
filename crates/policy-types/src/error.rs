//! Validation errors for policy value types
//!
//! Every constructor in this crate either returns a valid value or one of
//! these errors. Nothing is coerced silently.

use thiserror::Error;

/// Validation failure raised while constructing a value type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Action string is empty or whitespace
    #[error("Action cannot be blank")]
    BlankAction,

    /// Action string violates the dot-segment grammar
    #[error("Invalid action format: {0}")]
    InvalidAction(String),

    /// Resource string is empty or whitespace
    #[error("Resource cannot be blank")]
    BlankResource,

    /// Resource glob could not be compiled into a matcher
    #[error("Invalid resource pattern {pattern}: {message}")]
    InvalidResourcePattern {
        /// The offending sub-pattern.
        pattern: String,
        /// Matcher compilation message.
        message: String,
    },

    /// Subject identifier is empty or whitespace
    #[error("Subject identifier cannot be blank")]
    BlankIdentifier,

    /// Subject URN has no `type:` prefix
    #[error("Invalid subject URN: {0}")]
    InvalidSubjectUrn(String),

    /// Subject URN prefix is not user, group or role
    #[error("Unknown subject type: {0}")]
    UnknownSubjectType(String),

    /// User or group identifier is not a UUID
    #[error("Invalid UUID for {kind}: {value}")]
    InvalidUuid {
        /// Subject type name.
        kind: &'static str,
        /// The rejected identifier.
        value: String,
    },

    /// Role identifier does not match `^[A-Z][A-Z0-9_]*$`
    #[error("Invalid role name: {0}")]
    InvalidRoleName(String),

    /// Role name is not in the predefined catalog
    #[error("Unknown predefined role: {0}")]
    UnknownPredefinedRole(String),

    /// Effect string is neither ALLOW nor DENY
    #[error("Invalid effect: {0}")]
    InvalidEffect(String),
}

/// Result type for value-type construction.
pub type ValidationResult<T> = Result<T, ValidationError>;
