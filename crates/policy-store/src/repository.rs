//! Policy repository contract
//!
//! The engine never persists policies itself. Storage adapters implement
//! [`PolicyRepository`]; see [`crate::memory`] for the in-memory backend.

use async_trait::async_trait;
use policy_types::{ProfileId, Subject};
use thiserror::Error;

use crate::policy::{Policy, PolicyId};

/// Repository error types.
///
/// These represent storage I/O failures. The engine propagates them to
/// its caller unchanged.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Backing store could not be reached
    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    /// Write conflicted with concurrent modification
    #[error("Repository conflict: {0}")]
    Conflict(String),

    /// Any other storage failure
    #[error("Repository error: {0}")]
    Internal(String),
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage contract for permission policies.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Insert or replace a policy by id.
    async fn save(&self, policy: Policy) -> RepositoryResult<()>;

    /// Find a policy by id.
    async fn find_by_id(&self, id: &PolicyId) -> RepositoryResult<Option<Policy>>;

    /// All policies of a profile.
    async fn find_by_profile_id(&self, profile_id: &ProfileId) -> RepositoryResult<Vec<Policy>>;

    /// Policies of a profile targeting exactly one subject.
    async fn find_by_profile_id_and_subject(
        &self,
        profile_id: &ProfileId,
        subject: &Subject,
    ) -> RepositoryResult<Vec<Policy>>;

    /// Policies of a profile whose subject is any of `subjects`.
    ///
    /// One call for the whole set; an empty set yields no policies.
    async fn find_by_profile_id_and_subjects(
        &self,
        profile_id: &ProfileId,
        subjects: &[Subject],
    ) -> RepositoryResult<Vec<Policy>>;

    /// Delete a policy by id. Deleting a missing id is not an error.
    async fn delete_by_id(&self, id: &PolicyId) -> RepositoryResult<()>;

    /// Check if a policy exists.
    async fn exists_by_id(&self, id: &PolicyId) -> RepositoryResult<bool>;
}
