//! # Policy Store
//!
//! The permission policy aggregate and the repository contract the
//! authorization engine reads from.
//!
//! ## Overview
//!
//! The policy-store crate handles:
//! - **Policy**: The persisted `(subject, action, resource, effect)` tuple
//!   scoped to a profile, with audit metadata and a system-policy flag
//! - **Role seeding**: System policies built from the predefined role catalog
//! - **Repository**: Async storage contract plus an in-memory implementation
//!
//! ## Architecture
//!
//! ```text
//! policy-types (Action, Resource, Subject, PredefinedRole)
//!   └─ Policy ──→ PolicyRepository (storage adapter)
//!                   └─ MemoryPolicyRepository
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use policy_store::{MemoryPolicyRepository, Policy, PolicyRepository};
//! use policy_types::{PredefinedRole, ProfileId};
//!
//! # async fn example() -> Result<(), policy_store::RepositoryError> {
//! let repo = MemoryPolicyRepository::new();
//! let profile = ProfileId::new("profile-1");
//!
//! for policy in Policy::for_role(&profile, PredefinedRole::Reader) {
//!     repo.save(policy).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `memory`: In-memory repository (enabled by default)

#[cfg(feature = "memory")]
pub mod memory;
pub mod policy;
pub mod repository;

// Re-export main types for convenience
pub use policy::{Policy, PolicyId, SYSTEM_AUTHOR};
pub use repository::{PolicyRepository, RepositoryError, RepositoryResult};

#[cfg(feature = "memory")]
pub use memory::{MemoryPolicyRepository, RepositoryStats};
