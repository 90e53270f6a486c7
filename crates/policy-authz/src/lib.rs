//! # Policy Authorization
//!
//! Deny-overrides-allow authorization over stored permission policies,
//! plus the command/query surface used to manage them.
//!
//! ## Overview
//!
//! The policy-authz crate handles:
//! - **Resolver**: ALLOW/DENY decisions for a caller's subject set
//! - **Service**: Policy create/update/delete, role seeding and queries
//! - **Guard**: Per-route required access enforced by an interceptor chain
//! - **Config**: Engine settings loaded from the environment
//!
//! ## Usage
//!
//! ```rust,no_run
//! use policy_authz::{AuthorizationRequest, Caller, CreatePolicy, PolicyService};
//! use policy_store::MemoryPolicyRepository;
//! use policy_types::ProfileId;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), policy_authz::AuthzError> {
//! let service = PolicyService::new(Arc::new(MemoryPolicyRepository::new()));
//!
//! service
//!     .create_policy(CreatePolicy {
//!         profile_id: ProfileId::new("profile-1"),
//!         subject: "role:SECURITY_ADMIN".into(),
//!         action_pattern: "security.*".into(),
//!         resource_pattern: None,
//!         effect: None,
//!         description: None,
//!         created_by: "admin".into(),
//!     })
//!     .await?;
//!
//! let caller = Caller::new(ProfileId::new("profile-1"), Uuid::now_v7())
//!     .with_role("SECURITY_ADMIN");
//! let decision = service
//!     .check_authorization(&AuthorizationRequest {
//!         caller,
//!         action: "security.user.lock".into(),
//!         resource_id: Some("acct:1".into()),
//!     })
//!     .await?;
//! assert!(decision.allowed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Decision Rule
//!
//! Any matching DENY policy denies. Otherwise any matching ALLOW policy
//! allows. Otherwise the request is denied implicitly. There is no
//! specificity ordering between patterns.
//!
//! ## Integration
//!
//! This crate integrates with:
//! - `policy-types`: Action, resource and subject value types
//! - `policy-store`: Policy aggregate and repository contract

pub mod config;
pub mod error;
pub mod guard;
pub mod resolver;
pub mod service;

// Re-export main types
pub use config::EngineConfig;
pub use error::{AuthzError, AuthzResult};
pub use guard::{
    CapabilityInterceptor, GuardRequest, Interceptor, InterceptorChain, RequiredAccess, RouteTable,
};
pub use resolver::{
    build_subjects, evaluate, AuthorizationDecision, AuthorizationResolver, Caller,
    REASON_ALLOW, REASON_EXPLICIT_DENY, REASON_IMPLICIT_DENY,
};
pub use service::{
    AuthorizationRequest, CreatePolicy, DeletePolicy, PolicyService, PolicyView,
    SeedRoleDefaults, UpdatePolicy,
};
