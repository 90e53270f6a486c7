//! Authorization resolver
//!
//! Computes ALLOW/DENY decisions for a caller from the policies stored for
//! a profile. The resolver holds no mutable state: every operation performs
//! exactly one repository read and evaluates the snapshot it gets back, so
//! any number of checks may run concurrently without locking.
//!
//! # Decision rule
//!
//! ```text
//! applicable = policies(profile, subjects)
//! matching   = applicable where action ~ pattern && resource ~ pattern
//! any DENY   in matching  → denied   (explicit deny policy matched)
//! any ALLOW  in matching  → allowed  (allow policy matched)
//! otherwise               → denied   (no matching policy (implicit deny))
//! ```
//!
//! Deny always overrides allow, regardless of how specific either pattern is.

use policy_store::{Policy, PolicyId, PolicyRepository, RepositoryResult};
use policy_types::{Action, Effect, ProfileId, Subject, ValidationResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;

/// Reason reported when a DENY policy matched.
pub const REASON_EXPLICIT_DENY: &str = "explicit deny policy matched";

/// Reason reported when only ALLOW policies matched.
pub const REASON_ALLOW: &str = "allow policy matched";

/// Reason reported when nothing matched.
pub const REASON_IMPLICIT_DENY: &str = "no matching policy (implicit deny)";

/// Resource id used when enumerating allowed actions.
pub const ANY_RESOURCE: &str = "*";

/// Identity of a caller as asserted by the boundary layer.
///
/// The engine does not authenticate; it trusts the user id and role names
/// it is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Profile the caller is acting in
    pub profile_id: ProfileId,

    /// Authenticated user id
    pub user_id: Uuid,

    /// Asserted role names
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Caller {
    /// Create a caller with no roles.
    pub fn new(profile_id: ProfileId, user_id: Uuid) -> Self {
        Self {
            profile_id,
            user_id,
            roles: BTreeSet::new(),
        }
    }

    /// Add a role name.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Derive the subject set `{user:id} ∪ {role:r | r ∈ roles}`.
    ///
    /// # Errors
    ///
    /// Fails on the first role name that is not a valid role identifier.
    /// Whether to drop such names instead is up to the boundary layer.
    pub fn subjects(&self) -> ValidationResult<Vec<Subject>> {
        build_subjects(self.user_id, self.roles.iter().map(String::as_str))
    }
}

/// Build the subject set for a user id and role names.
///
/// The user subject comes first; duplicate role names collapse.
pub fn build_subjects<'a, I>(user_id: Uuid, roles: I) -> ValidationResult<Vec<Subject>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut subjects = vec![Subject::user(user_id)];
    let mut seen = HashSet::new();
    for role in roles {
        if seen.insert(role) {
            subjects.push(Subject::role(role)?);
        }
    }
    Ok(subjects)
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationDecision {
    /// Whether the request is allowed
    pub allowed: bool,

    /// Human-readable reason
    pub reason: String,

    /// Effect that decided the outcome; `None` for implicit deny
    pub effective_effect: Option<Effect>,

    /// Ids of the policies carrying the deciding effect
    #[serde(default)]
    pub matched_policies: Vec<PolicyId>,
}

impl AuthorizationDecision {
    /// Decision when at least one DENY policy matched.
    pub fn explicit_deny(policies: Vec<PolicyId>) -> Self {
        Self {
            allowed: false,
            reason: REASON_EXPLICIT_DENY.to_string(),
            effective_effect: Some(Effect::Deny),
            matched_policies: policies,
        }
    }

    /// Decision when only ALLOW policies matched.
    pub fn allow(policies: Vec<PolicyId>) -> Self {
        Self {
            allowed: true,
            reason: REASON_ALLOW.to_string(),
            effective_effect: Some(Effect::Allow),
            matched_policies: policies,
        }
    }

    /// Decision when no policy matched.
    pub fn implicit_deny() -> Self {
        Self {
            allowed: false,
            reason: REASON_IMPLICIT_DENY.to_string(),
            effective_effect: None,
            matched_policies: Vec::new(),
        }
    }
}

/// Combine matching policies with deny-overrides-allow.
///
/// Callers pass only policies whose patterns already matched the request.
pub fn evaluate<'a, I>(matching: I) -> AuthorizationDecision
where
    I: IntoIterator<Item = &'a Policy>,
{
    let mut allows = Vec::new();
    let mut denies = Vec::new();
    for policy in matching {
        match policy.effect {
            Effect::Deny => denies.push(policy.id.clone()),
            Effect::Allow => allows.push(policy.id.clone()),
        }
    }

    if !denies.is_empty() {
        AuthorizationDecision::explicit_deny(denies)
    } else if !allows.is_empty() {
        AuthorizationDecision::allow(allows)
    } else {
        AuthorizationDecision::implicit_deny()
    }
}

/// Stateless authorization resolver over a policy repository.
#[derive(Clone)]
pub struct AuthorizationResolver {
    /// Policy source
    repository: Arc<dyn PolicyRepository>,
    /// Engine configuration
    config: Arc<EngineConfig>,
}

impl std::fmt::Debug for AuthorizationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationResolver")
            .field("config", &self.config)
            .finish()
    }
}

impl AuthorizationResolver {
    /// Create a resolver with default configuration.
    pub fn new(repository: Arc<dyn PolicyRepository>) -> Self {
        Self::with_config(repository, EngineConfig::default())
    }

    /// Create a resolver with custom configuration.
    pub fn with_config(repository: Arc<dyn PolicyRepository>, config: EngineConfig) -> Self {
        Self {
            repository,
            config: Arc::new(config),
        }
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decide whether the subjects may perform `action` on `resource_id`.
    ///
    /// Never fails for well-formed inputs; only repository I/O errors are
    /// returned. An empty subject set is an implicit deny.
    #[instrument(
        skip(self, subjects),
        fields(profile_id = %profile_id, action = %action, subjects = subjects.len())
    )]
    pub async fn check_authorization(
        &self,
        profile_id: &ProfileId,
        subjects: &[Subject],
        action: &Action,
        resource_id: &str,
    ) -> RepositoryResult<AuthorizationDecision> {
        let policies = self.applicable_policies(profile_id, subjects).await?;
        let decision = evaluate(policies.iter().filter(|p| p.matches(action, resource_id)));

        debug!(
            allowed = decision.allowed,
            effect = ?decision.effective_effect,
            matched = decision.matched_policies.len(),
            resource_id,
            "Authorization decided"
        );
        Ok(decision)
    }

    /// Decide on the action alone, ignoring resource patterns.
    #[instrument(
        skip(self, subjects),
        fields(profile_id = %profile_id, action = %action, subjects = subjects.len())
    )]
    pub async fn check_action(
        &self,
        profile_id: &ProfileId,
        subjects: &[Subject],
        action: &Action,
    ) -> RepositoryResult<AuthorizationDecision> {
        let policies = self.applicable_policies(profile_id, subjects).await?;
        let decision = evaluate(policies.iter().filter(|p| p.matches_action(action)));

        debug!(allowed = decision.allowed, "Action-only authorization decided");
        Ok(decision)
    }

    /// Every policy applying to the subjects in the profile, unfiltered by
    /// action or resource.
    #[instrument(skip(self, subjects), fields(profile_id = %profile_id, subjects = subjects.len()))]
    pub async fn get_effective_permissions(
        &self,
        profile_id: &ProfileId,
        subjects: &[Subject],
    ) -> RepositoryResult<Vec<Policy>> {
        self.applicable_policies(profile_id, subjects).await
    }

    /// Action identifiers the subjects are allowed to perform on any
    /// resource (`*`).
    ///
    /// Candidates are the configured action catalog plus the action
    /// patterns of the applicable policies. A candidate is returned iff
    /// [`check_authorization`](Self::check_authorization) with resource `*`
    /// would allow it, evaluated against one repository snapshot.
    ///
    /// When a catalog is configured, wildcard patterns (`*`, `payments.*`)
    /// are not candidates and only concrete identifiers are returned.
    /// Without a catalog the result may contain allowed wildcard patterns,
    /// and such a pattern can still cover narrower denied actions: ALLOW
    /// `*` with DENY `payments.delete` yields `{"*"}`.
    #[instrument(skip(self, subjects), fields(profile_id = %profile_id, subjects = subjects.len()))]
    pub async fn get_allowed_actions(
        &self,
        profile_id: &ProfileId,
        subjects: &[Subject],
    ) -> RepositoryResult<BTreeSet<String>> {
        let policies = self.applicable_policies(profile_id, subjects).await?;

        let catalog = &self.config.action_catalog;
        let mut candidates: BTreeSet<String> = policies
            .iter()
            .filter(|p| catalog.is_empty() || !p.action.is_pattern())
            .map(|p| p.action.as_str().to_string())
            .collect();
        candidates.extend(catalog.iter().cloned());

        let mut allowed = BTreeSet::new();
        for candidate in candidates {
            let action = match Action::new(candidate.as_str()) {
                Ok(action) => action,
                Err(e) => {
                    warn!(action = %candidate, error = %e, "Skipping invalid catalog action");
                    continue;
                }
            };
            let decision = evaluate(policies.iter().filter(|p| p.matches(&action, ANY_RESOURCE)));
            if decision.allowed {
                allowed.insert(candidate);
            }
        }

        debug!(count = allowed.len(), "Allowed actions enumerated");
        Ok(allowed)
    }

    /// One repository read, plus predefined role defaults when enabled.
    async fn applicable_policies(
        &self,
        profile_id: &ProfileId,
        subjects: &[Subject],
    ) -> RepositoryResult<Vec<Policy>> {
        if subjects.is_empty() {
            return Ok(Vec::new());
        }

        let mut policies: Vec<Policy> = self
            .repository
            .find_by_profile_id_and_subjects(profile_id, subjects)
            .await?
            .into_iter()
            .filter(|p| &p.profile_id == profile_id && p.applies_to_any(subjects))
            .collect();

        if self.config.include_role_defaults {
            let role_names = subjects
                .iter()
                .filter(|s| s.is_role())
                .map(|s| s.identifier());
            let defaults = Policy::for_role_names(profile_id, role_names);
            let stored: HashSet<PolicyId> = policies.iter().map(|p| p.id.clone()).collect();
            policies.extend(defaults.into_iter().filter(|p| !stored.contains(&p.id)));
        }

        Ok(policies)
    }
}
