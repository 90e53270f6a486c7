//! Policy command and query service
//!
//! The surface consumed by the boundary layer: policy lifecycle commands,
//! policy listing queries and caller-oriented authorization queries.
//! Commands validate every input before touching the repository.

use chrono::{DateTime, Utc};
use policy_store::{Policy, PolicyId, PolicyRepository};
use policy_types::{Action, Effect, PredefinedRole, ProfileId, Resource, Subject};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::EngineConfig;
use crate::error::{AuthzError, AuthzResult};
use crate::resolver::{AuthorizationDecision, AuthorizationResolver, Caller};

/// Create a policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePolicy {
    pub profile_id: ProfileId,
    /// Subject URN, e.g. `role:READER`
    pub subject: String,
    pub action_pattern: String,
    /// Defaults to `*`
    #[serde(default)]
    pub resource_pattern: Option<String>,
    /// `ALLOW`/`DENY`, case-insensitive; defaults to `ALLOW`
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_by: String,
}

/// Update a policy's mutable fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePolicy {
    pub policy_id: PolicyId,
    #[serde(default)]
    pub action_pattern: Option<String>,
    #[serde(default)]
    pub resource_pattern: Option<String>,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl UpdatePolicy {
    /// An update that changes nothing but `updated_at`.
    pub fn new(policy_id: PolicyId) -> Self {
        Self {
            policy_id,
            action_pattern: None,
            resource_pattern: None,
            effect: None,
            description: None,
        }
    }
}

/// Delete a policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePolicy {
    pub policy_id: PolicyId,
}

/// Persist the default system policies of a predefined role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRoleDefaults {
    pub profile_id: ProfileId,
    pub role_name: String,
}

/// Authorization query for a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    #[serde(flatten)]
    pub caller: Caller,
    pub action: String,
    /// Falls back to the configured default resource
    #[serde(default)]
    pub resource_id: Option<String>,
}

/// Flat policy representation returned by queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyView {
    pub id: String,
    pub profile_id: String,
    pub subject: String,
    pub action: String,
    pub resource: String,
    pub effect: Effect,
    pub description: Option<String>,
    pub system_policy: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&Policy> for PolicyView {
    fn from(policy: &Policy) -> Self {
        Self {
            id: policy.id.to_string(),
            profile_id: policy.profile_id.to_string(),
            subject: policy.subject.to_urn(),
            action: policy.action.to_string(),
            resource: policy.resource.to_string(),
            effect: policy.effect,
            description: policy.description.clone(),
            system_policy: policy.system_policy,
            created_at: policy.created_at,
            created_by: policy.created_by.clone(),
            updated_at: policy.updated_at,
        }
    }
}

impl From<Policy> for PolicyView {
    fn from(policy: Policy) -> Self {
        Self::from(&policy)
    }
}

/// Policy command/query service.
#[derive(Clone)]
pub struct PolicyService {
    repository: Arc<dyn PolicyRepository>,
    resolver: AuthorizationResolver,
    config: Arc<EngineConfig>,
}

impl std::fmt::Debug for PolicyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PolicyService {
    /// Create a service with default configuration.
    pub fn new(repository: Arc<dyn PolicyRepository>) -> Self {
        Self::with_config(repository, EngineConfig::default())
    }

    /// Create a service with custom configuration.
    pub fn with_config(repository: Arc<dyn PolicyRepository>, config: EngineConfig) -> Self {
        Self {
            resolver: AuthorizationResolver::with_config(repository.clone(), config.clone()),
            repository,
            config: Arc::new(config),
        }
    }

    /// Get the resolver backing the authorization queries.
    pub fn resolver(&self) -> &AuthorizationResolver {
        &self.resolver
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Create and persist a policy.
    #[instrument(skip(self, command), fields(profile_id = %command.profile_id, subject = %command.subject))]
    pub async fn create_policy(&self, command: CreatePolicy) -> AuthzResult<Policy> {
        if command.created_by.trim().is_empty() {
            return Err(AuthzError::MissingField("created_by"));
        }

        let subject = Subject::from_urn(&command.subject)?;
        let action = Action::new(command.action_pattern)?;
        let resource = match command.resource_pattern {
            Some(pattern) => Resource::new(pattern)?,
            None => Resource::all(),
        };
        let effect = match command.effect.as_deref() {
            Some(effect) => Effect::parse(effect)?,
            None => Effect::default(),
        };

        let policy = Policy::create(
            command.profile_id,
            subject,
            action,
            resource,
            effect,
            command.description,
            command.created_by,
        );
        self.repository.save(policy.clone()).await?;

        info!(
            policy_id = %policy.id,
            action = %policy.action,
            effect = %policy.effect,
            "Policy created"
        );
        Ok(policy)
    }

    /// Update a policy's action, resource, effect or description.
    ///
    /// The policy is read, modified and saved as separate repository calls
    /// and [`PolicyRepository::save`] is an unconditional upsert. A
    /// `delete_policy` landing between the read and the save is undone:
    /// the updated policy is written back. Callers needing delete to win
    /// must serialize commands per policy id or use a repository whose
    /// `save` refuses ids it no longer holds.
    #[instrument(skip(self, command), fields(policy_id = %command.policy_id))]
    pub async fn update_policy(&self, command: UpdatePolicy) -> AuthzResult<Policy> {
        let action = command.action_pattern.map(Action::new).transpose()?;
        let resource = command.resource_pattern.map(Resource::new).transpose()?;
        let effect = command.effect.as_deref().map(Effect::parse).transpose()?;

        let mut policy = self.load_mutable(&command.policy_id).await?;
        policy.update(action, resource, effect, command.description);
        self.repository.save(policy.clone()).await?;

        info!(policy_id = %policy.id, "Policy updated");
        Ok(policy)
    }

    /// Delete a policy.
    #[instrument(skip(self, command), fields(policy_id = %command.policy_id))]
    pub async fn delete_policy(&self, command: DeletePolicy) -> AuthzResult<()> {
        if self.config.protect_system_policies {
            self.load_mutable(&command.policy_id).await?;
        } else if !self.repository.exists_by_id(&command.policy_id).await? {
            warn!("Delete refused: policy not found");
            return Err(AuthzError::PolicyNotFound(command.policy_id));
        }

        self.repository.delete_by_id(&command.policy_id).await?;

        info!("Policy deleted");
        Ok(())
    }

    /// Persist the default system policies of a predefined role.
    ///
    /// Seeded ids are deterministic, so seeding twice overwrites.
    #[instrument(skip(self, command), fields(profile_id = %command.profile_id, role = %command.role_name))]
    pub async fn seed_role_defaults(&self, command: SeedRoleDefaults) -> AuthzResult<Vec<Policy>> {
        let role = PredefinedRole::from_name(&command.role_name)?;
        let policies = Policy::for_role(&command.profile_id, role);

        for policy in &policies {
            self.repository.save(policy.clone()).await?;
        }

        info!(count = policies.len(), "Role defaults seeded");
        Ok(policies)
    }

    /// Fetch a policy for mutation, refusing missing and protected ones.
    async fn load_mutable(&self, policy_id: &PolicyId) -> AuthzResult<Policy> {
        let policy = match self.repository.find_by_id(policy_id).await? {
            Some(policy) => policy,
            None => {
                warn!(policy_id = %policy_id, "Policy not found");
                return Err(AuthzError::PolicyNotFound(policy_id.clone()));
            }
        };

        if self.config.protect_system_policies && policy.system_policy {
            warn!(policy_id = %policy_id, "Refusing to modify system policy");
            return Err(AuthzError::SystemPolicyProtected(policy_id.clone()));
        }

        Ok(policy)
    }

    // =========================================================================
    // Policy queries
    // =========================================================================

    /// List every policy of a profile.
    pub async fn list_policies_by_profile(
        &self,
        profile_id: &ProfileId,
    ) -> AuthzResult<Vec<PolicyView>> {
        let policies = self.repository.find_by_profile_id(profile_id).await?;
        Ok(policies.iter().map(PolicyView::from).collect())
    }

    /// List the policies of one subject in a profile.
    pub async fn list_policies_by_subject(
        &self,
        profile_id: &ProfileId,
        subject_urn: &str,
    ) -> AuthzResult<Vec<PolicyView>> {
        let subject = Subject::from_urn(subject_urn)?;
        let policies = self
            .repository
            .find_by_profile_id_and_subject(profile_id, &subject)
            .await?;
        Ok(policies.iter().map(PolicyView::from).collect())
    }

    /// Get a policy by id.
    pub async fn get_policy_by_id(&self, policy_id: &PolicyId) -> AuthzResult<Option<PolicyView>> {
        let policy = self.repository.find_by_id(policy_id).await?;
        Ok(policy.map(PolicyView::from))
    }

    // =========================================================================
    // Authorization queries
    // =========================================================================

    /// Decide a caller's request.
    ///
    /// Role names that are not valid role identifiers are a validation
    /// error rather than being dropped.
    pub async fn check_authorization(
        &self,
        request: &AuthorizationRequest,
    ) -> AuthzResult<AuthorizationDecision> {
        let action = Action::new(request.action.as_str())?;
        let subjects = request.caller.subjects()?;
        let resource_id = request
            .resource_id
            .as_deref()
            .unwrap_or(&self.config.default_resource);

        Ok(self
            .resolver
            .check_authorization(&request.caller.profile_id, &subjects, &action, resource_id)
            .await?)
    }

    /// Every policy applying to the caller.
    pub async fn get_effective_permissions(&self, caller: &Caller) -> AuthzResult<Vec<PolicyView>> {
        let subjects = caller.subjects()?;
        let policies = self
            .resolver
            .get_effective_permissions(&caller.profile_id, &subjects)
            .await?;
        Ok(policies.iter().map(PolicyView::from).collect())
    }

    /// Actions the caller may perform on any resource.
    pub async fn get_allowed_actions(&self, caller: &Caller) -> AuthzResult<BTreeSet<String>> {
        let subjects = caller.subjects()?;
        Ok(self
            .resolver
            .get_allowed_actions(&caller.profile_id, &subjects)
            .await?)
    }
}
