//! Permission policy aggregate
//!
//! A policy grants or denies one subject an action pattern over a resource
//! pattern inside one profile. Policies are created through
//! [`Policy::create`], rebuilt from storage through
//! [`Policy::reconstitute`], and mutated only through [`Policy::update`].

use chrono::{DateTime, Utc};
use policy_types::{Action, Effect, PredefinedRole, ProfileId, Resource, Subject};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Author recorded on policies seeded from the predefined role catalog.
pub const SYSTEM_AUTHOR: &str = "SYSTEM";

/// Identifier of a policy. Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(String);

impl PolicyId {
    /// Wrap an existing identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh identifier for an administrator-created policy.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Deterministic identifier for a predefined role's seeded policy.
    pub fn for_role(role: PredefinedRole, suffix: &str) -> Self {
        Self(format!("system:role:{}:{}", role.role_name(), suffix))
    }

    /// Get the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PolicyId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The persisted unit of the permission model.
///
/// # Architecture
///
/// ```text
/// Profile
///   └─ Policy (id)
///        ├─ Subject      user:{uuid} | group:{uuid} | role:{NAME}
///        ├─ Action       payments.*
///        ├─ Resource     acct:123,acct:456
///        └─ Effect       ALLOW | DENY
/// ```
///
/// Several policies may target the same `(profile_id, subject)` pair with
/// any combination of action, resource and effect.
///
/// # Examples
///
/// ```
/// use policy_store::Policy;
/// use policy_types::{Action, Effect, ProfileId, Resource, Subject};
///
/// let policy = Policy::create(
///     ProfileId::new("profile-1"),
///     Subject::role("CREATOR").unwrap(),
///     Action::new("payments.*").unwrap(),
///     Resource::all(),
///     Effect::Allow,
///     Some("Creators manage payments".to_string()),
///     "admin@example.com",
/// );
/// assert!(!policy.system_policy);
/// assert!(policy.matches(&Action::new("payments.create").unwrap(), "acct:1"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Unique identifier
    pub id: PolicyId,

    /// Profile (tenant scope) the policy belongs to
    pub profile_id: ProfileId,

    /// Who the policy applies to
    pub subject: Subject,

    /// Action pattern
    pub action: Action,

    /// Resource pattern
    pub resource: Resource,

    /// ALLOW or DENY
    pub effect: Effect,

    /// Optional free-text description
    pub description: Option<String>,

    /// Whether the policy was seeded from a predefined role
    pub system_policy: bool,

    /// When the policy was created
    pub created_at: DateTime<Utc>,

    /// Who created the policy
    pub created_by: String,

    /// When the policy was last updated
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    /// Creates an administrator-authored policy with a fresh id.
    ///
    /// `created_at` and `updated_at` are both set to now; `system_policy`
    /// is false.
    pub fn create(
        profile_id: ProfileId,
        subject: Subject,
        action: Action,
        resource: Resource,
        effect: Effect,
        description: Option<String>,
        created_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PolicyId::generate(),
            profile_id,
            subject,
            action,
            resource,
            effect,
            description,
            system_policy: false,
            created_at: now,
            created_by: created_by.into(),
            updated_at: now,
        }
    }

    /// Rebuilds a policy from every persisted field.
    ///
    /// Storage adapters use this instead of mutating fields after
    /// construction; nothing is defaulted or regenerated.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: PolicyId,
        profile_id: ProfileId,
        subject: Subject,
        action: Action,
        resource: Resource,
        effect: Effect,
        description: Option<String>,
        system_policy: bool,
        created_at: DateTime<Utc>,
        created_by: String,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            profile_id,
            subject,
            action,
            resource,
            effect,
            description,
            system_policy,
            created_at,
            created_by,
            updated_at,
        }
    }

    /// Applies an in-place update.
    ///
    /// Only the action, resource, effect and description are mutable;
    /// `None` leaves a field unchanged. The subject, profile and id never
    /// change. `updated_at` is bumped.
    pub fn update(
        &mut self,
        action: Option<Action>,
        resource: Option<Resource>,
        effect: Option<Effect>,
        description: Option<String>,
    ) {
        if let Some(action) = action {
            self.action = action;
        }
        if let Some(resource) = resource {
            self.resource = resource;
        }
        if let Some(effect) = effect {
            self.effect = effect;
        }
        if description.is_some() {
            self.description = description;
        }
        self.updated_at = Utc::now();
    }

    /// Builds the default system policies of a predefined role for a
    /// profile: one ALLOW policy on `*` resources per action pattern.
    ///
    /// Ids are deterministic (`system:role:{ROLE}:{n}`) so seeding the same
    /// role twice overwrites rather than duplicates.
    pub fn for_role(profile_id: &ProfileId, role: PredefinedRole) -> Vec<Self> {
        let now = Utc::now();
        let subject = match Subject::role(role.role_name()) {
            Ok(subject) => subject,
            Err(_) => return Vec::new(),
        };

        role.actions()
            .into_iter()
            .enumerate()
            .map(|(index, action)| Self {
                id: PolicyId::for_role(role, &index.to_string()),
                profile_id: profile_id.clone(),
                subject: subject.clone(),
                description: Some(format!("{}: {}", role.description(), action)),
                action,
                resource: Resource::all(),
                effect: Effect::Allow,
                system_policy: true,
                created_at: now,
                created_by: SYSTEM_AUTHOR.to_string(),
                updated_at: now,
            })
            .collect()
    }

    /// Builds system policies for every predefined role among `role_names`.
    ///
    /// Names outside the catalog are skipped.
    pub fn for_role_names<'a, I>(profile_id: &ProfileId, role_names: I) -> Vec<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        role_names
            .into_iter()
            .filter_map(|name| PredefinedRole::from_name(name).ok())
            .flat_map(|role| Self::for_role(profile_id, role))
            .collect()
    }

    /// Check if this policy's action and resource patterns both match.
    pub fn matches(&self, action: &Action, resource_id: &str) -> bool {
        self.action.matches(action) && self.resource.matches(resource_id)
    }

    /// Check if this policy's action pattern matches, ignoring resources.
    pub fn matches_action(&self, action: &Action) -> bool {
        self.action.matches(action)
    }

    /// Check if the policy targets exactly this subject.
    pub fn applies_to(&self, subject: &Subject) -> bool {
        &self.subject == subject
    }

    /// Check if the policy targets any of the given subjects.
    pub fn applies_to_any<'a, I>(&self, subjects: I) -> bool
    where
        I: IntoIterator<Item = &'a Subject>,
    {
        subjects.into_iter().any(|subject| self.applies_to(subject))
    }

    /// Check if this is an explicit deny.
    pub fn is_deny(&self) -> bool {
        self.effect == Effect::Deny
    }
}
