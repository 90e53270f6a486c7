//! In-memory policy repository
//!
//! Suitable for single-process deployments and tests. Storage adapters for
//! real databases implement the same [`PolicyRepository`] trait.

use async_trait::async_trait;
use policy_types::{ProfileId, Subject};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::policy::{Policy, PolicyId};
use crate::repository::{PolicyRepository, RepositoryResult};

/// Repository statistics.
#[derive(Debug, Clone, Default)]
pub struct RepositoryStats {
    /// Stored policies
    pub policies: usize,
    /// Distinct profiles with at least one policy
    pub profiles: usize,
    /// Stored policies flagged as system policies
    pub system_policies: usize,
}

/// In-memory policy repository.
///
/// Reads return a point-in-time snapshot; a write landing during a read
/// may or may not be observed by it.
#[derive(Clone, Default)]
pub struct MemoryPolicyRepository {
    /// Policies by id
    policies: Arc<RwLock<HashMap<PolicyId, Policy>>>,
}

impl std::fmt::Debug for MemoryPolicyRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPolicyRepository").finish_non_exhaustive()
    }
}

impl MemoryPolicyRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-loaded with policies.
    pub fn with_policies(policies: impl IntoIterator<Item = Policy>) -> Self {
        let map = policies
            .into_iter()
            .map(|policy| (policy.id.clone(), policy))
            .collect();
        Self {
            policies: Arc::new(RwLock::new(map)),
        }
    }

    /// Get repository stats.
    pub async fn stats(&self) -> RepositoryStats {
        let policies = self.policies.read().await;
        let profiles: HashSet<&ProfileId> = policies.values().map(|p| &p.profile_id).collect();
        RepositoryStats {
            policies: policies.len(),
            profiles: profiles.len(),
            system_policies: policies.values().filter(|p| p.system_policy).count(),
        }
    }

    /// Collect matching policies in creation order.
    async fn collect<F>(&self, predicate: F) -> Vec<Policy>
    where
        F: Fn(&Policy) -> bool,
    {
        let policies = self.policies.read().await;
        let mut found: Vec<Policy> = policies.values().filter(|&p| predicate(p)).cloned().collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        found
    }
}

#[async_trait]
impl PolicyRepository for MemoryPolicyRepository {
    async fn save(&self, policy: Policy) -> RepositoryResult<()> {
        let mut policies = self.policies.write().await;
        tracing::trace!(policy_id = %policy.id, "Storing policy");
        policies.insert(policy.id.clone(), policy);
        Ok(())
    }

    async fn find_by_id(&self, id: &PolicyId) -> RepositoryResult<Option<Policy>> {
        Ok(self.policies.read().await.get(id).cloned())
    }

    async fn find_by_profile_id(&self, profile_id: &ProfileId) -> RepositoryResult<Vec<Policy>> {
        Ok(self.collect(|p| &p.profile_id == profile_id).await)
    }

    async fn find_by_profile_id_and_subject(
        &self,
        profile_id: &ProfileId,
        subject: &Subject,
    ) -> RepositoryResult<Vec<Policy>> {
        Ok(self
            .collect(|p| &p.profile_id == profile_id && p.applies_to(subject))
            .await)
    }

    async fn find_by_profile_id_and_subjects(
        &self,
        profile_id: &ProfileId,
        subjects: &[Subject],
    ) -> RepositoryResult<Vec<Policy>> {
        if subjects.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: HashSet<&Subject> = subjects.iter().collect();
        Ok(self
            .collect(|p| &p.profile_id == profile_id && wanted.contains(&p.subject))
            .await)
    }

    async fn delete_by_id(&self, id: &PolicyId) -> RepositoryResult<()> {
        self.policies.write().await.remove(id);
        Ok(())
    }

    async fn exists_by_id(&self, id: &PolicyId) -> RepositoryResult<bool> {
        Ok(self.policies.read().await.contains_key(id))
    }
}
