//! Backend data store abstraction.
//!
//! The modal and form flows never talk to a concrete backend. They go through
//! [`PolicyStore`] and [`WorkspaceStore`], implemented by the local
//! [`Database`](crate::db::Database) and by the HTTP
//! [`RestStore`](crate::client::RestStore).

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;

/// Failure of a single create/delete call against the store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected by store: {0}")]
    Rejected(String),

    #[error("Unauthorized: API key required or invalid")]
    Unauthorized,

    #[error("Store error: {0}")]
    Backend(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// What became of a policy whose link could not be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrphanState {
    /// Both inserts ran in one transaction which was rolled back.
    RolledBack,
    /// The policy was deleted after the link failed.
    Compensated,
    /// The compensating delete failed too; the policy exists without a link.
    Orphaned(StoreError),
}

/// Failure writing a policy and its feature link as a pair.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkedWriteError {
    #[error("Failed to create policy: {0}")]
    CreatePolicy(StoreError),

    #[error("Failed to link policy {policy_id} to feature: {source}")]
    CreateLink {
        policy_id: Uuid,
        source: StoreError,
        orphan: OrphanState,
    },
}

impl LinkedWriteError {
    /// Id of a policy left behind without a link, if any.
    pub fn orphaned_policy(&self) -> Option<Uuid> {
        match self {
            Self::CreateLink {
                policy_id,
                orphan: OrphanState::Orphaned(_),
                ..
            } => Some(*policy_id),
            _ => None,
        }
    }
}

/// Policy persistence used by the batch submitter.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn create_policy(&self, input: &CreatePolicyInput) -> Result<Policy, StoreError>;

    async fn create_feature_policy(
        &self,
        input: &CreateFeaturePolicyInput,
    ) -> Result<FeaturePolicy, StoreError>;

    /// Delete a policy. Returns `false` when it did not exist.
    async fn delete_policy(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Create a policy and link it to `feature_id`.
    ///
    /// The default runs the two writes in order and, when the link fails,
    /// deletes the fresh policy again. Stores with transactions should
    /// override this to make the pair atomic.
    async fn create_linked_policy(
        &self,
        input: &CreatePolicyInput,
        feature_id: Uuid,
    ) -> Result<AddedPolicy, LinkedWriteError> {
        let policy = self
            .create_policy(input)
            .await
            .map_err(LinkedWriteError::CreatePolicy)?;

        let link_input = CreateFeaturePolicyInput {
            feature_id,
            policy_id: policy.id,
        };
        match self.create_feature_policy(&link_input).await {
            Ok(link) => Ok(AddedPolicy { policy, link }),
            Err(source) => {
                let orphan = match self.delete_policy(policy.id).await {
                    Ok(_) => OrphanState::Compensated,
                    Err(e) => {
                        tracing::error!(
                            "Policy {} left without feature link: {}",
                            policy.id,
                            e
                        );
                        OrphanState::Orphaned(e)
                    }
                };
                Err(LinkedWriteError::CreateLink {
                    policy_id: policy.id,
                    source,
                    orphan,
                })
            }
        }
    }
}

/// Organization and actor persistence used by the single-field forms.
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    async fn create_organization(
        &self,
        input: &CreateOrganizationInput,
    ) -> Result<Organization, StoreError>;

    async fn create_actor(&self, input: &CreateActorInput) -> Result<Actor, StoreError>;
}
