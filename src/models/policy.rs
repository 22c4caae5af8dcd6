use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted text rule belonging to a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Policy {
    pub id: Uuid,
    pub project_id: Uuid,
    pub contents: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a policy. Field names match the `policies` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePolicyInput {
    pub project_id: Uuid,
    pub contents: String,
    pub author_id: Uuid,
}

/// Join row linking a [`Policy`] to a feature.
///
/// A link must never outlive (or predate) the policy it references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeaturePolicy {
    pub id: Uuid,
    pub feature_id: Uuid,
    pub policy_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a feature/policy link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeaturePolicyInput {
    pub feature_id: Uuid,
    pub policy_id: Uuid,
}

/// A policy together with the link attaching it to the selected feature.
///
/// The policy fields are flattened into the JSON representation, with the
/// link nested under `link`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddedPolicy {
    #[serde(flatten)]
    pub policy: Policy,
    pub link: FeaturePolicy,
}
