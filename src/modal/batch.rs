//! Sequential submission of selected recommendations.

use thiserror::Error;
use uuid::Uuid;

use super::CancelHandle;
use crate::models::*;
use crate::store::{LinkedWriteError, PolicyStore};

/// Ids every policy in a batch is written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitContext {
    pub project_id: Uuid,
    pub feature_id: Uuid,
    pub author_id: Uuid,
}

/// A batch that stopped at a failing candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAbort {
    /// Pairs committed before the failure, in input order.
    pub added: Vec<AddedPolicy>,
    /// Zero-based index of the candidate that failed.
    pub failed_index: usize,
    pub failed_contents: String,
    pub cause: LinkedWriteError,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("No recommendations selected")]
    Empty,

    #[error(
        "Batch aborted at candidate {} after {} succeeded: {}",
        .0.failed_index + 1,
        .0.added.len(),
        .0.cause
    )]
    Aborted(Box<BatchAbort>),

    #[error("Batch cancelled after {} succeeded", .added.len())]
    Cancelled { added: Vec<AddedPolicy> },
}

impl BatchError {
    /// Pairs that were durably committed before the batch stopped.
    pub fn added(&self) -> &[AddedPolicy] {
        match self {
            Self::Empty => &[],
            Self::Aborted(abort) => &abort.added,
            Self::Cancelled { added } => added,
        }
    }

    pub fn into_added(self) -> Vec<AddedPolicy> {
        match self {
            Self::Empty => Vec::new(),
            Self::Aborted(abort) => abort.added,
            Self::Cancelled { added } => added,
        }
    }
}

/// Write each candidate as a policy linked to the context's feature.
///
/// Candidates are processed one at a time in input order; the first failure
/// stops the batch and later candidates are never attempted. Pairs written
/// before a failure stay committed. Cancellation is checked between
/// candidates, never in the middle of a pair.
pub async fn submit(
    store: &dyn PolicyStore,
    candidates: &[Recommendation],
    context: &SubmitContext,
    cancel: &CancelHandle,
) -> Result<Vec<AddedPolicy>, BatchError> {
    if candidates.is_empty() {
        return Err(BatchError::Empty);
    }

    let mut added = Vec::with_capacity(candidates.len());

    for (index, candidate) in candidates.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::info!(
                committed = added.len(),
                remaining = candidates.len() - index,
                "Policy batch cancelled"
            );
            return Err(BatchError::Cancelled { added });
        }

        let input = CreatePolicyInput {
            project_id: context.project_id,
            contents: candidate.contents.clone(),
            author_id: context.author_id,
        };

        match store.create_linked_policy(&input, context.feature_id).await {
            Ok(pair) => {
                tracing::debug!(policy_id = %pair.policy.id, index, "Policy added to feature");
                added.push(pair);
            }
            Err(cause) => {
                tracing::warn!(
                    index,
                    committed = added.len(),
                    "Policy batch aborted: {}",
                    cause
                );
                return Err(BatchError::Aborted(Box::new(BatchAbort {
                    added,
                    failed_index: index,
                    failed_contents: candidate.contents.clone(),
                    cause,
                })));
            }
        }
    }

    tracing::info!(
        feature_id = %context.feature_id,
        count = added.len(),
        "Policy batch committed"
    );
    Ok(added)
}
