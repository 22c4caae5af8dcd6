//! Client-side dialog flows.
//!
//! [`PolicyRecommendationModal`] is the AI recommendation dialog: it fetches
//! candidate policy texts, lets the user select some, and attaches the
//! selection to a feature as a sequential batch. The single-field
//! organization and actor dialogs live in [`forms`].
//!
//! Phases of the recommendation dialog:
//!
//! ```text
//! Idle ──fetch──▶ Loading ──▶ Failed ──fetch──▶ Loading
//!                    │
//!                    └──▶ Ready ──submit──▶ Submitting ──▶ Ready (items left / partial failure)
//!                          ▲ │                          └─▶ Closed (everything submitted)
//!                          └─┘ fetch (retry)
//! ```
//!
//! The phase is the only mutual exclusion between fetch and submit.

mod batch;
mod cancel;
mod fetcher;
pub mod forms;
mod selection;

pub use batch::*;
pub use cancel::*;
pub use fetcher::*;
pub use selection::*;

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::i18n::Localizer;
use crate::models::*;
use crate::notify::Notifier;
use crate::store::PolicyStore;

/// Input rejected before any external call.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Recommendation count must be positive")]
    ZeroCount,

    #[error("No recommendations selected")]
    EmptySelection,

    #[error("Name is required")]
    BlankName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalPhase {
    Idle,
    Loading,
    /// Fetch failed; holds the message shown inline.
    Failed(String),
    /// Recommendations are listed and selectable.
    Ready,
    Submitting,
    Closed,
}

#[derive(Debug, Error)]
pub enum ModalError {
    #[error("Another request is in progress ({0:?})")]
    Busy(ModalPhase),

    #[error("Modal is closed")]
    Closed,

    #[error("No recommendations are listed")]
    NothingListed,

    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Who and what a recommendation dialog is opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalContext {
    pub project_id: Uuid,
    pub feature_id: Uuid,
    pub author_id: Uuid,
    /// How many recommendations to ask for.
    pub count: u32,
}

impl ModalContext {
    pub fn new(project_id: Uuid, feature_id: Uuid, author_id: Uuid) -> Self {
        Self {
            project_id,
            feature_id,
            author_id,
            count: DEFAULT_RECOMMENDATION_COUNT,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }
}

/// Collaborators shared by dialog instances.
#[derive(Clone)]
pub struct ModalServices {
    pub source: Arc<dyn RecommendationSource>,
    pub store: Arc<dyn PolicyStore>,
    pub notifier: Arc<dyn Notifier>,
    pub localizer: Arc<dyn Localizer>,
}

/// Result of a fully successful submit.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub added: Vec<AddedPolicy>,
    /// Whether the dialog closed because nothing was left to choose from.
    pub closed: bool,
}

/// State machine behind the AI policy recommendation dialog.
pub struct PolicyRecommendationModal {
    context: ModalContext,
    services: ModalServices,
    phase: ModalPhase,
    selection: Selection,
    cancel: CancelHandle,
}

impl PolicyRecommendationModal {
    pub fn new(context: ModalContext, services: ModalServices) -> Self {
        Self {
            context,
            services,
            phase: ModalPhase::Idle,
            selection: Selection::default(),
            cancel: CancelHandle::new(),
        }
    }

    pub fn context(&self) -> &ModalContext {
        &self.context
    }

    pub fn phase(&self) -> &ModalPhase {
        &self.phase
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        self.selection.items()
    }

    pub fn selected_count(&self) -> usize {
        self.selection.selected_count()
    }

    /// Inline error text of a failed fetch.
    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            ModalPhase::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.phase == ModalPhase::Ready && self.selection.selected_count() > 0
    }

    /// Handle for closing the dialog from another task while a request is
    /// awaited.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Heading above the list, with the selected count once anything is
    /// selected.
    pub fn selection_summary(&self) -> String {
        let localizer = &self.services.localizer;
        let mut summary = localizer.text("policy.ai_select_policies");
        let count = self.selection.selected_count();
        if count > 0 {
            summary.push_str(&format!(
                " ({}{})",
                count,
                localizer.text("policy.ai_selected_suffix")
            ));
        }
        summary
    }

    /// Fetch a fresh set of recommendations, replacing the current list.
    ///
    /// Returns how many were received. The previous list is cleared before
    /// the request goes out, so nothing stale survives a retry.
    pub async fn fetch(&mut self) -> Result<usize, ModalError> {
        match self.phase {
            ModalPhase::Closed => return Err(ModalError::Closed),
            ModalPhase::Loading | ModalPhase::Submitting => {
                return Err(ModalError::Busy(self.phase.clone()))
            }
            _ => {}
        }

        let request = RecommendationRequest::new(
            self.context.project_id,
            self.context.feature_id,
            self.context.count,
            self.services.localizer.locale().as_str(),
        )?;

        self.selection.clear();
        self.phase = ModalPhase::Loading;

        let outcome = self
            .cancel
            .run(fetch_recommendations(
                self.services.source.as_ref(),
                &request,
            ))
            .await;

        match outcome {
            None => {
                tracing::debug!("Recommendation result discarded after close");
                self.close();
                Err(ModalError::Cancelled)
            }
            Some(Ok(items)) => {
                let count = items.len();
                self.selection.replace(items);
                self.phase = if count == 0 {
                    ModalPhase::Idle
                } else {
                    ModalPhase::Ready
                };
                Ok(count)
            }
            Some(Err(e)) => {
                tracing::warn!("AI recommendation error: {}", e);
                let message = e.display_message(self.services.localizer.as_ref());
                self.phase = ModalPhase::Failed(message);
                Err(e.into())
            }
        }
    }

    /// Flip the selection of one listed recommendation.
    pub fn toggle(&mut self, index: usize) -> Result<(), ModalError> {
        match self.phase {
            ModalPhase::Ready => Ok(self.selection.toggle(index)?),
            ModalPhase::Closed => Err(ModalError::Closed),
            ModalPhase::Idle | ModalPhase::Failed(_) => Err(ModalError::NothingListed),
            ModalPhase::Loading | ModalPhase::Submitting => {
                Err(ModalError::Busy(self.phase.clone()))
            }
        }
    }

    /// Attach every selected recommendation to the feature.
    ///
    /// Committed recommendations leave the list, including those committed
    /// before a failure; the rest stay selectable. If the dialog is closed
    /// while the batch runs, the committed pairs come back in
    /// [`BatchError::Cancelled`] and no notice is shown.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ModalError> {
        match self.phase {
            ModalPhase::Ready => {}
            ModalPhase::Closed => return Err(ModalError::Closed),
            ModalPhase::Idle | ModalPhase::Failed(_) => return Err(ModalError::NothingListed),
            ModalPhase::Loading | ModalPhase::Submitting => {
                return Err(ModalError::Busy(self.phase.clone()))
            }
        }

        let candidates: Vec<Recommendation> = self.selection.selected().cloned().collect();
        if candidates.is_empty() {
            return Err(ValidationError::EmptySelection.into());
        }

        self.phase = ModalPhase::Submitting;
        let context = SubmitContext {
            project_id: self.context.project_id,
            feature_id: self.context.feature_id,
            author_id: self.context.author_id,
        };
        let result = batch::submit(
            self.services.store.as_ref(),
            &candidates,
            &context,
            &self.cancel,
        )
        .await;

        let localizer = Arc::clone(&self.services.localizer);
        match result {
            Ok(added) if self.cancel.is_cancelled() => {
                // Closed while the last pair was being written.
                tracing::debug!(committed = added.len(), "Submit result discarded after close");
                self.close();
                Err(BatchError::Cancelled { added }.into())
            }
            Ok(added) => {
                self.selection.remove_selected();
                self.services.notifier.show_success(
                    &localizer.text("policy.ai_modal_title"),
                    &format!("{}{}", added.len(), localizer.text("policy.ai_policies_added")),
                );
                let closed = self.selection.is_empty();
                if closed {
                    self.close();
                } else {
                    self.phase = ModalPhase::Ready;
                }
                Ok(SubmitOutcome { added, closed })
            }
            Err(e @ BatchError::Cancelled { .. }) => {
                self.close();
                Err(e.into())
            }
            Err(BatchError::Empty) => {
                self.phase = ModalPhase::Ready;
                Err(ValidationError::EmptySelection.into())
            }
            Err(e) => {
                tracing::error!("Error adding recommended policies: {}", e);
                self.selection.remove_first_selected(e.added().len());
                self.services.notifier.show_error(
                    &localizer.text("policy.add_error_title"),
                    &localizer.text("policy.add_error_desc"),
                );
                self.phase = ModalPhase::Ready;
                Err(e.into())
            }
        }
    }

    /// Close the dialog, cancelling anything in flight. Always succeeds.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.selection.clear();
        self.phase = ModalPhase::Closed;
    }
}
