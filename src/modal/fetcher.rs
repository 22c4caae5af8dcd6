//! Recommendation retrieval.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::ValidationError;
use crate::i18n::Localizer;
use crate::models::*;

/// Number of recommendations asked for when the caller does not say.
pub const DEFAULT_RECOMMENDATION_COUNT: u32 = 5;

/// Failure to obtain recommendations. No partial results survive any variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("Recommendation request failed: {0}")]
    Transport(String),

    #[error("Invalid recommendation response: {0}")]
    Decode(String),

    #[error("{}", .0.as_deref().unwrap_or("Recommendation service reported a failure"))]
    Rejected(Option<String>),

    #[error("Recommendation response contained no recommendations")]
    MissingPayload,
}

impl FetchError {
    /// Message for the inline error area.
    ///
    /// A message sent by the service is shown verbatim; payload problems
    /// without one fall back to the localized generic text.
    pub fn display_message(&self, localizer: &dyn Localizer) -> String {
        match self {
            Self::Rejected(Some(message)) => message.clone(),
            Self::Rejected(None) | Self::MissingPayload => localizer.text("policy.ai_error"),
            other => other.to_string(),
        }
    }
}

/// The external recommendation service.
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    /// Issue one request and return the raw envelope.
    ///
    /// Implementations map non-2xx statuses to [`FetchError::Status`] and
    /// undecodable bodies to [`FetchError::Decode`]; envelope semantics are
    /// interpreted by [`fetch_recommendations`].
    async fn request_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationEnvelope, FetchError>;
}

impl RecommendationRequest {
    /// Build a request, rejecting a zero count before anything is sent.
    pub fn new(
        project_id: Uuid,
        feature_id: Uuid,
        count: u32,
        language: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if count == 0 {
            return Err(ValidationError::ZeroCount);
        }
        Ok(Self {
            project_id,
            count,
            language: language.into(),
            selected_feature_id: feature_id,
        })
    }
}

/// Fetch recommendations and wrap each as unselected.
pub async fn fetch_recommendations(
    source: &dyn RecommendationSource,
    request: &RecommendationRequest,
) -> Result<Vec<Recommendation>, FetchError> {
    tracing::debug!(
        project_id = %request.project_id,
        feature_id = %request.selected_feature_id,
        count = request.count,
        "Requesting policy recommendations"
    );

    let envelope = source.request_recommendations(request).await?;
    interpret_envelope(envelope)
}

fn interpret_envelope(envelope: RecommendationEnvelope) -> Result<Vec<Recommendation>, FetchError> {
    if !envelope.success {
        return Err(FetchError::Rejected(envelope.error));
    }

    let items = envelope
        .data
        .and_then(|data| data.recommendations)
        .ok_or(FetchError::MissingPayload)?;

    Ok(items
        .into_iter()
        .map(|item| Recommendation::new(item.contents))
        .collect())
}
