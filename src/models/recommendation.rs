use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A candidate policy text suggested by the recommendation service.
///
/// Recommendations live only in memory for the lifetime of a modal; they are
/// never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub contents: String,
    #[serde(default)]
    pub selected: bool,
}

impl Recommendation {
    /// Wrap a raw recommendation text, initially unselected.
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            selected: false,
        }
    }
}

/// Request body sent to the recommendation function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub project_id: Uuid,
    pub count: u32,
    pub language: String,
    pub selected_feature_id: Uuid,
}

/// Envelope returned by the recommendation function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<RecommendationData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationData {
    #[serde(default)]
    pub recommendations: Option<Vec<RecommendedText>>,
}

/// A single raw item from the service payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedText {
    pub contents: String,
}
