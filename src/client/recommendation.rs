use async_trait::async_trait;
use reqwest::{Client, Method};

use super::{ClientError, Transport};
use crate::models::{RecommendationEnvelope, RecommendationRequest};
use crate::modal::{FetchError, RecommendationSource};

/// Path of the recommendation function below the functions base URL.
const RECOMMENDATION_PATH: &str = "/ai-policy-recommendation";

/// HTTP client for the policy recommendation function.
#[derive(Debug, Clone)]
pub struct RecommendationClient {
    transport: Transport,
}

impl RecommendationClient {
    /// Create with explicit configuration.
    pub fn new(functions_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            transport: Transport::new(functions_url, api_key),
        }
    }

    /// Create reusing an existing connection pool.
    pub fn with_client(
        client: Client,
        functions_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            transport: Transport::with_client(client, functions_url, api_key),
        }
    }
}

#[async_trait]
impl RecommendationSource for RecommendationClient {
    async fn request_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationEnvelope, FetchError> {
        let response = self
            .transport
            .request(Method::POST, RECOMMENDATION_PATH)
            .json(request)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        self.transport
            .handle_response(response)
            .await
            .map_err(fetch_error)
    }
}

fn fetch_error(e: ClientError) -> FetchError {
    match e {
        ClientError::Http(e) if e.is_decode() => FetchError::Decode(e.to_string()),
        ClientError::Http(e) => match e.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Transport(e.to_string()),
        },
        other => match other.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Transport(other.to_string()),
        },
    }
}
