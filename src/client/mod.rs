//! HTTP clients for the hosted backend.
//!
//! - [`RecommendationClient`] calls the policy recommendation function.
//! - [`RestStore`] implements the store traits over the REST data API.
//!
//! Both share [`Transport`], which owns the base URL, the optional API key and
//! the status-to-error mapping.

mod recommendation;
mod rest;

pub use recommendation::RecommendationClient;
pub use rest::RestStore;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::store::StoreError;

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request rejected ({status}): {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("Unauthorized: API key required or invalid")]
    Unauthorized(StatusCode),

    #[error("Server error: {status}: {body}")]
    Server { status: StatusCode, body: String },
}

impl ClientError {
    /// HTTP status behind the error, when one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http(e) => e.status(),
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND),
            Self::Rejected { status, .. }
            | Self::Unauthorized(status)
            | Self::Server { status, .. } => Some(*status),
        }
    }
}

impl From<ClientError> for StoreError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Http(e) if e.is_decode() => StoreError::Backend(e.to_string()),
            ClientError::Http(e) => StoreError::Transport(e.to_string()),
            ClientError::NotFound(body) => StoreError::NotFound(body),
            ClientError::Rejected { body, .. } => StoreError::Rejected(body),
            ClientError::Unauthorized(_) => StoreError::Unauthorized,
            ClientError::Server { status, body } => {
                StoreError::Backend(format!("{}: {}", status, body))
            }
        }
    }
}

/// Base URL plus credentials shared by the HTTP clients.
#[derive(Debug, Clone)]
pub struct Transport {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl Transport {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with optional auth headers.
    ///
    /// The key is sent both as `apikey` and as a bearer token, which is what
    /// the hosted gateway expects.
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.header("apikey", key).bearer_auth(key);
        }
        req
    }

    /// Handle response, converting HTTP errors to ClientError.
    pub async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(body),
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Rejected { status, body }
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized(status),
            _ => ClientError::Server { status, body },
        })
    }
}
