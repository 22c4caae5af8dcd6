//! API key authentication for the local REST backend.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

/// Security configuration loaded from environment variables.
#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    /// API key for authentication (from FEATURE_POLICIES_API_KEY)
    pub api_key: Option<String>,
    /// Allowed CORS origins (from FEATURE_POLICIES_CORS_ORIGINS, comma-separated)
    pub cors_origins: Option<Vec<String>>,
}

impl SecurityConfig {
    /// Load security configuration from environment variables.
    pub fn from_env() -> Self {
        let api_key = std::env::var("FEATURE_POLICIES_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        let cors_origins = std::env::var("FEATURE_POLICIES_CORS_ORIGINS")
            .ok()
            .map(|s| s.split(',').map(|s| s.trim().to_string()).collect());

        Self {
            api_key,
            cors_origins,
        }
    }

    /// Create a config with no authentication (for local development/testing).
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Create a config with authentication enabled.
    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            cors_origins: None,
        }
    }
}

/// Extract the presented key from `Authorization: Bearer` or `apikey`.
///
/// `Ok(None)` means no credentials were sent; `Err` means an
/// `Authorization` header with an unsupported scheme.
fn presented_key(request: &Request<Body>) -> Result<Option<&str>, ()> {
    if let Some(header) = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        return header.strip_prefix("Bearer ").map(Some).ok_or(());
    }

    Ok(request
        .headers()
        .get("apikey")
        .and_then(|h| h.to_str().ok()))
}

/// Authentication middleware that checks for valid API key.
pub async fn auth_middleware(
    State(config): State<SecurityConfig>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected_key = match &config.api_key {
        Some(key) => key,
        None => return Ok(next.run(request).await),
    };

    match presented_key(&request) {
        Ok(Some(token)) if token == expected_key => {}
        Ok(Some(_)) => {
            tracing::warn!("Invalid API key provided");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Ok(None) => {
            tracing::warn!("Missing Authorization header");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(()) => {
            tracing::warn!("Invalid Authorization header format");
            return Err(StatusCode::UNAUTHORIZED);
        }
    }

    Ok(next.run(request).await)
}
