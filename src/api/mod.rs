mod handlers;
mod middleware;

pub use middleware::SecurityConfig;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::db::Database;

/// Router without authentication, for local use and tests.
pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, SecurityConfig::disabled())
}

/// Router serving the REST data API under `/rest/v1`.
///
/// Everything except `/health` requires the configured API key.
pub fn create_router_with_config(db: Database, config: SecurityConfig) -> Router {
    let protected = Router::new()
        // Parents
        .route("/projects", post(handlers::create_project))
        .route("/projects/{id}/features", post(handlers::create_feature))
        .route("/projects/{id}/policies", get(handlers::list_project_policies))
        .route("/projects/{id}/actors", get(handlers::list_project_actors))
        // Policies and links
        .route(
            "/policies",
            post(handlers::create_policy).delete(handlers::delete_policy),
        )
        .route("/feature_policies", post(handlers::create_feature_policy))
        .route(
            "/features/{id}/policies",
            get(handlers::list_feature_policies).post(handlers::attach_policy),
        )
        // Organizations / actors
        .route("/organizations", post(handlers::create_organization))
        .route("/actors", post(handlers::create_actor))
        .route_layer(from_fn_with_state(config.clone(), middleware::auth_middleware));

    let api = Router::new()
        .merge(protected)
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/rest/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .with_state(db)
}

fn cors_layer(config: &SecurityConfig) -> CorsLayer {
    match &config.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}
