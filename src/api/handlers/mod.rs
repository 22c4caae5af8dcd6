use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::Database;
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// Missing parents are validation errors and are returned as-is with a
/// BAD_REQUEST status.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    let msg = e.to_string();

    if msg.contains("not found") {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Row filter in `column=eq.value` form.
#[derive(Debug, Deserialize)]
pub struct IdFilter {
    pub id: String,
}

impl IdFilter {
    fn parse(&self) -> Result<Uuid, (StatusCode, String)> {
        self.id
            .strip_prefix("eq.")
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or((
                StatusCode::BAD_REQUEST,
                format!("Unsupported id filter: {}", self.id),
            ))
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Projects / Features
// ============================================================

pub async fn create_project(
    State(db): State<Database>,
    Json(input): Json<CreateProjectInput>,
) -> Result<(StatusCode, Json<Project>), (StatusCode, String)> {
    db.create_project(input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(internal_error)
}

pub async fn create_feature(
    State(db): State<Database>,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateFeatureInput>,
) -> Result<(StatusCode, Json<Feature>), (StatusCode, String)> {
    db.create_feature(project_id, input)
        .map(|f| (StatusCode::CREATED, Json(f)))
        .map_err(internal_error)
}

pub async fn list_project_policies(
    State(db): State<Database>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Policy>>, (StatusCode, String)> {
    db.get_policies_by_project(project_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn list_project_actors(
    State(db): State<Database>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Actor>>, (StatusCode, String)> {
    db.get_actors_by_project(project_id)
        .map(Json)
        .map_err(internal_error)
}

// ============================================================
// Policies
// ============================================================

pub async fn create_policy(
    State(db): State<Database>,
    Json(input): Json<CreatePolicyInput>,
) -> Result<(StatusCode, Json<Policy>), (StatusCode, String)> {
    db.create_policy(input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(internal_error)
}

/// Delete by `id=eq.<uuid>`. Like the hosted gateway this succeeds whether
/// or not a row matched; with `Prefer: return=representation` the deleted
/// rows are returned.
pub async fn delete_policy(
    State(db): State<Database>,
    headers: HeaderMap,
    Query(filter): Query<IdFilter>,
) -> Result<Response, (StatusCode, String)> {
    let id = filter.parse()?;
    let existing = db.get_policy(id).map_err(internal_error)?;
    let deleted = db.delete_policy(id).map_err(internal_error)?;

    if !wants_representation(&headers) {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let rows: Vec<Policy> = existing.filter(|_| deleted).into_iter().collect();
    Ok(Json(rows).into_response())
}

fn wants_representation(headers: &HeaderMap) -> bool {
    headers
        .get("Prefer")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|p| p.contains("return=representation"))
}

pub async fn create_feature_policy(
    State(db): State<Database>,
    Json(input): Json<CreateFeaturePolicyInput>,
) -> Result<(StatusCode, Json<FeaturePolicy>), (StatusCode, String)> {
    db.create_feature_policy(input)
        .map(|fp| (StatusCode::CREATED, Json(fp)))
        .map_err(internal_error)
}

pub async fn list_feature_policies(
    State(db): State<Database>,
    Path(feature_id): Path<Uuid>,
) -> Result<Json<Vec<Policy>>, (StatusCode, String)> {
    db.get_feature(feature_id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Feature not found".to_string()))?;

    db.get_feature_policies(feature_id)
        .map(Json)
        .map_err(internal_error)
}

/// Body of `POST /features/{id}/policies`.
#[derive(Debug, Deserialize)]
pub struct AttachPolicyInput {
    pub project_id: Uuid,
    pub contents: String,
    pub author_id: Uuid,
}

/// Create a policy and attach it to the feature atomically.
pub async fn attach_policy(
    State(db): State<Database>,
    Path(feature_id): Path<Uuid>,
    Json(input): Json<AttachPolicyInput>,
) -> Result<(StatusCode, Json<AddedPolicy>), (StatusCode, String)> {
    let input = CreatePolicyInput {
        project_id: input.project_id,
        contents: input.contents,
        author_id: input.author_id,
    };
    db.create_linked_policy(&input, feature_id)
        .map(|added| (StatusCode::CREATED, Json(added)))
        .map_err(internal_error)
}

// ============================================================
// Organizations / Actors
// ============================================================

pub async fn create_organization(
    State(db): State<Database>,
    Json(input): Json<CreateOrganizationInput>,
) -> Result<(StatusCode, Json<Organization>), (StatusCode, String)> {
    db.create_organization(input)
        .map(|o| (StatusCode::CREATED, Json(o)))
        .map_err(internal_error)
}

pub async fn create_actor(
    State(db): State<Database>,
    Json(input): Json<CreateActorInput>,
) -> Result<(StatusCode, Json<Actor>), (StatusCode, String)> {
    db.create_actor(input)
        .map(|a| (StatusCode::CREATED, Json(a)))
        .map_err(internal_error)
}
