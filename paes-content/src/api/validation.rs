//! Node validation endpoints
//!
//! - GET  /api/validation/nodes - validate every stored node
//! - POST /api/validation/nodes - validate posted raw nodes without storing them

use axum::{extract::State, routing::get, Json, Router};
use paes_common::normalize::normalize_nodes;
use serde::Serialize;
use serde_json::Value;

use crate::db::nodes::list_nodes;
use crate::error::ApiResult;
use crate::validators::{NodeValidator, ValidationSummary};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PostedValidationResponse {
    #[serde(flatten)]
    pub summary: ValidationSummary,
    /// Payload entries that could not be normalized
    pub rejected: Vec<String>,
}

/// GET /api/validation/nodes
pub async fn validate_stored_nodes(State(state): State<AppState>) -> ApiResult<Json<ValidationSummary>> {
    let nodes = list_nodes(&state.db).await?;
    let validator = NodeValidator::with_config(state.catalog.clone(), state.coherence);
    Ok(Json(validator.validate_nodes(&nodes)))
}

/// POST /api/validation/nodes
pub async fn validate_posted_nodes(
    State(state): State<AppState>,
    Json(payload): Json<Vec<Value>>,
) -> ApiResult<Json<PostedValidationResponse>> {
    let (nodes, rejected) = normalize_nodes(payload);
    let validator = NodeValidator::with_config(state.catalog.clone(), state.coherence);
    Ok(Json(PostedValidationResponse {
        summary: validator.validate_nodes(&nodes),
        rejected,
    }))
}

pub fn validation_routes() -> Router<AppState> {
    Router::new().route(
        "/api/validation/nodes",
        get(validate_stored_nodes).post(validate_posted_nodes),
    )
}
