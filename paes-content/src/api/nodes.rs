//! Content node endpoints
//!
//! - POST /api/nodes/import           - normalize and upsert raw nodes
//! - GET  /api/nodes/:id              - one stored node
//! - POST /api/nodes/:id/auto-correct - correct and persist one node

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use paes_common::normalize::normalize_nodes;
use paes_common::ContentNode;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::db::nodes::{get_node, update_node, upsert_nodes};
use crate::error::ApiResult;
use crate::validators::{AutoCorrector, CorrectionOutcome};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub rejected: Vec<String>,
}

/// POST /api/nodes/import
pub async fn import_nodes(
    State(state): State<AppState>,
    Json(payload): Json<Vec<Value>>,
) -> ApiResult<Json<ImportResponse>> {
    let (nodes, rejected) = normalize_nodes(payload);
    let imported = upsert_nodes(&state.db, &nodes).await?;
    info!(imported, rejected = rejected.len(), "Content nodes imported");
    Ok(Json(ImportResponse {
        imported,
        rejected,
    }))
}

/// GET /api/nodes/:id
pub async fn get_node_by_id(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ContentNode>> {
    Ok(Json(get_node(&state.db, &id).await?))
}

/// POST /api/nodes/:id/auto-correct
pub async fn auto_correct_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CorrectionOutcome>> {
    let node = get_node(&state.db, &id).await?;
    let outcome = AutoCorrector::new(state.catalog.clone()).correct(&node);
    if outcome.changed() {
        update_node(&state.db, &outcome.node).await?;
    }
    Ok(Json(outcome))
}

pub fn node_routes() -> Router<AppState> {
    Router::new()
        .route("/api/nodes/import", post(import_nodes))
        .route("/api/nodes/:id", get(get_node_by_id))
        .route("/api/nodes/:id/auto-correct", post(auto_correct_node))
}
