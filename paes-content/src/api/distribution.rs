//! Distribution endpoints
//!
//! - GET  /api/distribution/report          - histograms, quality, gaps
//! - GET  /api/distribution/recommendations - prioritized generation tasks
//! - POST /api/distribution/execute         - dispatch tasks to the generator

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use paes_common::ContentNode;
use serde::Serialize;
use std::sync::Arc;

use crate::db::exercises::list_exercises;
use crate::db::nodes::list_nodes;
use crate::distribution::{DistributionAnalyzer, DistributionReport, GenerationTask, RecommendationEngine};
use crate::error::{ApiError, ApiResult};
use crate::services::{DispatchSummary, TaskDispatcher};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub total_exercises: usize,
    pub tasks: Vec<GenerationTask>,
}

async fn build_report(state: &AppState) -> ApiResult<(DistributionReport, Vec<ContentNode>)> {
    let (exercises, nodes) = tokio::try_join!(list_exercises(&state.db), list_nodes(&state.db))?;
    let report = DistributionAnalyzer::new(state.thresholds).analyze(&exercises, &nodes);
    Ok((report, nodes))
}

async fn build_tasks(state: &AppState) -> ApiResult<(usize, Vec<GenerationTask>)> {
    let (report, nodes) = build_report(state).await?;
    let tasks = RecommendationEngine::new(state.catalog.clone(), state.thresholds).recommend(&report.gaps, &nodes);
    Ok((report.total_exercises, tasks))
}

/// GET /api/distribution/report
pub async fn distribution_report(State(state): State<AppState>) -> ApiResult<Json<DistributionReport>> {
    let (report, _) = build_report(&state).await?;
    Ok(Json(report))
}

/// GET /api/distribution/recommendations
pub async fn distribution_recommendations(State(state): State<AppState>) -> ApiResult<Json<RecommendationsResponse>> {
    let (total_exercises, tasks) = build_tasks(&state).await?;
    Ok(Json(RecommendationsResponse { total_exercises, tasks }))
}

/// POST /api/distribution/execute
pub async fn execute_recommendations(State(state): State<AppState>) -> ApiResult<Json<DispatchSummary>> {
    let generator = state
        .generator
        .clone()
        .ok_or_else(|| ApiError::ServiceUnavailable("No exercise generator configured".to_string()))?;
    let (_, tasks) = build_tasks(&state).await?;
    let dispatcher = TaskDispatcher::new(Arc::clone(&generator), state.db.clone());
    Ok(Json(dispatcher.dispatch(&tasks).await))
}

pub fn distribution_routes() -> Router<AppState> {
    Router::new()
        .route("/api/distribution/report", get(distribution_report))
        .route("/api/distribution/recommendations", get(distribution_recommendations))
        .route("/api/distribution/execute", post(execute_recommendations))
}
