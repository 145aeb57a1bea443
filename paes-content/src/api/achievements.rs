//! Per-user gamification endpoints (bearer session required)
//!
//! - POST /api/progress     - record node mastery and an activity event
//! - GET  /api/achievements - evaluate rules, persist, award points

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use paes_common::models::{ActivityEvent, UserNodeProgress};
use paes_common::session::SessionContext;
use serde::Deserialize;

use super::auth::session_middleware;
use crate::db::progress::record_progress_with_event;
use crate::error::{ApiError, ApiResult};
use crate::services::{accrue_achievements, AccrualReport};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    #[serde(alias = "nodeId")]
    pub node_id: String,
    #[serde(alias = "masteryLevel")]
    pub mastery_level: f64,
    #[serde(default, alias = "skillId")]
    pub skill_id: Option<i64>,
}

/// POST /api/progress
pub async fn record_progress(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(request): Json<ProgressRequest>,
) -> ApiResult<Json<UserNodeProgress>> {
    if !(0.0..=1.0).contains(&request.mastery_level) {
        return Err(ApiError::BadRequest("mastery_level must be in [0, 1]".to_string()));
    }
    let progress = UserNodeProgress {
        user_id: session.user_id.clone(),
        node_id: request.node_id,
        mastery_level: request.mastery_level,
        skill_id: request.skill_id,
    };
    let event = ActivityEvent {
        user_id: session.user_id,
        event_type: "node_progress".to_string(),
        occurred_at: Utc::now(),
    };

    record_progress_with_event(&state.db, &progress, &event).await?;

    Ok(Json(progress))
}

/// GET /api/achievements
pub async fn user_achievements(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<Json<AccrualReport>> {
    let report = accrue_achievements(&state.db, &session.user_id, Utc::now()).await?;
    Ok(Json(report))
}

pub fn achievement_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/progress", post(record_progress))
        .route("/api/achievements", get(user_achievements))
        .route_layer(middleware::from_fn_with_state(state, session_middleware))
}
