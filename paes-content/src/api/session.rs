//! Session endpoints
//!
//! Identity verification belongs to the hosting auth backend; sign-in here
//! only opens a session for an already authenticated user id.

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use paes_common::session::SessionContext;
use serde::{Deserialize, Serialize};

use super::auth::bearer_token;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(alias = "userId")]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub signed_out: bool,
}

/// POST /api/session/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> ApiResult<Json<SessionContext>> {
    let user_id = request.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("user_id must not be empty".to_string()));
    }
    Ok(Json(state.sessions.sign_in(user_id).await))
}

/// POST /api/session/sign-out
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<SignOutResponse>> {
    let token = bearer_token(&headers).ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
    Ok(Json(SignOutResponse {
        signed_out: state.sessions.sign_out(token).await,
    }))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/session/sign-in", post(sign_in))
        .route("/api/session/sign-out", post(sign_out))
}
