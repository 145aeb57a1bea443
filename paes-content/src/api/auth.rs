//! Bearer session middleware
//!
//! Resolves `Authorization: Bearer <token>` through the session store and
//! attaches the [`SessionContext`] to the request. Applied to per-user routes
//! only.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use paes_common::session::SessionContext;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?
        .to_string();

    let context: SessionContext = state.sessions.resolve(&token).await.ok_or_else(|| {
        debug!("Rejected unknown session token");
        ApiError::Unauthorized("Unknown or signed-out session".to_string())
    })?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}
