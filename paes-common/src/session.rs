//! Session context for authenticated calls
//!
//! Opaque bearer tokens map to a [`SessionContext`]. Sessions live until
//! `sign_out`; there is no expiry. The store is owned by the service state and
//! passed explicitly, never held in a module-level static.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Identity attached to one signed-in session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionContext {
    pub user_id: String,
    pub token: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Token → session map shared across request handlers
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionContext>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for `user_id` and return its context
    pub async fn sign_in(&self, user_id: &str) -> SessionContext {
        let context = SessionContext {
            user_id: user_id.to_string(),
            token: Uuid::new_v4().to_string(),
            signed_in_at: Utc::now(),
        };
        self.sessions
            .write()
            .await
            .insert(context.token.clone(), context.clone());
        info!(user_id = %context.user_id, "Session opened");
        context
    }

    /// Invalidate a token; returns false when it was not active
    pub async fn sign_out(&self, token: &str) -> bool {
        match self.sessions.write().await.remove(token) {
            Some(context) => {
                info!(user_id = %context.user_id, "Session closed");
                true
            }
            None => {
                debug!("Sign-out for unknown token");
                false
            }
        }
    }

    /// Resolve a token to its session
    pub async fn resolve(&self, token: &str) -> Option<SessionContext> {
        self.sessions.read().await.get(token).cloned()
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
