//! paes-content library interface
//!
//! Content coherence and exercise distribution service: node validation and
//! auto-correction, distribution analysis with generation recommendations,
//! and gamification accrual, exposed as a JSON API.

pub mod api;
pub mod db;
pub mod distribution;
pub mod error;
pub mod gamification;
pub mod services;
pub mod validators;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use paes_common::config::{CoherenceConfig, DistributionThresholds, TomlConfig};
use paes_common::session::SessionStore;
use paes_common::Catalog;
use services::ExerciseGenerator;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub catalog: Arc<Catalog>,
    pub coherence: CoherenceConfig,
    pub thresholds: DistributionThresholds,
    pub sessions: SessionStore,
    /// `None` disables `/api/distribution/execute`
    pub generator: Option<Arc<dyn ExerciseGenerator>>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, catalog: Arc<Catalog>, config: &TomlConfig) -> Self {
        Self {
            db,
            catalog,
            coherence: config.coherence,
            thresholds: config.distribution,
            sessions: SessionStore::new(),
            generator: None,
            startup_time: Utc::now(),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn ExerciseGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::validation_routes())
        .merge(api::node_routes())
        .merge(api::distribution_routes())
        .merge(api::session_routes())
        .merge(api::achievement_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
