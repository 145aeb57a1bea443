//! # PAES Common Library
//!
//! Shared code for the PAES content services including:
//! - Immutable catalog (subjects, test ids, skill allow-lists, keyword lexicon)
//! - Canonical entity models and store-boundary normalization
//! - Database schema initialization
//! - Configuration loading
//! - Session context for authenticated calls

pub mod catalog;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod session;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use models::{
    AchievementProgress, CognitiveLevel, ContentNode, Difficulty, GeneratedExercise, Priority,
    Subject, TierPriority,
};
