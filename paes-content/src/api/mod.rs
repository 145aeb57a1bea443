//! HTTP API handlers for paes-content
//!
//! Plain JSON views over validation, distribution and gamification.

pub mod achievements;
pub mod auth;
pub mod distribution;
pub mod health;
pub mod nodes;
pub mod session;
pub mod validation;

pub use achievements::achievement_routes;
pub use distribution::distribution_routes;
pub use health::health_routes;
pub use nodes::node_routes;
pub use session::session_routes;
pub use validation::validation_routes;
