//! Gamification accrual: counters, fixed achievement rules, point rewards

pub mod achievements;
pub mod counters;

pub use achievements::{evaluate, AccrualOutcome, AchievementRule, RULES};
pub use counters::ProgressCounters;
