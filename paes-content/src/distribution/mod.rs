//! Exercise distribution analysis and generation recommendations

pub mod analyzer;
pub mod recommendations;

pub use analyzer::{DistributionAnalyzer, DistributionGap, DistributionReport, QualityStats};
pub use recommendations::{GenerationTask, RecommendationEngine, TaskKind};
