//! Services: exercise generation and achievement accrual

pub mod achievement_accrual;
pub mod generation_client;
pub mod task_dispatcher;

pub use achievement_accrual::{accrue_achievements, AccrualReport};
pub use generation_client::{ExerciseGenerator, GenerationError, GenerationRequest, HttpExerciseGenerator};
pub use task_dispatcher::{DispatchSummary, TaskDispatcher};
