//! Generation task dispatcher
//!
//! Turns recommended tasks into generator requests and stores what comes
//! back. Tasks are dispatched sequentially; a failed request is logged,
//! counted and skipped.

use super::generation_client::{ExerciseGenerator, GenerationRequest};
use crate::db::exercises::insert_exercise;
use crate::distribution::{GenerationTask, TaskKind};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchSummary {
    pub tasks_dispatched: usize,
    /// Informational tasks (pause_subject) and zero-quantity tasks
    pub tasks_skipped: usize,
    pub requests_sent: usize,
    pub requests_failed: usize,
    pub exercises_stored: usize,
}

pub struct TaskDispatcher {
    generator: Arc<dyn ExerciseGenerator>,
    db: SqlitePool,
}

impl TaskDispatcher {
    pub fn new(generator: Arc<dyn ExerciseGenerator>, db: SqlitePool) -> Self {
        Self { generator, db }
    }

    pub async fn dispatch(&self, tasks: &[GenerationTask]) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for task in tasks {
            let requests = requests_for(task);
            if requests.is_empty() {
                summary.tasks_skipped += 1;
                continue;
            }
            summary.tasks_dispatched += 1;

            for request in requests {
                summary.requests_sent += 1;
                match self.generator.generate(&request).await {
                    Ok(exercises) => {
                        for exercise in &exercises {
                            match insert_exercise(&self.db, exercise).await {
                                Ok(true) => summary.exercises_stored += 1,
                                Ok(false) => warn!(exercise_id = %exercise.id, "Generated exercise already stored"),
                                Err(e) => error!(exercise_id = %exercise.id, "Failed to store generated exercise: {}", e),
                            }
                        }
                    }
                    Err(e) => {
                        summary.requests_failed += 1;
                        error!(task = %task.target, kind = ?task.kind, "Generation request failed: {}", e);
                    }
                }
            }
        }

        info!(
            dispatched = summary.tasks_dispatched,
            skipped = summary.tasks_skipped,
            failed = summary.requests_failed,
            stored = summary.exercises_stored,
            "Generation tasks dispatched"
        );

        summary
    }
}

/// Requests for one task; subject tasks yield one request per non-empty
/// difficulty share
pub fn requests_for(task: &GenerationTask) -> Vec<GenerationRequest> {
    if task.kind == TaskKind::PauseSubject || task.quantity == 0 {
        return Vec::new();
    }

    let base = GenerationRequest {
        subject: task.subject,
        skill_id: task.skill_id,
        difficulty: task.difficulty,
        quantity: task.quantity,
        node_id: task.node_id.clone(),
    };

    match &task.breakdown {
        Some(breakdown) => breakdown
            .iter()
            .filter(|(_, &quantity)| quantity > 0)
            .map(|(&difficulty, &quantity)| GenerationRequest {
                difficulty: Some(difficulty),
                quantity,
                ..base.clone()
            })
            .collect(),
        None => vec![base],
    }
}
