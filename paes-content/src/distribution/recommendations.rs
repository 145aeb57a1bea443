//! Distribution Recommendation Engine
//!
//! Turns analyzer gaps into generation tasks sorted by priority.
//!
//! | gap                          | task                  | priority       |
//! |------------------------------|-----------------------|----------------|
//! | subject_underrepresented     | `generate_subject`    | high           |
//! | subject_overrepresented      | `pause_subject`       | low            |
//! | difficulty_underrepresented  | `generate_difficulty` | medium         |
//! | node_insufficient            | `generate_node`       | from node tier |
//!
//! Subject tasks carry a per-difficulty breakdown that always sums to the
//! task quantity.

use super::analyzer::DistributionGap;
use paes_common::config::DistributionThresholds;
use paes_common::{Catalog, ContentNode, Difficulty, Priority, Subject};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    GenerateSubject,
    PauseSubject,
    GenerateDifficulty,
    GenerateNode,
}

/// One recommended generation action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationTask {
    pub kind: TaskKind,
    /// Subject name, difficulty name or node id
    pub target: String,
    pub quantity: u32,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<BTreeMap<Difficulty, u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl GenerationTask {
    fn new(kind: TaskKind, target: String, quantity: u32, priority: Priority) -> Self {
        Self {
            kind,
            target,
            quantity,
            priority,
            breakdown: None,
            subject: None,
            difficulty: None,
            skill_id: None,
            node_id: None,
        }
    }
}

pub struct RecommendationEngine {
    catalog: Arc<Catalog>,
    thresholds: DistributionThresholds,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<Catalog>, thresholds: DistributionThresholds) -> Self {
        Self { catalog, thresholds }
    }

    /// Map gaps to tasks, highest priority first (stable within a priority)
    pub fn recommend(&self, gaps: &[DistributionGap], nodes: &[ContentNode]) -> Vec<GenerationTask> {
        let mut tasks: Vec<GenerationTask> = gaps.iter().map(|gap| self.task_for(gap, nodes)).collect();
        tasks.sort_by(|a, b| b.priority.cmp(&a.priority));
        debug!(tasks = tasks.len(), "Recommendations built");
        tasks
    }

    fn task_for(&self, gap: &DistributionGap, nodes: &[ContentNode]) -> GenerationTask {
        match gap {
            DistributionGap::SubjectUnderrepresented { subject, deficit, .. } => {
                let mut task =
                    GenerationTask::new(TaskKind::GenerateSubject, subject.to_string(), *deficit, Priority::High);
                task.subject = Some(*subject);
                task.breakdown = Some(self.breakdown(*deficit));
                task
            }
            DistributionGap::SubjectOverrepresented { subject, excess, .. } => {
                let mut task = GenerationTask::new(TaskKind::PauseSubject, subject.to_string(), *excess, Priority::Low);
                task.subject = Some(*subject);
                task
            }
            DistributionGap::DifficultyUnderrepresented { difficulty, deficit, .. } => {
                let mut task = GenerationTask::new(
                    TaskKind::GenerateDifficulty,
                    difficulty.to_string(),
                    *deficit,
                    Priority::Medium,
                );
                task.difficulty = Some(*difficulty);
                task
            }
            DistributionGap::NodeInsufficient { node_id, deficit, .. } => {
                let node = nodes.iter().find(|n| &n.id == node_id);
                let priority = node
                    .and_then(|n| n.tier_priority)
                    .map(|t| t.priority())
                    .unwrap_or(Priority::Medium);
                let mut task = GenerationTask::new(TaskKind::GenerateNode, node_id.clone(), *deficit, priority);
                task.node_id = Some(node_id.clone());
                if let Some(node) = node {
                    task.subject = self.catalog.canonical_subject(node.test_id).or(node.subject_category);
                    task.skill_id = if self.catalog.is_skill_allowed(node.test_id, node.skill_id) {
                        Some(node.skill_id)
                    } else {
                        self.catalog.default_skill(node.test_id)
                    };
                }
                task
            }
        }
    }

    /// Split `quantity` across difficulties by the target ratios
    ///
    /// Each share is floored; the remainder goes to INTERMEDIO.
    pub fn breakdown(&self, quantity: u32) -> BTreeMap<Difficulty, u32> {
        let share = |d: Difficulty| (quantity as f64 * self.thresholds.target_ratio(d) + 1e-9).floor() as u32;
        let basico = share(Difficulty::Basico);
        let avanzado = share(Difficulty::Avanzado);
        let intermedio = quantity.saturating_sub(basico + avanzado);
        BTreeMap::from([
            (Difficulty::Basico, basico),
            (Difficulty::Intermedio, intermedio),
            (Difficulty::Avanzado, avanzado),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::analyzer::tests::balanced_set;
    use crate::distribution::DistributionAnalyzer;
    use paes_common::TierPriority;

    fn engine() -> RecommendationEngine {
        RecommendationEngine::new(Catalog::embedded().unwrap(), DistributionThresholds::default())
    }

    fn node(id: &str, test_id: i64, skill_id: i64, tier: Option<TierPriority>) -> ContentNode {
        ContentNode {
            id: id.to_string(),
            code: None,
            title: String::new(),
            description: String::new(),
            subject_category: None,
            cognitive_level: None,
            test_id,
            skill_id,
            tier_priority: tier,
            depends_on: Vec::new(),
        }
    }

    #[test]
    fn test_breakdown_of_twenty() {
        let breakdown = engine().breakdown(20);
        assert_eq!(breakdown[&Difficulty::Basico], 8);
        assert_eq!(breakdown[&Difficulty::Intermedio], 9);
        assert_eq!(breakdown[&Difficulty::Avanzado], 3);
    }

    #[test]
    fn test_breakdown_always_sums_to_quantity() {
        let engine = engine();
        for quantity in 0..200 {
            let total: u32 = engine.breakdown(quantity).values().sum();
            assert_eq!(total, quantity);
        }
    }

    #[test]
    fn test_missing_subject_yields_high_priority_task() {
        let subjects = [Subject::CompetenciaLectora, Subject::Matematica1, Subject::Matematica2, Subject::Historia];
        let report = DistributionAnalyzer::new(DistributionThresholds::default())
            .analyze(&balanced_set(&subjects, 25), &[]);
        let tasks = engine().recommend(&report.gaps, &[]);

        let first = &tasks[0];
        assert_eq!(first.kind, TaskKind::GenerateSubject);
        assert_eq!(first.priority, Priority::High);
        assert_eq!(first.subject, Some(Subject::Ciencias));
        assert_eq!(first.quantity, 20);
        assert_eq!(
            first.breakdown,
            Some(BTreeMap::from([
                (Difficulty::Basico, 8),
                (Difficulty::Intermedio, 9),
                (Difficulty::Avanzado, 3),
            ]))
        );
    }

    #[test]
    fn test_node_task_resolves_subject_skill_and_tier() {
        let nodes = vec![
            node("t1", 4, 99, Some(TierPriority::Tier1Critico)),
            node("t3", 2, 6, Some(TierPriority::Tier3Complementario)),
            node("none", 5, 8, None),
        ];
        let gaps: Vec<DistributionGap> = nodes
            .iter()
            .map(|n| DistributionGap::NodeInsufficient {
                node_id: n.id.clone(),
                current: 0,
                expected: 10,
                deficit: 10,
            })
            .collect();
        let tasks = engine().recommend(&gaps, &nodes);

        assert_eq!(tasks[0].target, "t1");
        assert_eq!(tasks[0].priority, Priority::High);
        assert_eq!(tasks[0].subject, Some(Subject::Historia));
        assert_eq!(tasks[0].skill_id, Some(12));

        assert_eq!(tasks[1].target, "none");
        assert_eq!(tasks[1].priority, Priority::Medium);

        assert_eq!(tasks[2].target, "t3");
        assert_eq!(tasks[2].priority, Priority::Low);
        assert_eq!(tasks[2].skill_id, Some(6));
    }

    #[test]
    fn test_sort_is_stable_within_priority() {
        let gaps = vec![
            DistributionGap::DifficultyUnderrepresented {
                difficulty: Difficulty::Intermedio,
                current: 0,
                expected: 4.5,
                deficit: 5,
            },
            DistributionGap::SubjectOverrepresented {
                subject: Subject::Historia,
                current: 30,
                expected: 14.0,
                excess: 16,
            },
            DistributionGap::DifficultyUnderrepresented {
                difficulty: Difficulty::Avanzado,
                current: 0,
                expected: 1.5,
                deficit: 2,
            },
        ];
        let tasks = engine().recommend(&gaps, &[]);
        let order: Vec<(&str, Priority)> = tasks.iter().map(|t| (t.target.as_str(), t.priority)).collect();
        assert_eq!(
            order,
            vec![
                ("INTERMEDIO", Priority::Medium),
                ("AVANZADO", Priority::Medium),
                ("HISTORIA", Priority::Low),
            ]
        );
        assert_eq!(tasks[2].kind, TaskKind::PauseSubject);
    }
}
