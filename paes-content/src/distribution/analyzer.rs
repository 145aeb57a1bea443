//! Exercise Distribution Analyzer
//!
//! Single pass over the generated exercises building three histograms
//! (subject, difficulty, node) and quality statistics, then compares the
//! histograms with the configured targets.
//!
//! # Gap Rules
//! - Subject: expected = total / 5. Under when `count < expected × (1 − tol)`,
//!   over when `count > expected × (1 + tol)`. Skipped when total is 0.
//! - Difficulty: expected = total × target ratio. Under when
//!   `count < expected × (1 − tol)`.
//! - Node: every known node with fewer than `min_exercises_per_node`.

use paes_common::config::DistributionThresholds;
use paes_common::{ContentNode, Difficulty, GeneratedExercise, Subject};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// One deviation from the target distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionGap {
    SubjectUnderrepresented {
        subject: Subject,
        current: u32,
        expected: f64,
        deficit: u32,
    },
    SubjectOverrepresented {
        subject: Subject,
        current: u32,
        expected: f64,
        excess: u32,
    },
    DifficultyUnderrepresented {
        difficulty: Difficulty,
        current: u32,
        expected: f64,
        deficit: u32,
    },
    NodeInsufficient {
        node_id: String,
        current: u32,
        expected: u32,
        deficit: u32,
    },
}

/// Quality aggregate over exercises that report a score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityStats {
    pub scored: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionReport {
    pub total_exercises: usize,
    pub by_subject: BTreeMap<Subject, u32>,
    pub by_difficulty: BTreeMap<Difficulty, u32>,
    pub by_node: BTreeMap<String, u32>,
    pub quality: QualityStats,
    pub gaps: Vec<DistributionGap>,
}

pub struct DistributionAnalyzer {
    thresholds: DistributionThresholds,
}

impl DistributionAnalyzer {
    pub fn new(thresholds: DistributionThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &DistributionThresholds {
        &self.thresholds
    }

    /// Build the report for an exercise snapshot
    ///
    /// `nodes` are the known content nodes; node ids referenced only by
    /// exercises are known too.
    pub fn analyze(&self, exercises: &[GeneratedExercise], nodes: &[ContentNode]) -> DistributionReport {
        let mut by_subject: BTreeMap<Subject, u32> = Subject::ALL.iter().map(|&s| (s, 0)).collect();
        let mut by_difficulty: BTreeMap<Difficulty, u32> = Difficulty::ALL.iter().map(|&d| (d, 0)).collect();
        let mut by_node: BTreeMap<String, u32> = nodes.iter().map(|n| (n.id.clone(), 0)).collect();

        let mut scored = 0usize;
        let mut sum = 0.0_f64;
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;

        for exercise in exercises {
            *by_subject.entry(exercise.subject_category).or_insert(0) += 1;
            *by_difficulty.entry(exercise.difficulty_level).or_insert(0) += 1;
            if let Some(node_id) = &exercise.node_id {
                *by_node.entry(node_id.clone()).or_insert(0) += 1;
            }
            if let Some(q) = exercise.quality_score {
                scored += 1;
                sum += q;
                min = Some(min.map_or(q, |m| m.min(q)));
                max = Some(max.map_or(q, |m| m.max(q)));
            }
        }

        let quality = QualityStats {
            scored,
            mean: (scored > 0).then(|| sum / scored as f64),
            min,
            max,
        };

        let total = exercises.len();
        let mut gaps = self.subject_gaps(total, &by_subject);
        gaps.extend(self.difficulty_gaps(total, &by_difficulty));
        gaps.extend(self.node_gaps(&by_node));

        debug!(
            total_exercises = total,
            nodes = by_node.len(),
            gaps = gaps.len(),
            "Distribution analyzed"
        );

        DistributionReport {
            total_exercises: total,
            by_subject,
            by_difficulty,
            by_node,
            quality,
            gaps,
        }
    }

    fn subject_gaps(&self, total: usize, by_subject: &BTreeMap<Subject, u32>) -> Vec<DistributionGap> {
        if total == 0 {
            return Vec::new();
        }
        let expected = total as f64 / Subject::ALL.len() as f64;
        let tolerance = self.thresholds.subject_tolerance;

        let mut gaps = Vec::new();
        for (&subject, &current) in by_subject {
            let count = current as f64;
            if count < expected * (1.0 - tolerance) {
                gaps.push(DistributionGap::SubjectUnderrepresented {
                    subject,
                    current,
                    expected,
                    deficit: (expected - count).round() as u32,
                });
            } else if count > expected * (1.0 + tolerance) {
                gaps.push(DistributionGap::SubjectOverrepresented {
                    subject,
                    current,
                    expected,
                    excess: (count - expected).round() as u32,
                });
            }
        }
        gaps
    }

    fn difficulty_gaps(&self, total: usize, by_difficulty: &BTreeMap<Difficulty, u32>) -> Vec<DistributionGap> {
        let tolerance = self.thresholds.difficulty_tolerance;
        by_difficulty
            .iter()
            .filter_map(|(&difficulty, &current)| {
                let expected = total as f64 * self.thresholds.target_ratio(difficulty);
                let count = current as f64;
                (count < expected * (1.0 - tolerance)).then(|| DistributionGap::DifficultyUnderrepresented {
                    difficulty,
                    current,
                    expected,
                    deficit: (expected - count).round() as u32,
                })
            })
            .collect()
    }

    fn node_gaps(&self, by_node: &BTreeMap<String, u32>) -> Vec<DistributionGap> {
        let expected = self.thresholds.min_exercises_per_node;
        by_node
            .iter()
            .filter(|(_, &current)| current < expected)
            .map(|(node_id, &current)| DistributionGap::NodeInsufficient {
                node_id: node_id.clone(),
                current,
                expected,
                deficit: expected - current,
            })
            .collect()
    }
}
