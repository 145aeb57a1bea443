//! Achievement rules and accrual
//!
//! Every rule maps the progress counters to a capped progress value and has
//! its own unlock condition. An unlocked rule reports full progress. Stored
//! progress never decreases, an unlock is permanent, and the point reward of
//! a rule is granted only on the evaluation that unlocks it.

use super::counters::ProgressCounters;
use chrono::{DateTime, Utc};
use paes_common::AchievementProgress;
use serde::Serialize;
use tracing::info;

/// Fixed achievement rule
#[derive(Debug, Clone, Copy)]
pub struct AchievementRule {
    pub id: &'static str,
    pub title: &'static str,
    pub max_progress: u32,
    pub points: i64,
    pub progress: fn(&ProgressCounters) -> u32,
    pub unlocks: fn(&ProgressCounters) -> bool,
}

pub const RULES: [AchievementRule; 5] = [
    AchievementRule {
        id: "first_steps",
        title: "Primeros Pasos",
        max_progress: 5,
        points: 100,
        progress: |c| c.nodes_completed,
        unlocks: |c| c.nodes_completed >= 5,
    },
    AchievementRule {
        id: "initial_mastery",
        title: "Maestría Inicial",
        max_progress: 10,
        points: 250,
        progress: |c| c.nodes_mastered,
        unlocks: |c| c.nodes_mastered >= 10,
    },
    AchievementRule {
        id: "consistency",
        title: "Constancia",
        max_progress: 7,
        points: 500,
        progress: |c| c.recent_activity / 3,
        unlocks: |c| c.recent_activity >= 20,
    },
    AchievementRule {
        id: "neural_explorer",
        title: "Explorador Neural",
        max_progress: 15,
        points: 750,
        progress: |c| c.distinct_skill_areas,
        unlocks: |c| c.distinct_skill_areas >= 15,
    },
    AchievementRule {
        id: "paes_legend",
        title: "Leyenda PAES",
        max_progress: 90,
        points: 1500,
        progress: |c| (c.average_mastery * 100.0).round().max(0.0) as u32,
        unlocks: |c| c.average_mastery >= 0.9,
    },
];

/// Result of one accrual run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccrualOutcome {
    /// State of every rule after evaluation, in rule order
    pub achievements: Vec<AchievementProgress>,
    /// Rule ids unlocked by this run
    pub newly_unlocked: Vec<String>,
    pub points_awarded: i64,
}

/// Evaluate all rules against the counters and the stored state
pub fn evaluate(
    user_id: &str,
    counters: &ProgressCounters,
    stored: &[AchievementProgress],
    now: DateTime<Utc>,
) -> AccrualOutcome {
    let mut achievements = Vec::with_capacity(RULES.len());
    let mut newly_unlocked = Vec::new();
    let mut points_awarded = 0;

    for rule in &RULES {
        let previous = stored.iter().find(|a| a.id == rule.id);

        if let Some(previous) = previous.filter(|p| p.unlocked) {
            achievements.push(previous.clone());
            continue;
        }

        let unlocked = (rule.unlocks)(counters);
        let progress = if unlocked {
            rule.max_progress
        } else {
            let computed = (rule.progress)(counters);
            previous
                .map_or(computed, |p| p.progress.max(computed))
                .min(rule.max_progress)
        };

        if unlocked {
            info!(user_id, achievement = rule.id, points = rule.points, "Achievement unlocked");
            newly_unlocked.push(rule.id.to_string());
            points_awarded += rule.points;
        }

        achievements.push(AchievementProgress {
            id: rule.id.to_string(),
            user_id: user_id.to_string(),
            progress,
            max_progress: rule.max_progress,
            unlocked,
            unlocked_at: unlocked.then_some(now),
        });
    }

    AccrualOutcome {
        achievements,
        newly_unlocked,
        points_awarded,
    }
}
