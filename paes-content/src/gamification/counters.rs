//! Progress counters feeding the achievement rules

use chrono::{DateTime, Duration, Utc};
use paes_common::models::{ActivityEvent, UserNodeProgress};
use serde::Serialize;
use std::collections::HashSet;

/// Mastery at or above which a node counts as mastered
pub const MASTERY_THRESHOLD: f64 = 0.8;

/// Window for the recent-activity counter
pub const RECENT_ACTIVITY_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressCounters {
    /// Nodes with any mastery
    pub nodes_completed: u32,
    pub nodes_mastered: u32,
    /// Distinct skills across all progress rows
    pub distinct_skill_areas: u32,
    /// Events within the last seven days
    pub recent_activity: u32,
    /// Mean mastery over all progress rows, 0 when there are none
    pub average_mastery: f64,
}

impl ProgressCounters {
    pub fn derive(progress: &[UserNodeProgress], events: &[ActivityEvent], now: DateTime<Utc>) -> Self {
        let started: Vec<&UserNodeProgress> = progress.iter().filter(|p| p.mastery_level > 0.0).collect();

        let skills: HashSet<i64> = progress.iter().filter_map(|p| p.skill_id).collect();

        let since = now - Duration::days(RECENT_ACTIVITY_DAYS);
        let recent_activity = events
            .iter()
            .filter(|e| e.occurred_at > since && e.occurred_at <= now)
            .count();

        let average_mastery = if progress.is_empty() {
            0.0
        } else {
            progress.iter().map(|p| p.mastery_level).sum::<f64>() / progress.len() as f64
        };

        Self {
            nodes_completed: started.len() as u32,
            nodes_mastered: started.iter().filter(|p| p.mastery_level >= MASTERY_THRESHOLD).count() as u32,
            distinct_skill_areas: skills.len() as u32,
            recent_activity: recent_activity as u32,
            average_mastery,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(node: &str, mastery: f64, skill: Option<i64>) -> UserNodeProgress {
        UserNodeProgress {
            user_id: "u1".to_string(),
            node_id: node.to_string(),
            mastery_level: mastery,
            skill_id: skill,
        }
    }

    #[test]
    fn test_derive_counters() {
        let now = Utc::now();
        let progress = vec![
            row("a", 0.9, Some(4)),
            row("b", 0.5, Some(4)),
            row("c", 0.8, Some(5)),
            row("d", 0.0, Some(6)),
        ];
        let events = vec![
            ActivityEvent {
                user_id: "u1".to_string(),
                event_type: "answer".to_string(),
                occurred_at: now - Duration::days(1),
            },
            ActivityEvent {
                user_id: "u1".to_string(),
                event_type: "answer".to_string(),
                occurred_at: now - Duration::days(10),
            },
        ];

        let counters = ProgressCounters::derive(&progress, &events, now);
        assert_eq!(counters.nodes_completed, 3);
        assert_eq!(counters.nodes_mastered, 2);
        assert_eq!(counters.distinct_skill_areas, 3);
        assert_eq!(counters.recent_activity, 1);
        assert!((counters.average_mastery - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_no_data_yields_zero_counters() {
        assert_eq!(ProgressCounters::derive(&[], &[], Utc::now()), ProgressCounters::default());
    }
}
