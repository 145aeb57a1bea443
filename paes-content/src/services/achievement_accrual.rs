//! Achievement accrual for one user
//!
//! Load → evaluate → save → award runs in a single transaction that opens
//! with a write, so two accruals for the same user cannot both see an
//! achievement as locked, and an unlock is never stored without its points.

use chrono::{DateTime, Duration, Utc};
use paes_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::achievements::{add_ranking_points, ensure_ranking, get_ranking, load_achievements, save_achievements};
use crate::db::progress::{list_events_since, list_progress};
use crate::gamification::counters::RECENT_ACTIVITY_DAYS;
use crate::gamification::{evaluate, AccrualOutcome, ProgressCounters};

/// Accrual outcome plus the user's ranking total after it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccrualReport {
    #[serde(flatten)]
    pub outcome: AccrualOutcome,
    pub total_points: i64,
    pub counters: ProgressCounters,
}

pub async fn accrue_achievements(pool: &SqlitePool, user_id: &str, now: DateTime<Utc>) -> Result<AccrualReport> {
    let mut tx = pool.begin().await?;

    ensure_ranking(&mut *tx, user_id, now).await?;

    let progress = list_progress(&mut *tx, user_id).await?;
    let events = list_events_since(&mut *tx, user_id, now - Duration::days(RECENT_ACTIVITY_DAYS)).await?;
    let stored = load_achievements(&mut *tx, user_id).await?;

    let counters = ProgressCounters::derive(&progress, &events, now);
    let outcome = evaluate(user_id, &counters, &stored, now);
    save_achievements(&mut *tx, &outcome.achievements).await?;

    let total_points = if outcome.points_awarded > 0 {
        add_ranking_points(&mut *tx, user_id, outcome.points_awarded, now).await?
    } else {
        get_ranking(&mut *tx, user_id).await?.map(|r| r.total_points).unwrap_or(0)
    };

    tx.commit().await?;

    if outcome.points_awarded > 0 {
        info!(user_id, points = outcome.points_awarded, total_points, "Points awarded");
    }

    Ok(AccrualReport {
        outcome,
        total_points,
        counters,
    })
}
