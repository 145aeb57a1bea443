//! User progress and activity events

use super::{format_timestamp, parse_timestamp};
use chrono::{DateTime, Utc};
use paes_common::models::{ActivityEvent, UserNodeProgress};
use paes_common::Result;
use sqlx::{Executor, Row, Sqlite, SqlitePool};

/// Progress rows of one user
pub async fn list_progress<'e, E>(executor: E, user_id: &str) -> Result<Vec<UserNodeProgress>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        SELECT user_id, node_id, mastery_level, skill_id
        FROM user_node_progress
        WHERE user_id = ?
        ORDER BY node_id
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(rows
        .iter()
        .map(|row| UserNodeProgress {
            user_id: row.get("user_id"),
            node_id: row.get("node_id"),
            mastery_level: row.get("mastery_level"),
            skill_id: row.get("skill_id"),
        })
        .collect())
}

/// Insert or replace the mastery of one node for one user
pub async fn upsert_progress<'e, E>(executor: E, progress: &UserNodeProgress) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO user_node_progress (user_id, node_id, mastery_level, skill_id, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(user_id, node_id) DO UPDATE SET
            mastery_level = excluded.mastery_level,
            skill_id = excluded.skill_id,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&progress.user_id)
    .bind(&progress.node_id)
    .bind(progress.mastery_level.clamp(0.0, 1.0))
    .bind(progress.skill_id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn record_event<'e, E>(executor: E, event: &ActivityEvent) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO activity_events (user_id, event_type, occurred_at) VALUES (?, ?, ?)")
        .bind(&event.user_id)
        .bind(&event.event_type)
        .bind(format_timestamp(event.occurred_at))
        .execute(executor)
        .await?;

    Ok(())
}

/// Store a mastery update and its activity event together
pub async fn record_progress_with_event(
    pool: &SqlitePool,
    progress: &UserNodeProgress,
    event: &ActivityEvent,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    upsert_progress(&mut *tx, progress).await?;
    record_event(&mut *tx, event).await?;
    tx.commit().await?;
    Ok(())
}

/// Events of one user at or after `since`, oldest first
pub async fn list_events_since<'e, E>(executor: E, user_id: &str, since: DateTime<Utc>) -> Result<Vec<ActivityEvent>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        SELECT user_id, event_type, occurred_at
        FROM activity_events
        WHERE user_id = ? AND occurred_at >= ?
        ORDER BY occurred_at
        "#,
    )
    .bind(user_id)
    .bind(format_timestamp(since))
    .fetch_all(executor)
    .await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let occurred_at: String = row.get("occurred_at");
            Some(ActivityEvent {
                user_id: row.get("user_id"),
                event_type: row.get("event_type"),
                occurred_at: parse_timestamp(&occurred_at)?,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use paes_common::db::init_memory_database;

    #[tokio::test]
    async fn test_progress_upsert_replaces_mastery() {
        let pool = init_memory_database().await.unwrap();
        let mut row = UserNodeProgress {
            user_id: "u1".to_string(),
            node_id: "n1".to_string(),
            mastery_level: 0.4,
            skill_id: Some(4),
        };
        upsert_progress(&pool, &row).await.unwrap();
        row.mastery_level = 0.9;
        upsert_progress(&pool, &row).await.unwrap();

        let rows = list_progress(&pool, "u1").await.unwrap();
        assert_eq!(rows, vec![row]);
        assert!(list_progress(&pool, "u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_events_filtered_by_user_and_time() {
        let pool = init_memory_database().await.unwrap();
        let now = Utc::now();
        for (user, days_ago) in [("u1", 1), ("u1", 9), ("u2", 1)] {
            record_event(
                &pool,
                &ActivityEvent {
                    user_id: user.to_string(),
                    event_type: "answer".to_string(),
                    occurred_at: now - Duration::days(days_ago),
                },
            )
            .await
            .unwrap();
        }

        let events = list_events_since(&pool, "u1", now - Duration::days(7)).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_progress_and_event_stored_together() {
        let pool = init_memory_database().await.unwrap();
        let now = Utc::now();
        let row = UserNodeProgress {
            user_id: "u1".to_string(),
            node_id: "n1".to_string(),
            mastery_level: 0.6,
            skill_id: None,
        };
        let event = ActivityEvent {
            user_id: "u1".to_string(),
            event_type: "node_progress".to_string(),
            occurred_at: now,
        };
        record_progress_with_event(&pool, &row, &event).await.unwrap();

        assert_eq!(list_progress(&pool, "u1").await.unwrap(), vec![row]);
        assert_eq!(list_events_since(&pool, "u1", now - Duration::days(1)).await.unwrap().len(), 1);
    }
}
