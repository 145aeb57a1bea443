//! Achievement state and ranking totals

use super::{format_timestamp, parse_timestamp};
use chrono::{DateTime, Utc};
use paes_common::models::UserRanking;
use paes_common::{AchievementProgress, Result};
use sqlx::{Executor, Row, Sqlite, SqliteConnection};

/// Stored achievement state of one user
pub async fn load_achievements<'e, E>(executor: E, user_id: &str) -> Result<Vec<AchievementProgress>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        SELECT achievement_id, user_id, progress, max_progress, unlocked, unlocked_at
        FROM user_achievements
        WHERE user_id = ?
        ORDER BY achievement_id
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let progress: i64 = row.get("progress");
            let max_progress: i64 = row.get("max_progress");
            let unlocked: i64 = row.get("unlocked");
            let unlocked_at: Option<String> = row.get("unlocked_at");
            AchievementProgress {
                id: row.get("achievement_id"),
                user_id: row.get("user_id"),
                progress: progress.max(0) as u32,
                max_progress: max_progress.max(0) as u32,
                unlocked: unlocked != 0,
                unlocked_at: unlocked_at.as_deref().and_then(parse_timestamp),
            }
        })
        .collect())
}

/// Upsert achievement rows on the caller's connection or transaction
pub async fn save_achievements(conn: &mut SqliteConnection, achievements: &[AchievementProgress]) -> Result<()> {
    for achievement in achievements {
        sqlx::query(
            r#"
            INSERT INTO user_achievements (
                user_id, achievement_id, progress, max_progress, unlocked, unlocked_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(user_id, achievement_id) DO UPDATE SET
                progress = excluded.progress,
                max_progress = excluded.max_progress,
                unlocked = excluded.unlocked,
                unlocked_at = excluded.unlocked_at,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&achievement.user_id)
        .bind(&achievement.id)
        .bind(achievement.progress as i64)
        .bind(achievement.max_progress as i64)
        .bind(achievement.unlocked as i64)
        .bind(achievement.unlocked_at.map(format_timestamp))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Create an empty ranking row if the user has none
///
/// As the first statement of a transaction this takes the database write
/// lock, so concurrent accruals for the same store run one after another.
pub async fn ensure_ranking<'e, E>(executor: E, user_id: &str, now: DateTime<Utc>) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO user_rankings (user_id, total_points, updated_at)
        VALUES (?, 0, ?)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(format_timestamp(now))
    .execute(executor)
    .await?;
    Ok(())
}

/// Add awarded points to a user's ranking total; returns the new total
pub async fn add_ranking_points<'e, E>(executor: E, user_id: &str, points: i64, now: DateTime<Utc>) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let total: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO user_rankings (user_id, total_points, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            total_points = user_rankings.total_points + excluded.total_points,
            updated_at = excluded.updated_at
        RETURNING total_points
        "#,
    )
    .bind(user_id)
    .bind(points)
    .bind(format_timestamp(now))
    .fetch_one(executor)
    .await?;
    Ok(total)
}

pub async fn get_ranking<'e, E>(executor: E, user_id: &str) -> Result<Option<UserRanking>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query("SELECT user_id, total_points, updated_at FROM user_rankings WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    Ok(row.and_then(|row| {
        let updated_at: String = row.get("updated_at");
        Some(UserRanking {
            user_id: row.get("user_id"),
            total_points: row.get("total_points"),
            updated_at: parse_timestamp(&updated_at)?,
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use paes_common::db::init_memory_database;

    #[tokio::test]
    async fn test_achievement_round_trip() {
        let pool = init_memory_database().await.unwrap();
        let now = parse_timestamp("2026-03-01T12:00:00.000Z").unwrap();
        let rows = vec![
            AchievementProgress {
                id: "first_steps".to_string(),
                user_id: "u1".to_string(),
                progress: 5,
                max_progress: 5,
                unlocked: true,
                unlocked_at: Some(now),
            },
            AchievementProgress {
                id: "paes_legend".to_string(),
                user_id: "u1".to_string(),
                progress: 40,
                max_progress: 90,
                unlocked: false,
                unlocked_at: None,
            },
        ];
        let mut conn = pool.acquire().await.unwrap();
        save_achievements(&mut conn, &rows).await.unwrap();
        assert_eq!(load_achievements(&mut *conn, "u1").await.unwrap(), rows);
    }

    #[tokio::test]
    async fn test_ranking_points_accumulate() {
        let pool = init_memory_database().await.unwrap();
        assert!(get_ranking(&pool, "u1").await.unwrap().is_none());
        assert_eq!(add_ranking_points(&pool, "u1", 100, Utc::now()).await.unwrap(), 100);
        assert_eq!(add_ranking_points(&pool, "u1", 250, Utc::now()).await.unwrap(), 350);
        assert_eq!(get_ranking(&pool, "u1").await.unwrap().unwrap().total_points, 350);
    }

    #[tokio::test]
    async fn test_ensure_ranking_keeps_existing_total() {
        let pool = init_memory_database().await.unwrap();
        ensure_ranking(&pool, "u1", Utc::now()).await.unwrap();
        assert_eq!(get_ranking(&pool, "u1").await.unwrap().unwrap().total_points, 0);

        add_ranking_points(&pool, "u1", 100, Utc::now()).await.unwrap();
        ensure_ranking(&pool, "u1", Utc::now()).await.unwrap();
        assert_eq!(get_ranking(&pool, "u1").await.unwrap().unwrap().total_points, 100);
    }
}
