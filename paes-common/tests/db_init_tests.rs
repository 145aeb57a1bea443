//! Database initialization tests

use paes_common::db::{create_tables, init_database, init_memory_database};
use tempfile::TempDir;

const TABLES: [&str; 6] = [
    "learning_nodes",
    "generated_exercises",
    "user_node_progress",
    "activity_events",
    "user_achievements",
    "user_rankings",
];

#[tokio::test]
async fn test_database_created_with_parent_directory() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("paes.db");

    let pool = init_database(&db_path).await.expect("init should succeed");
    assert!(db_path.exists(), "Database file was not created");

    for table in TABLES {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1, "table {} missing", table);
    }
}

#[tokio::test]
async fn test_reopen_existing_database() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("paes.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO user_rankings (user_id, total_points, updated_at) VALUES ('u1', 100, '2026-01-01T00:00:00Z')")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.expect("reopen should succeed");
    let points: i64 = sqlx::query_scalar("SELECT total_points FROM user_rankings WHERE user_id = 'u1'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(points, 100);
}

#[tokio::test]
async fn test_create_tables_is_idempotent() {
    let pool = init_memory_database().await.unwrap();
    create_tables(&pool).await.expect("second run should be a no-op");
}

#[tokio::test]
async fn test_quality_score_range_enforced() {
    let pool = init_memory_database().await.unwrap();
    let result = sqlx::query(
        "INSERT INTO generated_exercises (id, subject_category, difficulty_level, quality_score) VALUES ('e1', 'CIENCIAS', 'BASICO', 1.5)",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err());
}
