//! Generated exercise persistence

use paes_common::{Difficulty, GeneratedExercise, Result, Subject};
use sqlx::{Row, SqlitePool};
use tracing::warn;

/// All stored exercises
///
/// Rows whose subject cannot be recognized are skipped; an unrecognized
/// difficulty reads as INTERMEDIO.
pub async fn list_exercises(pool: &SqlitePool) -> Result<Vec<GeneratedExercise>> {
    let rows = sqlx::query(
        r#"
        SELECT id, subject_category, difficulty_level, node_id, quality_score, source
        FROM generated_exercises
        ORDER BY created_at, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut exercises = Vec::with_capacity(rows.len());
    for row in rows {
        let id: String = row.get("id");
        let subject: String = row.get("subject_category");
        let Some(subject_category) = Subject::parse(&subject) else {
            warn!(exercise_id = %id, subject = %subject, "Skipping exercise with unknown subject");
            continue;
        };
        let difficulty: String = row.get("difficulty_level");
        exercises.push(GeneratedExercise {
            id,
            subject_category,
            difficulty_level: Difficulty::parse(&difficulty).unwrap_or(Difficulty::Intermedio),
            node_id: row.get("node_id"),
            quality_score: row.get("quality_score"),
            source: row.get("source"),
        });
    }
    Ok(exercises)
}

/// Store one exercise; returns false when the id already exists
pub async fn insert_exercise(pool: &SqlitePool, exercise: &GeneratedExercise) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO generated_exercises (
            id, subject_category, difficulty_level, node_id, quality_score, source, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO NOTHING
        "#,
    )
    .bind(&exercise.id)
    .bind(exercise.subject_category.as_str())
    .bind(exercise.difficulty_level.as_str())
    .bind(&exercise.node_id)
    .bind(exercise.quality_score)
    .bind(&exercise.source)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use paes_common::db::init_memory_database;

    fn exercise(id: &str) -> GeneratedExercise {
        GeneratedExercise {
            id: id.to_string(),
            subject_category: Subject::Ciencias,
            difficulty_level: Difficulty::Avanzado,
            node_id: Some("n1".to_string()),
            quality_score: Some(0.75),
            source: "ai_generated".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let pool = init_memory_database().await.unwrap();
        assert!(insert_exercise(&pool, &exercise("e1")).await.unwrap());
        assert!(!insert_exercise(&pool, &exercise("e1")).await.unwrap());
        assert_eq!(list_exercises(&pool).await.unwrap(), vec![exercise("e1")]);
    }

    #[tokio::test]
    async fn test_unknown_subject_rows_are_skipped() {
        let pool = init_memory_database().await.unwrap();
        sqlx::query(
            "INSERT INTO generated_exercises (id, subject_category, difficulty_level) VALUES \
             ('x', 'ARTES', 'BASICO'), ('y', 'historia', 'hard'), ('z', 'CIENCIAS', '???')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let exercises = list_exercises(&pool).await.unwrap();
        assert_eq!(exercises.len(), 2);
        let y = exercises.iter().find(|e| e.id == "y").unwrap();
        assert_eq!(y.subject_category, Subject::Historia);
        assert_eq!(y.difficulty_level, Difficulty::Avanzado);
        let z = exercises.iter().find(|e| e.id == "z").unwrap();
        assert_eq!(z.difficulty_level, Difficulty::Intermedio);
    }
}
