//! Content node persistence
//!
//! Nodes are created and updated, never deleted.

use paes_common::normalize::parse_id_list_text;
use paes_common::{CognitiveLevel, ContentNode, Error, Result, Subject, TierPriority};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};

const SELECT_NODE: &str = r#"
    SELECT id, code, title, description, subject_category, cognitive_level,
           test_id, skill_id, tier_priority, depends_on
    FROM learning_nodes
"#;

/// All nodes, ordered by id
pub async fn list_nodes(pool: &SqlitePool) -> Result<Vec<ContentNode>> {
    let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_NODE))
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(row_to_node).collect())
}

/// One node by id
pub async fn get_node(pool: &SqlitePool, id: &str) -> Result<ContentNode> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_NODE))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref()
        .map(row_to_node)
        .ok_or_else(|| Error::NotFound(format!("Content node {}", id)))
}

/// Insert a node or replace the stored fields of an existing one
pub async fn upsert_node<'e, E>(executor: E, node: &ContentNode) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO learning_nodes (
            id, code, title, description, subject_category, cognitive_level,
            test_id, skill_id, tier_priority, depends_on, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO UPDATE SET
            code = excluded.code,
            title = excluded.title,
            description = excluded.description,
            subject_category = excluded.subject_category,
            cognitive_level = excluded.cognitive_level,
            test_id = excluded.test_id,
            skill_id = excluded.skill_id,
            tier_priority = excluded.tier_priority,
            depends_on = excluded.depends_on,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&node.id)
    .bind(&node.code)
    .bind(&node.title)
    .bind(&node.description)
    .bind(node.subject_category.map(|s| s.as_str()))
    .bind(node.cognitive_level.map(|c| c.as_str()))
    .bind(node.test_id)
    .bind(node.skill_id)
    .bind(node.tier_priority.map(|t| t.as_str()))
    .bind(encode_depends_on(&node.depends_on)?)
    .execute(executor)
    .await?;

    Ok(())
}

/// Upsert a batch of nodes; either all are stored or none
pub async fn upsert_nodes(pool: &SqlitePool, nodes: &[ContentNode]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    for node in nodes {
        upsert_node(&mut *tx, node).await?;
    }
    tx.commit().await?;
    Ok(nodes.len())
}

/// Update the metadata of an existing node
pub async fn update_node(pool: &SqlitePool, node: &ContentNode) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE learning_nodes SET
            subject_category = ?,
            cognitive_level = ?,
            test_id = ?,
            skill_id = ?,
            tier_priority = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(node.subject_category.map(|s| s.as_str()))
    .bind(node.cognitive_level.map(|c| c.as_str()))
    .bind(node.test_id)
    .bind(node.skill_id)
    .bind(node.tier_priority.map(|t| t.as_str()))
    .bind(&node.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Content node {}", node.id)));
    }
    Ok(())
}

fn encode_depends_on(ids: &[String]) -> Result<String> {
    serde_json::to_string(ids).map_err(|e| Error::Internal(format!("Encode depends_on failed: {}", e)))
}

fn row_to_node(row: &SqliteRow) -> ContentNode {
    let subject: Option<String> = row.get("subject_category");
    let level: Option<String> = row.get("cognitive_level");
    let tier: Option<String> = row.get("tier_priority");
    let depends_on: String = row.get("depends_on");

    ContentNode {
        id: row.get("id"),
        code: row.get("code"),
        title: row.get("title"),
        description: row.get("description"),
        subject_category: subject.as_deref().and_then(Subject::parse),
        cognitive_level: level.as_deref().and_then(CognitiveLevel::parse),
        test_id: row.get("test_id"),
        skill_id: row.get("skill_id"),
        tier_priority: tier.as_deref().and_then(TierPriority::parse),
        depends_on: parse_id_list_text(&depends_on),
    }
}
