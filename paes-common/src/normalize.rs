//! Store-boundary normalization
//!
//! Externally produced records (import payloads, legacy exports) spell the
//! same field several ways (`subjectCategory`, `subject_category`,
//! `subject_area`, ...) and carry enum values in mixed case or language.
//! This module is the single place those variants are resolved; everything
//! past it works with the canonical types in [`crate::models`].

use crate::models::{CognitiveLevel, ContentNode, Difficulty, GeneratedExercise, Subject, TierPriority};
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Content node as it arrives from an import payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawContentNode {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "subjectCategory", alias = "subject_area", alias = "subjectArea")]
    pub subject_category: Option<String>,
    #[serde(default, alias = "cognitiveLevel", alias = "bloom_level", alias = "bloomLevel")]
    pub cognitive_level: Option<String>,
    #[serde(default, alias = "testId")]
    pub test_id: Option<Value>,
    #[serde(default, alias = "skillId")]
    pub skill_id: Option<Value>,
    #[serde(default, alias = "tierPriority")]
    pub tier_priority: Option<String>,
    #[serde(default, alias = "dependsOn")]
    pub depends_on: Option<Value>,
}

/// Generated exercise as it arrives from the generator or a legacy export
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExercise {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, alias = "subjectCategory", alias = "subject", alias = "prueba_paes", alias = "prueba")]
    pub subject_category: Option<String>,
    #[serde(default, alias = "difficultyLevel", alias = "difficulty")]
    pub difficulty_level: Option<String>,
    #[serde(default, alias = "nodeId")]
    pub node_id: Option<Value>,
    #[serde(default, alias = "qualityScore")]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Normalize one raw node
///
/// Only a missing id is an error. Missing or unrecognized enum values become
/// `None`, missing numeric ids become 0 (no test or skill has id 0), missing
/// text becomes empty; the validator reports those as findings.
pub fn normalize_node(raw: RawContentNode) -> Result<ContentNode> {
    let id = raw
        .id
        .as_ref()
        .and_then(value_as_id)
        .ok_or_else(|| Error::InvalidInput("Content node without id".to_string()))?;

    Ok(ContentNode {
        subject_category: raw.subject_category.as_deref().and_then(Subject::parse),
        cognitive_level: raw.cognitive_level.as_deref().and_then(CognitiveLevel::parse),
        test_id: raw.test_id.as_ref().and_then(value_as_i64).unwrap_or(0),
        skill_id: raw.skill_id.as_ref().and_then(value_as_i64).unwrap_or(0),
        tier_priority: raw.tier_priority.as_deref().and_then(TierPriority::parse),
        depends_on: raw.depends_on.as_ref().map(parse_id_list).unwrap_or_default(),
        title: raw.title.unwrap_or_default().trim().to_string(),
        description: raw.description.unwrap_or_default().trim().to_string(),
        code: raw.code.filter(|c| !c.trim().is_empty()),
        id,
    })
}

/// Normalize a JSON node payload
pub fn node_from_value(value: Value) -> Result<ContentNode> {
    let raw: RawContentNode = serde_json::from_value(value)
        .map_err(|e| Error::InvalidInput(format!("Malformed content node: {}", e)))?;
    normalize_node(raw)
}

/// Normalize a batch of node payloads, returning rejects with their reason
pub fn normalize_nodes(values: Vec<Value>) -> (Vec<ContentNode>, Vec<String>) {
    let mut nodes = Vec::with_capacity(values.len());
    let mut rejected = Vec::new();
    for (index, value) in values.into_iter().enumerate() {
        match node_from_value(value) {
            Ok(node) => nodes.push(node),
            Err(e) => {
                warn!(index, "Rejected content node: {}", e);
                rejected.push(format!("#{}: {}", index, e));
            }
        }
    }
    (nodes, rejected)
}

/// Normalize one raw exercise
///
/// Exercises without a recognizable subject cannot be bucketed and are
/// dropped (`None`). Unknown difficulty defaults to INTERMEDIO. Node id and
/// quality fall back to the legacy `metadata.nodeId` and
/// `metadata.qualityMetrics.overallScore` locations.
pub fn normalize_exercise(raw: RawExercise) -> Option<GeneratedExercise> {
    let id = raw.id.as_ref().and_then(value_as_id)?;

    let Some(subject) = raw.subject_category.as_deref().and_then(Subject::parse) else {
        warn!(exercise_id = %id, subject = ?raw.subject_category, "Dropping exercise with unknown subject");
        return None;
    };

    let difficulty = raw
        .difficulty_level
        .as_deref()
        .and_then(Difficulty::parse)
        .unwrap_or(Difficulty::Intermedio);

    let metadata = raw.metadata.as_ref();
    let node_id = raw
        .node_id
        .as_ref()
        .and_then(value_as_id)
        .or_else(|| metadata.and_then(|m| m.get("nodeId")).and_then(value_as_id));

    let quality_score = raw
        .quality_score
        .or_else(|| {
            metadata
                .and_then(|m| m.pointer("/qualityMetrics/overallScore"))
                .and_then(Value::as_f64)
        })
        .filter(|q| q.is_finite())
        .map(|q| q.clamp(0.0, 1.0));

    Some(GeneratedExercise {
        id,
        subject_category: subject,
        difficulty_level: difficulty,
        node_id,
        quality_score,
        source: raw.source.unwrap_or_else(|| "ai_generated".to_string()),
    })
}

/// Normalize a JSON exercise payload
pub fn exercise_from_value(value: Value) -> Option<GeneratedExercise> {
    match serde_json::from_value::<RawExercise>(value) {
        Ok(raw) => normalize_exercise(raw),
        Err(e) => {
            warn!("Malformed exercise payload: {}", e);
            None
        }
    }
}

/// Decode a stored list of ids (JSON array text, or comma separated)
pub fn parse_id_list_text(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => parse_id_list(&value),
        Err(_) => trimmed
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    }
}

fn parse_id_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_as_id).collect(),
        Value::String(s) => parse_id_list_text(s),
        Value::Number(_) => value_as_id(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
