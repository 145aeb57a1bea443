//! Exercise generation service client
//!
//! The generator is an external collaborator: it receives a
//! subject/skill/difficulty/quantity descriptor and returns exercise payloads.
//! Calls are never retried here.

use async_trait::async_trait;
use paes_common::config::GeneratorConfig;
use paes_common::normalize::exercise_from_value;
use paes_common::{Difficulty, GeneratedExercise, Subject};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

const USER_AGENT: &str = concat!("paes-content/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Generator returned {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Descriptor sent to the generator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

/// External exercise generator
#[async_trait]
pub trait ExerciseGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedExercise>, GenerationError>;
}

/// Generator reached over HTTP (JSON POST with bearer key)
pub struct HttpExerciseGenerator {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpExerciseGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GenerationError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ExerciseGenerator for HttpExerciseGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedExercise>, GenerationError> {
        debug!(endpoint = %self.endpoint, quantity = request.quantity, "Requesting exercise generation");

        let mut builder = self.http_client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError(status.as_u16(), error_text));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;

        parse_generated(body, request)
    }
}

/// Accepts a bare array or an object with an `exercises` array
///
/// Items missing an id get a fresh one; items missing subject, difficulty or
/// node fall back to the request descriptor.
pub fn parse_generated(body: Value, request: &GenerationRequest) -> Result<Vec<GeneratedExercise>, GenerationError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("exercises") {
            Some(Value::Array(items)) => items,
            _ => return Err(GenerationError::ParseError("response has no exercises array".to_string())),
        },
        _ => return Err(GenerationError::ParseError("unexpected response shape".to_string())),
    };

    let total = items.len();
    let exercises: Vec<GeneratedExercise> = items
        .into_iter()
        .filter_map(|item| {
            let Value::Object(mut map) = item else {
                return None;
            };
            map.entry("id").or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            let has_subject = ["subject_category", "subjectCategory", "subject", "prueba_paes", "prueba"]
                .iter()
                .any(|k| map.contains_key(*k));
            if !has_subject {
                if let Some(subject) = request.subject {
                    map.insert("subject_category".to_string(), Value::String(subject.to_string()));
                }
            }
            let has_difficulty = ["difficulty_level", "difficultyLevel", "difficulty"]
                .iter()
                .any(|k| map.contains_key(*k));
            if !has_difficulty {
                if let Some(difficulty) = request.difficulty {
                    map.insert("difficulty_level".to_string(), Value::String(difficulty.to_string()));
                }
            }
            if !map.contains_key("node_id") && !map.contains_key("nodeId") {
                if let Some(node_id) = &request.node_id {
                    map.insert("node_id".to_string(), Value::String(node_id.clone()));
                }
            }
            exercise_from_value(Value::Object(map))
        })
        .collect();

    if exercises.len() < total {
        warn!(received = total, kept = exercises.len(), "Dropped unusable generated exercises");
    }
    Ok(exercises)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> GenerationRequest {
        GenerationRequest {
            subject: Some(Subject::Ciencias),
            skill_id: Some(8),
            difficulty: Some(Difficulty::Basico),
            quantity: 2,
            node_id: Some("n1".to_string()),
        }
    }

    #[test]
    fn test_parse_fills_from_request() {
        let exercises = parse_generated(json!([{ "qualityScore": 0.9 }, { "id": "x", "difficulty": "hard" }]), &request()).unwrap();
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].subject_category, Subject::Ciencias);
        assert_eq!(exercises[0].difficulty_level, Difficulty::Basico);
        assert_eq!(exercises[0].node_id.as_deref(), Some("n1"));
        assert_eq!(exercises[1].id, "x");
        assert_eq!(exercises[1].difficulty_level, Difficulty::Avanzado);
    }

    #[test]
    fn test_parse_wrapped_response() {
        let body = json!({ "exercises": [{ "id": "a", "subject_category": "HISTORIA" }] });
        let exercises = parse_generated(body, &request()).unwrap();
        assert_eq!(exercises[0].subject_category, Subject::Historia);
    }

    #[test]
    fn test_parse_rejects_unexpected_shape() {
        assert!(matches!(parse_generated(json!("nope"), &request()), Err(GenerationError::ParseError(_))));
        assert!(matches!(parse_generated(json!({ "items": [] }), &request()), Err(GenerationError::ParseError(_))));
    }

    #[test]
    fn test_request_serialization_skips_absent_fields() {
        let request = GenerationRequest {
            subject: None,
            skill_id: None,
            difficulty: Some(Difficulty::Avanzado),
            quantity: 3,
            node_id: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, json!({ "difficulty": "AVANZADO", "quantity": 3 }));
    }
}
