//! Integration tests for paes-content API endpoints

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use paes_common::config::TomlConfig;
use paes_common::db::init_memory_database;
use paes_common::{Catalog, Difficulty, GeneratedExercise, Subject};
use paes_content::db::exercises::{insert_exercise, list_exercises};
use paes_content::services::{ExerciseGenerator, GenerationError, GenerationRequest};
use paes_content::{build_router, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::util::ServiceExt;

/// Test helper: app over a fresh in-memory database
async fn create_test_state() -> AppState {
    let pool = init_memory_database().await.expect("Failed to create in-memory database");
    let catalog = Catalog::embedded().expect("Embedded catalog should parse");
    AppState::new(pool, catalog, &TomlConfig::default())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn seed_exercises(pool: &SqlitePool, subjects: &[Subject], per_subject: usize) {
    let mut n = 0;
    for &subject in subjects {
        for i in 0..per_subject {
            let difficulty = match i * 20 / per_subject {
                0..=7 => Difficulty::Basico,
                8..=16 => Difficulty::Intermedio,
                _ => Difficulty::Avanzado,
            };
            let exercise = GeneratedExercise {
                id: format!("seed-{}", n),
                subject_category: subject,
                difficulty_level: difficulty,
                node_id: None,
                quality_score: Some(0.8),
                source: "ai_generated".to_string(),
            };
            insert_exercise(pool, &exercise).await.unwrap();
            n += 1;
        }
    }
}

/// Returns `quantity` exercises for every request
struct EchoGenerator;

#[async_trait]
impl ExerciseGenerator for EchoGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedExercise>, GenerationError> {
        Ok((0..request.quantity)
            .map(|_| GeneratedExercise {
                id: uuid::Uuid::new_v4().to_string(),
                subject_category: request.subject.unwrap_or(Subject::CompetenciaLectora),
                difficulty_level: request.difficulty.unwrap_or(Difficulty::Intermedio),
                node_id: request.node_id.clone(),
                quality_score: Some(0.9),
                source: "ai_generated".to_string(),
            })
            .collect())
    }
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_router(create_test_state().await);
    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "paes-content");
    assert_eq!(body["generator_configured"], false);
}

// ============================================================================
// Validation and auto-correction
// ============================================================================

#[tokio::test]
async fn test_import_then_validate_stored_nodes() {
    let app = build_router(create_test_state().await);

    let payload = json!([
        {
            "id": "m1-pot",
            "title": "Potencias y raíces",
            "subjectCategory": "MATEMATICA_1",
            "cognitiveLevel": "APLICAR",
            "testId": 2,
            "skillId": 4,
            "tierPriority": "tier1_critico"
        },
        {
            "id": "m1-hist",
            "title": "Resolución de problemas",
            "subject_area": "HISTORIA",
            "bloom_level": "COMPRENDER",
            "test_id": 2,
            "skill_id": 4
        },
        { "title": "no id" }
    ]);
    let (status, body) = send(&app, "POST", "/api/nodes/import", Some(payload), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported"], 2);
    assert_eq!(body["rejected"].as_array().unwrap().len(), 1);

    let (status, summary) = send(&app, "GET", "/api/validation/nodes", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_nodes"], 2);
    assert_eq!(summary["valid_nodes"], 1);
    assert_eq!(summary["issues_by_type"]["test_id_mismatch"], 1);
    assert_eq!(summary["issues_by_type"]["thematic_mismatch"], 0);

    let mismatch = summary["results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["node_id"] == "m1-hist")
        .unwrap();
    assert_eq!(mismatch["is_valid"], false);
    let description = mismatch["issues"][0]["description"].as_str().unwrap();
    assert!(description.contains("Subject area") && description.contains("test_id"));
}

#[tokio::test]
async fn test_validate_posted_math_node_declared_as_history() {
    let app = build_router(create_test_state().await);
    let payload = json!([{
        "id": "n1",
        "title": "Ecuación lineal y operaciones con fracciones",
        "subjectCategory": "HISTORIA",
        "cognitiveLevel": "COMPRENDER",
        "testId": 4,
        "skillId": 12
    }]);

    let (status, body) = send(&app, "POST", "/api/validation/nodes", Some(payload), None).await;
    assert_eq!(status, StatusCode::OK);

    let result = &body["results"][0];
    assert_eq!(result["is_valid"], false);
    assert_eq!(result["suggested_test"], "MATEMATICA_1");
    assert!(result["confidence"].as_f64().unwrap() < 0.5);
    assert!(result["scores"]["MATEMATICA_1"].as_f64().unwrap() >= 2.0);
    assert_eq!(result["scores"]["HISTORIA"].as_f64().unwrap(), 0.0);
    assert_eq!(body["issues_by_type"]["thematic_mismatch"], 1);

    // Nothing was stored
    let (_, stored) = send(&app, "GET", "/api/validation/nodes", None, None).await;
    assert_eq!(stored["total_nodes"], 0);
}

#[tokio::test]
async fn test_auto_correct_persists_and_is_idempotent() {
    let app = build_router(create_test_state().await);
    let payload = json!([{
        "id": "broken",
        "title": "Álgebra",
        "subjectCategory": "HISTORIA",
        "testId": 2,
        "skillId": 13
    }]);
    send(&app, "POST", "/api/nodes/import", Some(payload), None).await;

    let (status, first) = send(&app, "POST", "/api/nodes/broken/auto-correct", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["corrections"].as_array().unwrap().len(), 3);
    assert_eq!(first["node"]["subject_category"], "MATEMATICA_1");
    assert_eq!(first["node"]["cognitive_level"], "COMPRENDER");
    assert_eq!(first["node"]["skill_id"], 4);

    let (_, second) = send(&app, "POST", "/api/nodes/broken/auto-correct", None, None).await;
    assert!(second["corrections"].as_array().unwrap().is_empty());
    assert_eq!(second["node"], first["node"]);

    let (_, stored) = send(&app, "GET", "/api/nodes/broken", None, None).await;
    assert_eq!(stored, first["node"]);
}

#[tokio::test]
async fn test_auto_correct_unknown_node_returns_json_error() {
    let app = build_router(create_test_state().await);
    let (status, body) = send(&app, "POST", "/api/nodes/ghost/auto-correct", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NO_ROWS");
}

// ============================================================================
// Distribution
// ============================================================================

#[tokio::test]
async fn test_even_distribution_has_no_subject_gaps() {
    let state = create_test_state().await;
    seed_exercises(&state.db, &Subject::ALL, 20).await;
    let app = build_router(state);

    let (status, report) = send(&app, "GET", "/api/distribution/report", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_exercises"], 100);
    assert_eq!(report["by_subject"]["CIENCIAS"], 20);
    assert!(report["gaps"]
        .as_array()
        .unwrap()
        .iter()
        .all(|g| !g["type"].as_str().unwrap().starts_with("subject_")));
    assert!((report["quality"]["mean"].as_f64().unwrap() - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn test_missing_subject_recommendation() {
    let state = create_test_state().await;
    seed_exercises(
        &state.db,
        &[Subject::CompetenciaLectora, Subject::Matematica1, Subject::Matematica2, Subject::Historia],
        25,
    )
    .await;
    let app = build_router(state);

    let (_, report) = send(&app, "GET", "/api/distribution/report", None, None).await;
    let gap = report["gaps"]
        .as_array()
        .unwrap()
        .iter()
        .find(|g| g["type"] == "subject_underrepresented")
        .unwrap()
        .clone();
    assert_eq!(gap["subject"], "CIENCIAS");
    assert_eq!(gap["deficit"], 20);

    let (status, body) = send(&app, "GET", "/api/distribution/recommendations", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let task = &body["tasks"][0];
    assert_eq!(task["priority"], "high");
    assert_eq!(task["target"], "CIENCIAS");
    assert_eq!(task["quantity"], 20);
    assert_eq!(task["breakdown"], json!({ "BASICO": 8, "INTERMEDIO": 9, "AVANZADO": 3 }));
}

#[tokio::test]
async fn test_execute_without_generator_is_unavailable() {
    let app = build_router(create_test_state().await);
    let (status, body) = send(&app, "POST", "/api/distribution/execute", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_execute_stores_generated_exercises() {
    let state = create_test_state().await;
    seed_exercises(
        &state.db,
        &[Subject::CompetenciaLectora, Subject::Matematica1, Subject::Matematica2, Subject::Historia],
        25,
    )
    .await;
    let pool = state.db.clone();
    let app = build_router(state.with_generator(Arc::new(EchoGenerator)));

    let (status, summary) = send(&app, "POST", "/api/distribution/execute", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["requests_failed"], 0);
    assert_eq!(summary["exercises_stored"], 20);

    let ciencias = list_exercises(&pool)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.subject_category == Subject::Ciencias)
        .count();
    assert_eq!(ciencias, 20);
}

// ============================================================================
// Sessions and achievements
// ============================================================================

#[tokio::test]
async fn test_achievements_require_session() {
    let app = build_router(create_test_state().await);

    let (status, body) = send(&app, "GET", "/api/achievements", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(&app, "GET", "/api/achievements", None, Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_first_steps_unlocks_once() {
    let app = build_router(create_test_state().await);

    let (status, session) = send(&app, "POST", "/api/session/sign-in", Some(json!({ "userId": "student-1" })), None).await;
    assert_eq!(status, StatusCode::OK);
    let token = session["token"].as_str().unwrap().to_string();

    for i in 0..4 {
        let body = json!({ "node_id": format!("n{}", i), "mastery_level": 0.5, "skill_id": 4 });
        let (status, _) = send(&app, "POST", "/api/progress", Some(body), Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, four) = send(&app, "GET", "/api/achievements", None, Some(&token)).await;
    let first_steps = |body: &Value| {
        body["achievements"]
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["id"] == "first_steps")
            .unwrap()
            .clone()
    };
    assert_eq!(first_steps(&four)["progress"], 4);
    assert_eq!(first_steps(&four)["unlocked"], false);
    assert_eq!(four["points_awarded"], 0);

    let body = json!({ "node_id": "n4", "mastery_level": 0.5, "skill_id": 4 });
    send(&app, "POST", "/api/progress", Some(body), Some(&token)).await;

    let (_, five) = send(&app, "GET", "/api/achievements", None, Some(&token)).await;
    assert_eq!(first_steps(&five)["progress"], 5);
    assert_eq!(first_steps(&five)["unlocked"], true);
    assert_eq!(five["newly_unlocked"], json!(["first_steps"]));
    assert_eq!(five["points_awarded"], 100);
    assert_eq!(five["total_points"], 100);

    let (_, again) = send(&app, "GET", "/api/achievements", None, Some(&token)).await;
    assert_eq!(again["points_awarded"], 0);
    assert_eq!(again["total_points"], 100);
    assert_eq!(first_steps(&again)["unlocked"], true);
    assert!(first_steps(&again)["unlocked_at"].is_string());

    let (status, out) = send(&app, "POST", "/api/session/sign-out", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["signed_out"], true);
    let (status, _) = send(&app, "GET", "/api/achievements", None, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_in_rejects_empty_user() {
    let app = build_router(create_test_state().await);
    let (status, _) = send(&app, "POST", "/api/session/sign-in", Some(json!({ "user_id": "  " })), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_progress_rejects_out_of_range_mastery() {
    let app = build_router(create_test_state().await);
    let (_, session) = send(&app, "POST", "/api/session/sign-in", Some(json!({ "user_id": "u" })), None).await;
    let token = session["token"].as_str().unwrap();
    let body = json!({ "node_id": "n", "mastery_level": 1.5 });
    let (status, _) = send(&app, "POST", "/api/progress", Some(body), Some(token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

async fn sign_in_with_started_nodes(app: &Router, user_id: &str, count: usize) -> String {
    let (_, session) = send(app, "POST", "/api/session/sign-in", Some(json!({ "user_id": user_id })), None).await;
    let token = session["token"].as_str().unwrap().to_string();
    for i in 0..count {
        let body = json!({ "node_id": format!("n{}", i), "mastery_level": 0.5, "skill_id": 4 });
        let (status, _) = send(app, "POST", "/api/progress", Some(body), Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
    }
    token
}

async fn assert_concurrent_accrual_awards_once(app: Router) {
    let token = sign_in_with_started_nodes(&app, "student-1", 5).await;

    let (a, b) = tokio::join!(
        send(&app, "GET", "/api/achievements", None, Some(&token)),
        send(&app, "GET", "/api/achievements", None, Some(&token)),
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);

    let mut awarded = vec![a.1["points_awarded"].as_i64().unwrap(), b.1["points_awarded"].as_i64().unwrap()];
    awarded.sort();
    assert_eq!(awarded, vec![0, 100]);

    let (_, after) = send(&app, "GET", "/api/achievements", None, Some(&token)).await;
    assert_eq!(after["points_awarded"], 0);
    assert_eq!(after["total_points"], 100);
}

#[tokio::test]
async fn test_concurrent_accrual_awards_once() {
    assert_concurrent_accrual_awards_once(build_router(create_test_state().await)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accrual_awards_once_on_file_database() {
    let dir = tempfile::TempDir::new().unwrap();
    let pool = paes_common::db::init_database(&dir.path().join("paes.db")).await.unwrap();
    let catalog = Catalog::embedded().unwrap();
    let app = build_router(AppState::new(pool, catalog, &TomlConfig::default()));

    assert_concurrent_accrual_awards_once(app).await;
}
