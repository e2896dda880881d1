//! Integration tests for Slice 5 - HTTP API
//!
//! Tests API endpoints end to end against a stub generator

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use adaptiq::config::AdaptiveConfig;
use adaptiq::core::{create_router, AppState, ContentGenerator, GenerateRequest};
use adaptiq::error::GenerationError;

struct StubGenerator;

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn generate(&self, _request: GenerateRequest) -> Result<String, GenerationError> {
        Ok(r#"{"question":"Largest planet?","options":["Mars","Jupiter"],"answer":"Jupiter","difficulty":3}"#.to_string())
    }
}

fn create_test_router(report_dir: &std::path::Path) -> Router {
    let state = AppState::new(Arc::new(StubGenerator), AdaptiveConfig::default(), report_dir);
    create_router(Arc::new(state))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Poll until the first question is on screen
async fn wait_for_question(app: &Router, id: &str) -> Value {
    for _ in 0..50 {
        let (_, snap) = send(app, "GET", &format!("/session/{}", id), None).await;
        if snap["phase"] == "AWAITING_ANSWER" {
            return snap;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("question never arrived");
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_router(dir.path());

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["sessions_active"], 0);
}

#[tokio::test]
async fn test_create_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_router(dir.path());

    let (status, json) = send(&app, "POST", "/session/new", Some("{}")).await;

    assert_eq!(status, StatusCode::OK);
    let id = json["session_id"].as_str().unwrap();
    assert!(id.starts_with("session_"));
    assert_eq!(json["websocket_url"], format!("/ws/{}", id));

    let (_, snap) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(snap["phase"], "IDLE");
    assert_eq!(snap["level"], 3);

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["sessions_active"], 1);
}

#[tokio::test]
async fn test_quiz_flow_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_router(dir.path());

    let (_, created) = send(&app, "POST", "/session/new", Some(r#"{"topic":"planets"}"#)).await;
    let id = created["session_id"].as_str().unwrap().to_string();

    let snap = wait_for_question(&app, &id).await;
    assert_eq!(snap["question"]["answer"], "Jupiter");
    assert_eq!(snap["topic"], "planets");

    // Distressed tick: immediate step down
    let (status, snap) = send(
        &app,
        "POST",
        &format!("/session/{}/expressions", id),
        Some(r#"{"scores":{"fearful":0.9,"neutral":0.05}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["level"], 2);
    assert_eq!(snap["changed_direction"], "down");
    assert_eq!(snap["cooldown_active"], true);

    // No face
    let (status, _) = send(&app, "POST", &format!("/session/{}/expressions", id), Some(r#"{"scores":null}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, answered) = send(&app, "POST", &format!("/session/{}/answer", id), Some(r#"{"option":"Jupiter"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answered["correct"], true);
    assert_eq!(answered["snapshot"]["score"], 1);

    let (status, err) = send(&app, "POST", &format!("/session/{}/answer", id), Some(r#"{"option":"Mars"}"#)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["error"].as_str().unwrap().contains("already answered"));

    let (status, report) = send(&app, "POST", &format!("/session/{}/report", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let path = report["path"].as_str().unwrap();
    assert!(std::path::Path::new(path).exists());

    let (status, snap) = send(&app, "POST", &format!("/session/{}/reset", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["phase"], "IDLE");
    assert_eq!(snap["level"], 3);
    assert_eq!(snap["score"], 0);
}

#[tokio::test]
async fn test_start_existing_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_router(dir.path());

    let (_, created) = send(&app, "POST", "/session/new", Some("{}")).await;
    let id = created["session_id"].as_str().unwrap().to_string();

    let (status, snap) = send(&app, "POST", &format!("/session/{}/start", id), Some(r#"{"topic":"stars"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["topic"], "stars");

    let (status, _) = send(&app, "POST", &format!("/session/{}/start", id), Some(r#"{"topic":""}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_answer_without_question_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_router(dir.path());

    let (_, created) = send(&app, "POST", "/session/new", Some("{}")).await;
    let id = created["session_id"].as_str().unwrap().to_string();

    let (status, err) = send(&app, "POST", &format!("/session/{}/answer", id), Some(r#"{"option":"x"}"#)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["error"].is_string());
}

#[tokio::test]
async fn test_unknown_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_router(dir.path());

    let (status, err) = send(&app, "GET", "/session/session_missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(err["error"].as_str().unwrap().contains("not found"));

    let (status, _) = send(&app, "POST", "/session/session_missing/reset", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_close_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_router(dir.path());

    let (_, created) = send(&app, "POST", "/session/new", Some("{}")).await;
    let id = created["session_id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "DELETE", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["sessions_active"], 0);

    let (status, _) = send(&app, "DELETE", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_saved_reports_are_readable() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_router(dir.path());

    let (status, _) = send(&app, "GET", "/report/latest", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, listing) = send(&app, "GET", "/reports", None).await;
    assert_eq!(listing["reports"], serde_json::json!([]));

    let (_, created) = send(&app, "POST", "/session/new", Some(r#"{"topic":"planets"}"#)).await;
    let id = created["session_id"].as_str().unwrap().to_string();
    wait_for_question(&app, &id).await;
    send(&app, "POST", &format!("/session/{}/answer", id), Some(r#"{"option":"Jupiter"}"#)).await;

    let (_, saved) = send(&app, "POST", &format!("/session/{}/report", id), None).await;
    let name = std::path::Path::new(saved["path"].as_str().unwrap())
        .file_stem()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let (status, latest) = send(&app, "GET", "/report/latest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["id"], name.as_str());
    assert_eq!(latest["topic"], "planets");
    assert_eq!(latest["score"], 1);

    let (status, named) = send(&app, "GET", &format!("/report/{}", name), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(named, latest);

    let (_, listing) = send(&app, "GET", "/reports", None).await;
    assert_eq!(listing["reports"][0]["name"], name.as_str());
    assert_eq!(listing["reports"][0]["total_answered"], 1);

    let (status, _) = send(&app, "GET", "/report/report_missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", "/report/bad.name", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
