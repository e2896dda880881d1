//! HTTP + WebSocket API for adaptive quiz sessions
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /session/new - Create session (optionally starts the quiz)
//! - GET /session/:id - Current snapshot
//! - POST /session/:id/start - Start a quiz on a topic
//! - POST /session/:id/expressions - One camera tick of expression scores
//! - POST /session/:id/answer - Submit an option
//! - POST /session/:id/reset - Back to idle
//! - POST /session/:id/report - Save a session report
//! - DELETE /session/:id - Close a session
//! - GET /reports - Saved reports, newest first
//! - GET /report/latest - Most recently saved report
//! - GET /report/:name - One saved report
//! - WS /ws/:id - Live updates

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::config::AdaptiveConfig;
use crate::core::generator::{ContentGenerator, QuestionContext};
use crate::core::report::{self, ReportSummary};
use crate::core::session::{SessionHandle, SessionUpdate};
use crate::error::{QuizError, ReportError, SessionError};
use crate::types::{CognitiveProfile, ControllerSnapshot, ExpressionScores, SessionReport};

/// Shared server state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, SessionHandle>>,
    pub generator: Arc<dyn ContentGenerator>,
    pub adaptive: AdaptiveConfig,
    pub report_dir: PathBuf,
}

impl AppState {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        adaptive: AdaptiveConfig,
        report_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            generator,
            adaptive,
            report_dir: report_dir.into(),
        }
    }

    async fn session(&self, id: &str) -> Result<SessionHandle, ApiError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()).into())
    }
}

/// Error body: `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let status = match &err {
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::Quiz(QuizError::EmptyTopic) => StatusCode::BAD_REQUEST,
            SessionError::Quiz(_) => StatusCode::CONFLICT,
            SessionError::Closed => StatusCode::GONE,
            SessionError::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        let status = match &err {
            ReportError::NotFound(_) => StatusCode::NOT_FOUND,
            ReportError::InvalidName(_) => StatusCode::BAD_REQUEST,
            ReportError::Io(_) | ReportError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, error = %self.message, "request failed");
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Create new session request
#[derive(Debug, Default, Deserialize)]
pub struct NewSessionRequest {
    pub topic: Option<String>,
    pub theory: Option<String>,
    pub profile: Option<CognitiveProfile>,
}

/// Create new session response
#[derive(Debug, Serialize, Deserialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub topic: String,
}

/// One camera tick; `scores: null` means no face
#[derive(Debug, Deserialize)]
pub struct ExpressionsRequest {
    pub scores: Option<ExpressionScores>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub option: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub correct: bool,
    pub snapshot: ControllerSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportListResponse {
    pub reports: Vec<ReportSummary>,
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session).delete(close_session))
        .route("/session/:id/start", post(start_quiz))
        .route("/session/:id/expressions", post(post_expressions))
        .route("/session/:id/answer", post(submit_answer))
        .route("/session/:id/reset", post(reset_session))
        .route("/session/:id/report", post(save_report))
        .route("/reports", get(list_saved_reports))
        .route("/report/latest", get(latest_saved_report))
        .route("/report/:name", get(get_saved_report))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
    })
}

/// Create new session
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewSessionRequest>,
) -> Result<Json<NewSessionResponse>, ApiError> {
    let session_id = generate_session_id();
    let context = QuestionContext {
        theory: req.theory,
        profile: req.profile,
    };
    let handle = SessionHandle::spawn(
        session_id.clone(),
        state.adaptive.clone(),
        Arc::clone(&state.generator),
        context,
    );

    if let Some(topic) = req.topic.as_deref() {
        handle.start(topic).await?;
    }

    state.sessions.write().await.insert(session_id.clone(), handle);
    info!(session = %session_id, "session created");

    Ok(Json(NewSessionResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
    }))
}

/// Current snapshot
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ControllerSnapshot>, ApiError> {
    let handle = state.session(&id).await?;
    Ok(Json(handle.snapshot().await?))
}

/// Drop the session; its actor stops once in-flight requests finish
async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.write().await.remove(&id).is_none() {
        return Err(SessionError::NotFound(id).into());
    }
    info!(session = %id, "session closed by client");
    Ok(StatusCode::NO_CONTENT)
}

async fn start_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<StartRequest>,
) -> Result<Json<ControllerSnapshot>, ApiError> {
    let handle = state.session(&id).await?;
    handle.start(req.topic).await?;
    Ok(Json(handle.snapshot().await?))
}

async fn post_expressions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ExpressionsRequest>,
) -> Result<Json<ControllerSnapshot>, ApiError> {
    let handle = state.session(&id).await?;
    handle.observe(req.scores).await?;
    Ok(Json(handle.snapshot().await?))
}

async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let handle = state.session(&id).await?;
    let correct = handle.answer(req.option).await?;
    Ok(Json(AnswerResponse {
        correct,
        snapshot: handle.snapshot().await?,
    }))
}

async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ControllerSnapshot>, ApiError> {
    let handle = state.session(&id).await?;
    handle.reset().await?;
    Ok(Json(handle.snapshot().await?))
}

async fn save_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ReportResponse>, ApiError> {
    let handle = state.session(&id).await?;
    let path = handle.save_report(state.report_dir.clone()).await?;
    Ok(Json(ReportResponse {
        path: path.display().to_string(),
    }))
}

async fn list_saved_reports(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReportListResponse>, ApiError> {
    let reports = report::list_reports(&state.report_dir)?;
    Ok(Json(ReportListResponse { reports }))
}

async fn latest_saved_report(State(state): State<Arc<AppState>>) -> Result<Json<SessionReport>, ApiError> {
    report::latest_report(&state.report_dir)?
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "no reports saved yet"))
}

async fn get_saved_report(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<SessionReport>, ApiError> {
    Ok(Json(report::find_report(&state.report_dir, &name)?))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let rx = state.session(&id).await?.subscribe();

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Forward updates until the client goes away
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<SessionUpdate>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            update = rx.recv() => {
                let update = match update {
                    Ok(update) => update,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "websocket client lagging, updates dropped");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let json = match serde_json::to_string(&update) {
                    Ok(json) => json,
                    Err(err) => {
                        warn!(error = %err, "failed to encode session update");
                        continue;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

fn generate_session_id() -> String {
    format!("session_{}", uuid::Uuid::new_v4().simple())
}

/// Run the API server
pub async fn run_server(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "adaptiq API listening");
    println!("Adaptiq API running on {}", addr);
    println!("  POST /session/new              - Create session");
    println!("  GET  /session/:id              - Get snapshot");
    println!("  POST /session/:id/start        - Start quiz");
    println!("  POST /session/:id/expressions  - Post expression scores");
    println!("  POST /session/:id/answer       - Submit answer");
    println!("  POST /session/:id/reset        - Reset session");
    println!("  POST /session/:id/report       - Save report");
    println!("  DELETE /session/:id            - Close session");
    println!("  GET  /reports                  - List saved reports");
    println!("  GET  /report/latest            - Latest saved report");
    println!("  GET  /report/:name             - One saved report");
    println!("  WS   /ws/:id                   - Live updates");
    println!("  GET  /health                   - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
