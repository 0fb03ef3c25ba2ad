//! HTTP endpoints
//!
//! REST API for sessions and chat turns.

use std::time::{Duration, Instant};

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use habla_agent::{DialogueState, TurnKind};

use crate::metrics::{metrics_handler, record_feedback, record_sessions, record_turn};
use crate::state::AppState;
use crate::ServerError;

const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(
        &state.config.server.cors_origins,
        state.config.server.cors_enabled,
    );
    let timeout = Duration::from_secs(state.config.server.timeout_seconds);

    Router::new()
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route(
            "/api/sessions/:id/feedback",
            post(submit_feedback).get(session_feedback),
        )
        .route("/api/feedback", get(feedback_report))
        .route("/api/stats", get(stats))
        .route("/api/chat/:session_id", post(chat))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::info!("CORS is disabled - cross-origin requests are not allowed");
        return CorsLayer::new();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    let parsed_origins = if parsed_origins.is_empty() {
        if !origins.is_empty() {
            tracing::error!("All configured CORS origins are invalid, falling back to localhost");
        } else {
            tracing::info!("No CORS origins configured, defaulting to {}", DEFAULT_ORIGIN);
        }
        vec![HeaderValue::from_static(DEFAULT_ORIGIN)]
    } else {
        tracing::info!("CORS configured with {} origins", parsed_origins.len());
        parsed_origins
    };

    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Create a new session
async fn create_session(State(state): State<AppState>) -> Result<impl IntoResponse, ServerError> {
    let session = state.engine.sessions().create()?;
    record_sessions(state.engine.sessions().count());

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "session_id": session.id,
            "state": session.lock().dialogue.name(),
        })),
    ))
}

/// List active sessions
async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.engine.sessions().list();

    Json(serde_json::json!({
        "count": sessions.len(),
        "sessions": sessions,
    }))
}

/// Get session info
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let session = state
        .engine
        .sessions()
        .get(&id)
        .ok_or(ServerError::SessionNotFound(id))?;

    Ok(Json(session.snapshot()))
}

/// Delete a session
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    if !state.engine.sessions().remove(&id) {
        return Err(ServerError::SessionNotFound(id));
    }
    record_sessions(state.engine.sessions().count());
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub response: String,
    pub state: DialogueState,
    pub intent: Option<String>,
    /// Match score; the best rejected score when nothing matched
    pub score: u32,
    pub kind: TurnKind,
    pub turn_count: u64,
}

/// Process one user turn
///
/// Unknown session ids start a new conversation.
async fn chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
    let started = Instant::now();
    let outcome = state.engine.handle_turn(&session_id, &request.message)?;
    record_turn(outcome.kind, started.elapsed());
    record_sessions(state.engine.sessions().count());

    Ok(Json(ChatResponse {
        session_id,
        response: outcome.response,
        state: outcome.state,
        intent: outcome.intent,
        score: outcome.score,
        kind: outcome.kind,
        turn_count: outcome.turn_count,
    }))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub satisfied: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Record feedback on the latest response of a session
async fn submit_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let feedback = state
        .engine
        .record_feedback(&id, request.satisfied, request.comment)?;
    record_feedback(feedback.satisfied);

    Ok((StatusCode::CREATED, Json(feedback)))
}

/// Feedback summary of one session
async fn session_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let session = state
        .engine
        .sessions()
        .get(&id)
        .ok_or(ServerError::SessionNotFound(id))?;
    let summary = session.lock().feedback.summary();
    Ok(Json(summary))
}

/// Feedback across sessions, with the sessions that got negative feedback
async fn feedback_report(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.sessions().feedback_report())
}

/// Usage report
async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "sessions": state.engine.sessions().stats(),
        "dictionary": {
            "entries": state.engine.store().len(),
            "intents": state.engine.store().intents().count(),
        },
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

/// Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let entries = state.engine.store().len();
    let ready = entries > 0;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "entries": entries,
            "sessions": state.engine.sessions().count(),
        })),
    )
}
