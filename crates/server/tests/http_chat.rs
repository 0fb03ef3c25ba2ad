//! End-to-end HTTP tests against an in-memory router

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use habla_agent::ControlEngine;
use habla_config::{ControlConfig, DictionarySource, MatcherConfig, Settings};
use habla_dictionary::{DictionaryStore, Matcher};
use habla_server::{create_router, AppState};
use habla_text_processing::{Normalizer, SpanishAnalyzer};

const DICTIONARY: &str = r#"
slots:
  - name: fecha
    kind: date
    prompt: "¿Para qué día?"
intents:
  - name: reservar
    required_slots: [fecha]
    confirmation: "Reserva hecha para el {fecha}."
  - name: despedida
    ends_conversation: true
entries:
  - pattern: ["hola"]
    responses: ["¡Hola! ¿En qué puedo ayudarte?"]
  - pattern: ["querer", "reservar"]
    intent: reservar
  - pattern: ["adiós"]
    intent: despedida
    responses: ["¡Hasta luego!"]
"#;

fn app_with(control: ControlConfig) -> Router {
    let source = DictionarySource::from_yaml(DICTIONARY).unwrap();
    let engine = ControlEngine::new(
        Normalizer::new(Arc::new(SpanishAnalyzer::new().unwrap()), 500),
        Arc::new(DictionaryStore::load(&source).unwrap()),
        Matcher::new(MatcherConfig::default()),
        control,
    );
    create_router(AppState::new(Settings::default(), Arc::new(engine)))
}

fn app() -> Router {
    app_with(ControlConfig {
        fallback_response: "No te he entendido.".to_string(),
        ..ControlConfig::default()
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn chat(app: &Router, session: &str, message: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/chat/{}", session))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "message": message }).to_string(),
        ))
        .unwrap();
    send(app, request).await
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = app();

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"], 3);
}

#[tokio::test]
async fn test_chat_slot_filling_flow() {
    let app = app();

    let (status, body) = chat(&app, "s1", "Hola").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "¡Hola! ¿En qué puedo ayudarte?");
    assert_eq!(body["state"]["state"], "idle");
    assert_eq!(body["turn_count"], 1);

    let (_, body) = chat(&app, "s1", "quiero reservar").await;
    assert_eq!(body["response"], "¿Para qué día?");
    assert_eq!(body["state"]["state"], "awaiting_slot");
    assert_eq!(body["state"]["slot"], "fecha");
    assert_eq!(body["kind"], "slot_requested");

    let (_, body) = chat(&app, "s1", "el lunes").await;
    assert_eq!(body["response"], "Reserva hecha para el lunes.");
    assert_eq!(body["state"]["state"], "idle");
    assert_eq!(body["intent"], "reservar");
}

#[tokio::test]
async fn test_chat_fallback_and_closed() {
    let app = app();

    let (_, body) = chat(&app, "s2", "xyzzy plugh").await;
    assert_eq!(body["response"], "No te he entendido.");
    assert_eq!(body["kind"], "fallback");

    let (_, body) = chat(&app, "s2", "adiós").await;
    assert_eq!(body["response"], "¡Hasta luego!");
    assert_eq!(body["state"]["state"], "closed");

    let (_, body) = chat(&app, "s2", "hola").await;
    assert_eq!(body["response"], ControlConfig::default().closed_response);
    assert_eq!(body["state"]["state"], "closed");
}

#[tokio::test]
async fn test_chat_empty_message_is_invalid_input() {
    let app = app();

    let (status, body) = chat(&app, "s3", "   ").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "No te he entendido.");
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = app();

    let create = Request::builder()
        .method("POST")
        .uri("/api/sessions")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, create).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["session_id"].as_str().unwrap().to_string();

    chat(&app, &id, "quiero reservar").await;

    let (status, body) = send(&app, get(&format!("/api/sessions/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["turn_count"], 1);
    assert_eq!(body["state"]["state"], "awaiting_slot");

    let (_, body) = send(&app, get("/api/sessions")).await;
    assert_eq!(body["count"], 1);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/sessions/{}", id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, get(&format!("/api/sessions/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&id));
}

#[tokio::test]
async fn test_session_limit_is_service_unavailable() {
    let app = app_with(ControlConfig {
        max_sessions: 1,
        ..ControlConfig::default()
    });

    let (status, _) = chat(&app, "a", "hola").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = chat(&app, "b", "hola").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Session limit reached");
}

#[tokio::test]
async fn test_metrics_disabled_without_recorder() {
    let app = app();
    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_chat_reports_score() {
    let app = app();

    let (_, body) = chat(&app, "s4", "quiero reservar").await;
    assert_eq!(body["score"], 20);

    let (_, body) = chat(&app, "s5", "xyzzy plugh").await;
    assert_eq!(body["score"], 0);
}

#[tokio::test]
async fn test_feedback_flow() {
    let app = app();
    chat(&app, "s6", "hola").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/sessions/s6/feedback",
            serde_json::json!({ "satisfied": false, "comment": "No era eso" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["turn"], 1);
    assert_eq!(body["user"], "hola");

    send(
        &app,
        post_json("/api/sessions/s6/feedback", serde_json::json!({ "satisfied": true })),
    )
    .await;

    let (status, body) = send(&app, get("/api/sessions/s6/feedback")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["satisfaction_rate"], 50.0);
    assert_eq!(body["negative_comments"][0]["comment"], "No era eso");

    let (_, body) = send(&app, get("/api/feedback")).await;
    assert_eq!(body["negative_sessions"], serde_json::json!(["s6"]));

    let (_, body) = send(&app, get("/api/stats")).await;
    assert_eq!(body["sessions"]["sessions"], 1);
    assert_eq!(body["sessions"]["total_turns"], 1);
    assert_eq!(body["sessions"]["feedback_negative"], 1);
    assert_eq!(body["dictionary"]["entries"], 3);
}

#[tokio::test]
async fn test_feedback_for_unknown_session() {
    let app = app();
    let (status, _) = send(
        &app,
        post_json("/api/sessions/nobody/feedback", serde_json::json!({ "satisfied": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn with_origin(origin: &str) -> Request<Body> {
    Request::builder()
        .uri("/health")
        .header("origin", origin)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_cors_only_allows_configured_origins() {
    let app = app();
    let allowed = app.clone().oneshot(with_origin("http://localhost:3000")).await.unwrap();
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );

    let other = app.oneshot(with_origin("https://evil.example")).await.unwrap();
    assert!(!other.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_disabled_cors_allows_no_origin() {
    let mut settings = Settings::default();
    settings.server.cors_enabled = false;
    let source = DictionarySource::from_yaml(DICTIONARY).unwrap();
    let engine = ControlEngine::new(
        Normalizer::new(Arc::new(SpanishAnalyzer::new().unwrap()), 500),
        Arc::new(DictionaryStore::load(&source).unwrap()),
        Matcher::new(MatcherConfig::default()),
        ControlConfig::default(),
    );
    let app = create_router(AppState::new(settings, Arc::new(engine)));

    let response = app.oneshot(with_origin("https://evil.example")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}
