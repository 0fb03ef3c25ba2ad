//! Prometheus metrics

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use habla_agent::TurnKind;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

/// Install the global Prometheus recorder
///
/// Returns `None` if a recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            metrics::describe_counter!("habla_turns_total", "Turns processed, by outcome");
            metrics::describe_histogram!(
                "habla_turn_latency_seconds",
                "Time spent processing one turn"
            );
            metrics::describe_gauge!("habla_sessions_active", "Sessions held in memory");
            metrics::describe_counter!("habla_feedback_total", "User feedback, by verdict");
            Some(handle)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install metrics recorder");
            None
        }
    }
}

pub fn record_turn(kind: TurnKind, latency: Duration) {
    metrics::counter!("habla_turns_total", "kind" => kind.as_str()).increment(1);
    metrics::histogram!("habla_turn_latency_seconds").record(latency.as_secs_f64());
}

pub fn record_feedback(satisfied: bool) {
    let verdict = if satisfied { "positive" } else { "negative" };
    metrics::counter!("habla_feedback_total", "verdict" => verdict).increment(1);
}

pub fn record_sessions(count: usize) {
    metrics::gauge!("habla_sessions_active").set(count as f64);
}

/// `GET /metrics`
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}
