//! `GET /health`: liveness plus the state of each dependency.

use std::time::Instant;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::api::dto::health::{ComponentCheck, HealthChecks, HealthResponse, ServiceStatus};
use crate::state::AppState;

/// 200 when every check passes, 503 with the same body otherwise.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let checks = HealthChecks {
        database: database(&state).await,
        view_queue: view_queue(&state),
        cache: cache(&state).await,
    };

    let status = checks.status();
    let code = match status {
        ServiceStatus::Healthy => StatusCode::OK,
        ServiceStatus::Degraded => {
            tracing::warn!(?checks, "Health check degraded");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        auth: state.identity.name(),
        checks,
    };
    (code, Json(body))
}

async fn database(state: &AppState) -> ComponentCheck {
    let started = Instant::now();
    let check = match state.smartlink_service.ping().await {
        Ok(()) => ComponentCheck::ok("reachable"),
        Err(e) => ComponentCheck::error(e.to_string()),
    };
    check.timed(started.elapsed().as_millis() as u64)
}

fn view_queue(state: &AppState) -> ComponentCheck {
    let tx = &state.view_sender;
    if tx.is_closed() {
        return ComponentCheck::error("view worker stopped");
    }
    let pending = tx.max_capacity() - tx.capacity();
    ComponentCheck::ok(format!("{} of {} slots in use", pending, tx.max_capacity()))
}

async fn cache(state: &AppState) -> ComponentCheck {
    let backend = state.cache.backend();
    let started = Instant::now();
    let check = match state.cache.ping().await {
        Ok(()) => ComponentCheck::ok(backend),
        Err(e) => ComponentCheck::error(format!("{}: {}", backend, e)),
    };
    check.timed(started.elapsed().as_millis() as u64)
}
