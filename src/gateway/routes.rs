//! Axum routes over a shared scheduler handle.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use super::TaskBatch;
use crate::core::{Scheduler, SchedulerError, StatusSnapshot, TaskExecutor};
use crate::runtime::Spawn;

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Build the application router. The scheduler is injected as router state.
pub fn router<E, S>(scheduler: Scheduler<E, S>) -> Router
where
    E: TaskExecutor,
    S: Spawn + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/queue/status", get(queue_status::<E, S>))
        .route("/queue/tasks", post(queue_tasks::<E, S>))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(scheduler)
}

async fn health() -> Json<Health> {
    Json(Health { ok: true })
}

async fn queue_status<E, S>(State(scheduler): State<Scheduler<E, S>>) -> Json<StatusSnapshot>
where
    E: TaskExecutor,
    S: Spawn + Clone + Send + Sync + 'static,
{
    Json(scheduler.status())
}

async fn queue_tasks<E, S>(
    State(scheduler): State<Scheduler<E, S>>,
    body: Bytes,
) -> Result<&'static str, SchedulerError>
where
    E: TaskExecutor,
    S: Spawn + Clone + Send + Sync + 'static,
{
    let batch = TaskBatch::parse(&body)?;
    let receipts = scheduler.append_batch(batch.into_tasks());
    tracing::debug!(submitted = receipts.len(), "batch accepted");
    Ok("ok")
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

impl IntoResponse for SchedulerError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::MalformedBatch(_) | Self::InvalidDuration { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(%status, error = %self, "request rejected");
        (status, format!("nok: {self}")).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_bad_request() {
        let malformed = SchedulerError::MalformedBatch("expected value".into());
        assert_eq!(malformed.into_response().status(), StatusCode::BAD_REQUEST);

        let invalid = SchedulerError::InvalidDuration {
            key: "a".into(),
            reason: "must be non-negative".into(),
        };
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn config_error_maps_to_server_error() {
        let err = SchedulerError::InvalidConfig("max_concurrency must be at least 1".into());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
