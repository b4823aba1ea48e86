//! HTTP presentation layer — axum handlers and router.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use nexus_common::{
    ErrorResponse, ExecutionAccepted, ExecutionRequest, ExecutionStatusResponse, HealthResponse,
};

use crate::application::dispatcher::ExecutionDispatcher;
use crate::application::ports::{CommandRunner, OverlayNetwork};
use crate::domain::DispatchError;

/// Shared handler state — the dispatcher owns everything else.
pub struct AppState<N, R> {
    pub dispatcher: ExecutionDispatcher<N, R>,
}

/// Compose the sidecar router:
/// - `POST /api/executions`     → submit, acknowledged before the command runs
/// - `GET  /api/executions/{id}` → status snapshot
/// - `GET  /health`             → readiness probe
pub fn router<N, R>(state: Arc<AppState<N, R>>) -> Router
where
    N: OverlayNetwork + 'static,
    R: CommandRunner + 'static,
{
    Router::new()
        .route("/api/executions", post(submit::<N, R>))
        .route("/api/executions/{id}", get(status::<N, R>))
        .route("/health", get(health::<N, R>))
        .with_state(state)
}

async fn submit<N, R>(
    State(state): State<Arc<AppState<N, R>>>,
    Json(request): Json<ExecutionRequest>,
) -> Response
where
    N: OverlayNetwork + 'static,
    R: CommandRunner + 'static,
{
    match state.dispatcher.dispatch(&request).await {
        Ok(execution_id) => (
            StatusCode::ACCEPTED,
            Json(ExecutionAccepted {
                execution_id,
                status: "accepted".to_string(),
                message: "execution dispatched".to_string(),
            }),
        )
            .into_response(),
        Err(error) => error_response(&error),
    }
}

async fn status<N, R>(
    State(state): State<Arc<AppState<N, R>>>,
    Path(execution_id): Path<String>,
) -> Response
where
    N: OverlayNetwork + 'static,
    R: CommandRunner + 'static,
{
    match state.dispatcher.status(&execution_id).await {
        Ok(record) => Json(ExecutionStatusResponse {
            execution_id,
            status: record.status,
            output: record.output,
            error: record.error,
        })
        .into_response(),
        Err(error) => error_response(&error),
    }
}

async fn health<N, R>(State(state): State<Arc<AppState<N, R>>>) -> Json<HealthResponse>
where
    N: OverlayNetwork + 'static,
    R: CommandRunner + 'static,
{
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tailnet_ready: state.dispatcher.network_ready(),
        message: "sidecar running".to_string(),
        time: Utc::now(),
    })
}

fn error_response(error: &DispatchError) -> Response {
    let status = match error {
        DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
        DispatchError::EmptyDevice | DispatchError::InvalidRequest => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}
