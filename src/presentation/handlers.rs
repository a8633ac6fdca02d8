// HTTP request handlers
use crate::application::session_runtime::SessionSnapshot;
use crate::domain::job::JobId;
use crate::infrastructure::chunked_json::stream_from_watch;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::view::ViewModel;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current view of the session
pub async fn current_view(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.session.snapshot();
    view_response(StatusCode::OK, &snapshot, accepts_brotli(&headers)).await
}

/// Job-scoped page: follow the job named in the route
pub async fn open_job(
    Path(job_id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let job_id = match JobId::parse(job_id) {
        Ok(job_id) => job_id,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match state.session.navigate(Some(job_id)).await {
        Ok(snapshot) => view_response(StatusCode::OK, &snapshot, accepts_brotli(&headers)).await,
        Err(e) => {
            tracing::error!("Navigation failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

/// Start button: request a new job
pub async fn start_job(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    match state.session.start_job().await {
        Ok(snapshot) => {
            view_response(StatusCode::ACCEPTED, &snapshot, accepts_brotli(&headers)).await
        }
        Err(e) => {
            tracing::error!("Start request failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

/// Stream the view on every change (newline-delimited JSON)
pub async fn stream_view(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_from_watch(state.session.subscribe(), |snapshot: &SessionSnapshot| {
        ViewModel::from(snapshot)
    })
}

async fn view_response(status: StatusCode, snapshot: &SessionSnapshot, compress: bool) -> Response {
    match json_response(status, &ViewModel::from(snapshot), compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
