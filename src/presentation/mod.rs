// Presentation layer - HTTP surface and view model
pub mod app_state;
pub mod handlers;
pub mod view;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    current_view, health_check, open_job, start_job, stream_view,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/", get(current_view))
        .route("/job/:job_id/", get(open_job))
        .route("/api/jobs", post(start_job))
        .route("/api/view/stream", get(stream_view))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
