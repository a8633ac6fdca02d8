// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::session_controller::SessionController;
use crate::application::session_runtime::SessionRuntime;
use crate::domain::endpoint::FeedOrigin;
use crate::infrastructure::config::load_monitor_config;
use crate::infrastructure::http_launcher::HttpJobLauncher;
use crate::infrastructure::ws_feed::WebSocketConnector;
use crate::presentation::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_monitor_config()?;
    let origin = FeedOrigin::parse(&config.feed.origin)?;

    // Collaborators (infrastructure layer)
    let launcher = Arc::new(HttpJobLauncher::new(origin.http_url(&config.launch.path)));
    let connector = Arc::new(WebSocketConnector::new());

    // Session (application layer); nothing to follow until a job route is opened
    let (session, runtime) = SessionRuntime::spawn(
        SessionController::new(origin),
        launcher,
        connector,
        None,
    );

    let shutdown_session = session.clone();
    let state = Arc::new(AppState { session });
    let router = presentation::router(state);

    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting evolution monitor on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            // Ends open view streams and releases the feed connection
            if let Err(e) = shutdown_session.shutdown().await {
                tracing::warn!("Session already stopped: {}", e);
            }
        })
        .await?;

    runtime.await?;

    Ok(())
}
