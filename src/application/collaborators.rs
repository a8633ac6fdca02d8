// Collaborator traits for the job launch service and the streaming feed
use crate::domain::feed::FeedError;
use crate::domain::job::JobId;
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LaunchError {
    #[error("could not reach job launch service: {0}")]
    Request(String),
    #[error("job launch service answered with status {0}")]
    Status(u16),
    #[error("invalid server response: {0}")]
    InvalidBody(String),
}

/// Raw text frames of one feed connection. The stream ends when the
/// server closes the connection.
pub type FeedStream = BoxStream<'static, Result<String, FeedError>>;

#[async_trait]
pub trait JobLauncher: Send + Sync {
    /// Ask the server to schedule a new job
    async fn launch(&self) -> Result<JobId, LaunchError>;
}

#[async_trait]
pub trait FeedConnector: Send + Sync {
    /// Open the feed at `url`; resolves once the connection is established.
    async fn open(&self, url: &str) -> Result<FeedStream, FeedError>;
}
