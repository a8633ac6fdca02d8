// Job launch service client
use crate::application::collaborators::{JobLauncher, LaunchError};
use crate::domain::job::JobId;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct HttpJobLauncher {
    client: reqwest::Client,
    start_url: String,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    #[serde(default)]
    job_id: Option<String>,
}

impl HttpJobLauncher {
    pub fn new(start_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            start_url,
        }
    }
}

#[async_trait]
impl JobLauncher for HttpJobLauncher {
    async fn launch(&self) -> Result<JobId, LaunchError> {
        let response = self
            .client
            .get(&self.start_url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| LaunchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Job launch failed with status {}: {}", status, body);
            return Err(LaunchError::Status(status.as_u16()));
        }

        let body = response
            .json::<StartResponse>()
            .await
            .map_err(|e| LaunchError::InvalidBody(e.to_string()))?;

        let job_id = body
            .job_id
            .ok_or_else(|| LaunchError::InvalidBody("missing job_id".to_string()))?;

        JobId::parse(job_id).map_err(|e| LaunchError::InvalidBody(e.to_string()))
    }
}
