// Session URL resolution: job id -> streaming feed address
use super::job::JobId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum OriginError {
    #[error("origin must start with http:// or https://: {0}")]
    Scheme(String),
    #[error("origin has no host: {0}")]
    MissingHost(String),
}

/// Where the page was served from. Both the launch call and the feed live there.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOrigin {
    pub secure: bool,
    pub host: String,
}

impl FeedOrigin {
    pub fn parse(origin: &str) -> Result<Self, OriginError> {
        let (secure, rest) = if let Some(rest) = origin.strip_prefix("https://") {
            (true, rest)
        } else if let Some(rest) = origin.strip_prefix("http://") {
            (false, rest)
        } else {
            return Err(OriginError::Scheme(origin.to_string()));
        };

        let host = rest.trim_end_matches('/');
        if host.is_empty() || host.contains('/') {
            return Err(OriginError::MissingHost(origin.to_string()));
        }

        Ok(Self {
            secure,
            host: host.to_string(),
        })
    }

    fn ws_scheme(&self) -> &'static str {
        if self.secure { "wss" } else { "ws" }
    }

    fn http_scheme(&self) -> &'static str {
        if self.secure { "https" } else { "http" }
    }

    /// Absolute HTTP URL for a path on this origin
    pub fn http_url(&self, path: &str) -> String {
        format!("{}://{}{}", self.http_scheme(), self.host, path)
    }

    /// Feed address for a job, or `None` when there is no job to follow.
    pub fn feed_url(&self, job_id: Option<&JobId>) -> Option<String> {
        let job_id = job_id?;
        Some(format!(
            "{}://{}/ws/process/{}/",
            self.ws_scheme(),
            self.host,
            urlencoding::encode(job_id.as_str())
        ))
    }
}
