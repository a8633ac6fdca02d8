// Job identity and the routes derived from it
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum JobIdError {
    #[error("job id must not be empty")]
    Empty,
    #[error("job id must not contain '/' or whitespace: {0:?}")]
    Malformed(String),
}

/// Opaque server-issued job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, JobIdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(JobIdError::Empty);
        }
        // A job id is a single path segment in both the page route and the feed address
        if raw.contains('/') || raw.chars().any(char::is_whitespace) {
            return Err(JobIdError::Malformed(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Page route for a job: `/job/<id>/`
pub fn job_path(job_id: &JobId) -> String {
    format!("/job/{}/", urlencoding::encode(job_id.as_str()))
}

/// Extract the job id from a job-scoped page route.
/// Returns `None` for any other path.
pub fn parse_job_path(path: &str) -> Option<JobId> {
    let segment = path.strip_prefix("/job/")?;
    let segment = segment.strip_suffix('/').unwrap_or(segment);
    let decoded = urlencoding::decode(segment).ok()?;
    JobId::parse(decoded.into_owned()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_empty_and_multi_segment() {
        assert_eq!(JobId::parse(""), Err(JobIdError::Empty));
        assert!(matches!(JobId::parse("a/b"), Err(JobIdError::Malformed(_))));
        assert!(matches!(JobId::parse("a b"), Err(JobIdError::Malformed(_))));
        assert_eq!(JobId::parse("abc123").unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_job_path_roundtrip() {
        let id = JobId::parse("5f0c-11aa").unwrap();
        assert_eq!(job_path(&id), "/job/5f0c-11aa/");
        assert_eq!(parse_job_path("/job/5f0c-11aa/"), Some(id.clone()));
        assert_eq!(parse_job_path("/job/5f0c-11aa"), Some(id));
    }

    #[test]
    fn test_parse_job_path_other_routes() {
        assert_eq!(parse_job_path("/"), None);
        assert_eq!(parse_job_path("/job//"), None);
        assert_eq!(parse_job_path("/jobs/abc/"), None);
    }
}
