// Session status model
use serde::Serialize;

/// Identifies one feed connection. Every connect gets a fresh id so events
/// of a replaced connection can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SessionStatus {
    /// Nothing mounted yet
    Idle,
    /// Connecting to a job's feed, nothing received yet
    Loading,
    /// A job start was requested or its feed has not produced data yet
    Waiting,
    /// The job is producing solutions
    Running,
    /// Terminal for the current session
    Active {
        stop_reason: Option<String>,
        error: Option<String>,
    },
}

impl SessionStatus {
    pub fn stopped(reason: Option<String>) -> Self {
        SessionStatus::Active {
            stop_reason: reason.filter(|r| !r.is_empty()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        SessionStatus::Active {
            stop_reason: None,
            error: Some(error.into()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Active { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Loading => "loading",
            SessionStatus::Waiting => "waiting",
            SessionStatus::Running => "running",
            SessionStatus::Active { .. } => "active",
        }
    }

    pub fn stop_reason(&self) -> Option<&str> {
        match self {
            SessionStatus::Active { stop_reason, .. } => stop_reason.as_deref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SessionStatus::Active { error, .. } => error.as_deref(),
            _ => None,
        }
    }
}
