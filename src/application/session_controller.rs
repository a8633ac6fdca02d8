// Streaming session controller - job lifecycle as a pure state machine
use crate::application::collaborators::LaunchError;
use crate::domain::accumulator::SolutionAccumulator;
use crate::domain::endpoint::FeedOrigin;
use crate::domain::feed::{parse_solution, FeedError, FeedMessage};
use crate::domain::job::{job_path, JobId};
use crate::domain::session::{SessionId, SessionStatus};

const CLOSED_EARLY: &str = "connection closed before the job finished";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The page came up, with or without a job in its route
    Mount(Option<JobId>),
    StartRequested,
    LaunchCompleted(Result<JobId, LaunchError>),
    /// The router observed a (possibly new) job id
    Navigated(Option<JobId>),
    FeedOpened(SessionId),
    FeedMessage(SessionId, String),
    FeedFailed(SessionId, FeedError),
    FeedClosed(SessionId),
    Teardown,
}

/// Side effects the controller asks its runtime to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Launch,
    Connect { session: SessionId, url: String },
    Disconnect,
    Navigate(String),
}

pub struct SessionController {
    origin: FeedOrigin,
    status: SessionStatus,
    job_id: Option<JobId>,
    target: Option<String>,
    session: Option<SessionId>,
    next_session: u64,
    accumulator: SolutionAccumulator,
    demo_mode: bool,
}

impl SessionController {
    pub fn new(origin: FeedOrigin) -> Self {
        Self {
            origin,
            status: SessionStatus::Idle,
            job_id: None,
            target: None,
            session: None,
            next_session: 0,
            accumulator: SolutionAccumulator::new(),
            demo_mode: true,
        }
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub fn accumulator(&self) -> &SolutionAccumulator {
        &self.accumulator
    }

    pub fn demo_mode(&self) -> bool {
        self.demo_mode
    }

    /// Id of the connection currently considered live, if any
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Mount(None) => {
                tracing::info!("Mounted without a job");
                self.status = SessionStatus::stopped(None);
                Vec::new()
            }
            SessionEvent::Mount(Some(job_id)) | SessionEvent::Navigated(Some(job_id)) => {
                self.follow(job_id)
            }
            SessionEvent::Navigated(None) => Vec::new(),
            SessionEvent::StartRequested => self.request_start(),
            SessionEvent::LaunchCompleted(result) => self.launch_completed(result),
            SessionEvent::FeedOpened(session) => {
                if self.is_current(session) {
                    tracing::info!("Feed {:?} opened for job {:?}", session, self.job_id);
                    self.accumulator.reset();
                    self.demo_mode = false;
                }
                Vec::new()
            }
            SessionEvent::FeedMessage(session, text) => {
                if !self.is_current(session) || self.status.is_active() {
                    tracing::debug!("Dropping message for finished feed {:?}", session);
                    return Vec::new();
                }
                self.on_message(&text)
            }
            SessionEvent::FeedFailed(session, error) => {
                if !self.is_current(session) {
                    return Vec::new();
                }
                tracing::warn!("Feed {:?} failed: {}", session, error);
                self.terminate(SessionStatus::failed(error.to_string()))
            }
            SessionEvent::FeedClosed(session) => {
                if !self.is_current(session) {
                    return Vec::new();
                }
                self.session = None;
                if !self.status.is_active() {
                    tracing::warn!("Feed {:?} closed without a stop event", session);
                    let error = FeedError::Transport(CLOSED_EARLY.to_string());
                    self.status = SessionStatus::failed(error.to_string());
                }
                Vec::new()
            }
            SessionEvent::Teardown => match self.session.take() {
                Some(_) => vec![Effect::Disconnect],
                None => Vec::new(),
            },
        }
    }

    fn is_current(&self, session: SessionId) -> bool {
        self.session == Some(session)
    }

    fn follow(&mut self, job_id: JobId) -> Vec<Effect> {
        let Some(url) = self.origin.feed_url(Some(&job_id)) else {
            return Vec::new();
        };
        if self.target.as_deref() == Some(url.as_str()) {
            return Vec::new();
        }

        let mut effects = Vec::new();
        if self.session.take().is_some() {
            effects.push(Effect::Disconnect);
        }

        self.next_session += 1;
        let session = SessionId(self.next_session);
        tracing::info!("Following job {} on {} as {:?}", job_id, url, session);

        self.accumulator.reset();
        if self.status != SessionStatus::Waiting {
            self.status = SessionStatus::Loading;
        }
        self.job_id = Some(job_id);
        self.target = Some(url.clone());
        self.session = Some(session);

        effects.push(Effect::Connect { session, url });
        effects
    }

    fn request_start(&mut self) -> Vec<Effect> {
        match self.status {
            SessionStatus::Idle | SessionStatus::Active { .. } => {
                tracing::info!("Requesting a new job");
                self.status = SessionStatus::Waiting;
                vec![Effect::Launch]
            }
            _ => {
                tracing::warn!("Ignoring start request while {}", self.status.name());
                Vec::new()
            }
        }
    }

    fn launch_completed(&mut self, result: Result<JobId, LaunchError>) -> Vec<Effect> {
        if self.status != SessionStatus::Waiting {
            tracing::warn!("Ignoring launch result while {}: {:?}", self.status.name(), result);
            return Vec::new();
        }
        match result {
            Ok(job_id) => {
                tracing::info!("Job {} scheduled", job_id);
                self.accumulator.reset();
                // Already following the launched job: force a fresh connection
                if self.origin.feed_url(Some(&job_id)) == self.target {
                    self.target = None;
                }
                vec![Effect::Navigate(job_path(&job_id))]
            }
            Err(error) => {
                tracing::warn!("Job launch failed: {}", error);
                self.status = SessionStatus::failed(error.to_string());
                Vec::new()
            }
        }
    }

    fn on_message(&mut self, text: &str) -> Vec<Effect> {
        let message = match FeedMessage::decode(text) {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!("Undecodable feed message {:?}: {}", text, error);
                return self.terminate(SessionStatus::failed(error.to_string()));
            }
        };

        match message {
            FeedMessage::Start => {
                if matches!(self.status, SessionStatus::Waiting | SessionStatus::Loading) {
                    self.status = SessionStatus::Running;
                }
                Vec::new()
            }
            FeedMessage::Solution { date, energy } => {
                let ingested = parse_solution(&date, &energy).and_then(|solution| {
                    tracing::debug!(
                        "Solution at {} with energy {}",
                        solution.timestamp_ms,
                        solution.energy
                    );
                    self.accumulator.ingest(solution.timestamp_ms, solution.energy)
                });
                match ingested {
                    Ok(()) => {
                        self.status = SessionStatus::Running;
                        Vec::new()
                    }
                    Err(error) => {
                        tracing::warn!("Unusable solution {:?}: {}", text, error);
                        self.terminate(SessionStatus::failed(error.to_string()))
                    }
                }
            }
            FeedMessage::Stop { reason } => {
                tracing::info!("Job {:?} stopped: {:?}", self.job_id, reason);
                self.terminate(SessionStatus::stopped(reason))
            }
            FeedMessage::Unknown => {
                tracing::debug!("Ignoring feed message {:?}", text);
                Vec::new()
            }
        }
    }

    /// Enter the terminal status and release the connection. The session
    /// is never reconnected; only a new job start or navigation opens a feed.
    fn terminate(&mut self, status: SessionStatus) -> Vec<Effect> {
        self.status = status;
        match self.session.take() {
            Some(_) => vec![Effect::Disconnect],
            None => Vec::new(),
        }
    }
}
