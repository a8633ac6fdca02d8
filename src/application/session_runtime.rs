// Session runtime - drives the controller on a single task and performs its effects
use crate::application::collaborators::{FeedConnector, JobLauncher};
use crate::application::session_controller::{Effect, SessionController, SessionEvent};
use crate::domain::job::{job_path, parse_job_path, JobId};
use crate::domain::session::{SessionId, SessionStatus};
use crate::domain::telemetry::{demo_series, DataPoint};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
#[error("session runtime has shut down")]
pub struct SessionClosed;

/// Everything the page needs to render, taken after each processed event.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub job_id: Option<JobId>,
    pub location: String,
    pub status: SessionStatus,
    pub min_energy: f64,
    pub demo_mode: bool,
    pub points: Arc<Vec<DataPoint>>,
}

struct Command {
    event: SessionEvent,
    reply: Option<oneshot::Sender<SessionSnapshot>>,
}

/// Cloneable front door to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Route an event to the controller and wait until it has been applied.
    pub async fn send(&self, event: SessionEvent) -> Result<SessionSnapshot, SessionClosed> {
        let (reply, done) = oneshot::channel();
        self.commands
            .send(Command {
                event,
                reply: Some(reply),
            })
            .await
            .map_err(|_| SessionClosed)?;
        done.await.map_err(|_| SessionClosed)
    }

    pub async fn start_job(&self) -> Result<SessionSnapshot, SessionClosed> {
        self.send(SessionEvent::StartRequested).await
    }

    pub async fn navigate(&self, job_id: Option<JobId>) -> Result<SessionSnapshot, SessionClosed> {
        self.send(SessionEvent::Navigated(job_id)).await
    }

    pub async fn shutdown(&self) -> Result<(), SessionClosed> {
        self.send(SessionEvent::Teardown).await.map(|_| ())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

pub struct SessionRuntime {
    controller: SessionController,
    launcher: Arc<dyn JobLauncher>,
    connector: Arc<dyn FeedConnector>,
    commands: mpsc::Receiver<Command>,
    feedback_tx: mpsc::Sender<SessionEvent>,
    feedback_rx: mpsc::Receiver<SessionEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
    feed_task: Option<JoinHandle<()>>,
    demo: Arc<Vec<DataPoint>>,
    location: String,
}

impl SessionRuntime {
    /// Mount the controller on `job_id` and start processing events.
    /// The runtime stops on `Teardown` or once every handle is dropped.
    pub fn spawn(
        controller: SessionController,
        launcher: Arc<dyn JobLauncher>,
        connector: Arc<dyn FeedConnector>,
        job_id: Option<JobId>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (commands_tx, commands) = mpsc::channel(100);
        let (feedback_tx, feedback_rx) = mpsc::channel(100);
        let demo = Arc::new(demo_series(chrono::Utc::now().timestamp_millis()));
        let location = match &job_id {
            Some(id) => job_path(id),
            None => "/".to_string(),
        };

        let initial = snapshot_of(&controller, &demo, &location);
        let (snapshots, snapshots_rx) = watch::channel(initial);

        let mut runtime = Self {
            controller,
            launcher,
            connector,
            commands,
            feedback_tx,
            feedback_rx,
            snapshots,
            feed_task: None,
            demo,
            location,
        };

        let task = tokio::spawn(async move {
            runtime.dispatch(SessionEvent::Mount(job_id));
            runtime.run().await;
        });

        let handle = SessionHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
        };
        (handle, task)
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(Command { event, reply }) = command else {
                        tracing::debug!("All session handles dropped");
                        self.dispatch(SessionEvent::Teardown);
                        break;
                    };
                    let teardown = event == SessionEvent::Teardown;
                    let snapshot = self.dispatch(event);
                    if let Some(reply) = reply {
                        let _ = reply.send(snapshot);
                    }
                    if teardown {
                        break;
                    }
                }
                Some(event) = self.feedback_rx.recv() => {
                    self.dispatch(event);
                }
            }
        }

        if let Some(task) = self.feed_task.take() {
            task.abort();
        }
        tracing::info!("Session runtime stopped");
    }

    /// Apply one event plus any navigation it triggers, then publish.
    fn dispatch(&mut self, event: SessionEvent) -> SessionSnapshot {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            for effect in self.controller.handle(event) {
                match effect {
                    Effect::Launch => self.launch(),
                    Effect::Connect { session, url } => self.connect(session, url),
                    Effect::Disconnect => self.disconnect(),
                    Effect::Navigate(path) => {
                        tracing::info!("Navigating to {}", path);
                        queue.push_back(SessionEvent::Navigated(parse_job_path(&path)));
                        self.location = path;
                    }
                }
            }
        }

        let snapshot = snapshot_of(&self.controller, &self.demo, &self.location);
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    fn launch(&self) {
        let launcher = self.launcher.clone();
        let feedback = self.feedback_tx.clone();
        tokio::spawn(async move {
            let result = launcher.launch().await;
            let _ = feedback.send(SessionEvent::LaunchCompleted(result)).await;
        });
    }

    fn connect(&mut self, session: SessionId, url: String) {
        self.disconnect();
        let connector = self.connector.clone();
        let feedback = self.feedback_tx.clone();
        self.feed_task = Some(tokio::spawn(follow_feed(connector, url, session, feedback)));
    }

    fn disconnect(&mut self) {
        if let Some(task) = self.feed_task.take() {
            task.abort();
        }
    }
}

/// Pump one feed connection into the runtime until it ends or is aborted.
async fn follow_feed(
    connector: Arc<dyn FeedConnector>,
    url: String,
    session: SessionId,
    feedback: mpsc::Sender<SessionEvent>,
) {
    let mut stream = match connector.open(&url).await {
        Ok(stream) => stream,
        Err(e) => {
            let _ = feedback.send(SessionEvent::FeedFailed(session, e)).await;
            return;
        }
    };
    if feedback.send(SessionEvent::FeedOpened(session)).await.is_err() {
        return;
    }

    while let Some(frame) = stream.next().await {
        let event = match frame {
            Ok(text) => SessionEvent::FeedMessage(session, text),
            Err(e) => {
                let _ = feedback.send(SessionEvent::FeedFailed(session, e)).await;
                return;
            }
        };
        if feedback.send(event).await.is_err() {
            return;
        }
    }

    let _ = feedback.send(SessionEvent::FeedClosed(session)).await;
}

fn snapshot_of(
    controller: &SessionController,
    demo: &Arc<Vec<DataPoint>>,
    location: &str,
) -> SessionSnapshot {
    let accumulator = controller.accumulator();
    SessionSnapshot {
        job_id: controller.job_id().cloned(),
        location: location.to_string(),
        status: controller.status().clone(),
        min_energy: accumulator.min_energy(),
        demo_mode: controller.demo_mode(),
        points: if controller.demo_mode() {
            Arc::clone(demo)
        } else {
            accumulator.points()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::collaborators::{FeedStream, LaunchError};
    use crate::domain::endpoint::FeedOrigin;
    use crate::domain::feed::FeedError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeLauncher {
        result: Result<&'static str, LaunchError>,
    }

    #[async_trait]
    impl JobLauncher for FakeLauncher {
        async fn launch(&self) -> Result<JobId, LaunchError> {
            self.result
                .clone()
                .map(|id| JobId::parse(id).expect("valid test job id"))
        }
    }

    /// Scripted frames per feed URL. `hold_open` keeps the connection alive
    /// after the script instead of closing it.
    #[derive(Default)]
    struct FakeConnector {
        scripts: Mutex<HashMap<String, Vec<Result<String, FeedError>>>>,
        opened: Mutex<Vec<String>>,
        opens: AtomicUsize,
        hold_open: bool,
    }

    impl FakeConnector {
        fn script(self, url: &str, frames: Vec<Result<String, FeedError>>) -> Self {
            self.scripts.lock().unwrap().insert(url.to_string(), frames);
            self
        }
    }

    #[async_trait]
    impl FeedConnector for FakeConnector {
        async fn open(&self, url: &str) -> Result<FeedStream, FeedError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            self.opened.lock().unwrap().push(url.to_string());
            let frames = self.scripts.lock().unwrap().remove(url).unwrap_or_default();
            let stream = futures::stream::iter(frames);
            if self.hold_open {
                Ok(stream.chain(futures::stream::pending()).boxed())
            } else {
                Ok(stream.boxed())
            }
        }
    }

    fn origin() -> FeedOrigin {
        FeedOrigin::parse("http://localhost:8000").unwrap()
    }

    fn launcher(id: &'static str) -> Arc<dyn JobLauncher> {
        Arc::new(FakeLauncher { result: Ok(id) })
    }

    fn text(frame: &str) -> Result<String, FeedError> {
        Ok(frame.to_string())
    }

    async fn wait_until(
        handle: &SessionHandle,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        let mut rx = handle.subscribe();
        let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for session")
            .expect("runtime gone");
        snapshot.clone()
    }

    #[tokio::test]
    async fn test_no_job_means_no_connection() {
        let connector = Arc::new(FakeConnector::default());
        let (handle, _task) = SessionRuntime::spawn(
            SessionController::new(origin()),
            launcher("unused"),
            connector.clone(),
            None,
        );

        let snapshot = wait_until(&handle, |s| s.status.is_active()).await;
        assert!(snapshot.demo_mode);
        assert_eq!(snapshot.points.len(), 101);
        assert_eq!(snapshot.location, "/");

        handle.navigate(None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(connector.opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_job_navigates_and_streams() {
        let url = "ws://localhost:8000/ws/process/abc123/";
        let connector = Arc::new(
            FakeConnector::default().script(
                url,
                vec![
                    text(r#"{"type":"start"}"#),
                    text(r#"{"type":"solution","date":1000,"energy":"-1.5"}"#),
                    text(r#"{"type":"solution","date":1000,"energy":"-2.5"}"#),
                    text(r#"{"type":"stop","reason":"converged"}"#),
                ],
            ),
        );
        let (handle, _task) = SessionRuntime::spawn(
            SessionController::new(origin()),
            launcher("abc123"),
            connector.clone(),
            None,
        );

        let snapshot = handle.start_job().await.unwrap();
        assert_eq!(snapshot.status, SessionStatus::Waiting);

        let snapshot = wait_until(&handle, |s| s.status.stop_reason().is_some()).await;
        assert_eq!(snapshot.location, "/job/abc123/");
        assert_eq!(snapshot.job_id, Some(JobId::parse("abc123").unwrap()));
        assert_eq!(snapshot.status.stop_reason(), Some("converged"));
        assert!(!snapshot.demo_mode);
        let timestamps: Vec<i64> = snapshot.points.iter().map(|p| p.timestamp).collect();
        assert_eq!(timestamps, vec![1000, 1001]);
        assert_eq!(snapshot.min_energy, -2.5);

        // The server closing after stop does not trigger a reconnect
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(connector.opened.lock().unwrap().as_slice(), [url.to_string()]);
    }

    #[tokio::test]
    async fn test_launch_failure_surfaces_error() {
        let connector = Arc::new(FakeConnector::default());
        let (handle, _task) = SessionRuntime::spawn(
            SessionController::new(origin()),
            Arc::new(FakeLauncher {
                result: Err(LaunchError::Status(503)),
            }),
            connector.clone(),
            None,
        );

        handle.start_job().await.unwrap();
        let snapshot = wait_until(&handle, |s| s.status.error().is_some()).await;
        assert_eq!(
            snapshot.status.error(),
            Some("job launch service answered with status 503")
        );
        assert_eq!(connector.opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal() {
        let url = "ws://localhost:8000/ws/process/abc123/";
        let connector = Arc::new(
            FakeConnector::default().script(
                url,
                vec![
                    text(r#"{"type":"solution","date":1,"energy":"-1"}"#),
                    Err(FeedError::Transport("connection reset".to_string())),
                ],
            ),
        );
        let (handle, _task) = SessionRuntime::spawn(
            SessionController::new(origin()),
            launcher("unused"),
            connector.clone(),
            Some(JobId::parse("abc123").unwrap()),
        );

        let snapshot = wait_until(&handle, |s| s.status.is_active()).await;
        assert_eq!(snapshot.status.error(), Some("connection error: connection reset"));
        assert_eq!(snapshot.points.len(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(connector.opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_new_job_after_stop_opens_fresh_connection() {
        let first = "ws://localhost:8000/ws/process/first/";
        let second = "ws://localhost:8000/ws/process/second/";
        let connector = Arc::new(FakeConnector {
            hold_open: true,
            ..FakeConnector::default()
        }
        .script(first, vec![text(r#"{"type":"stop","reason":"converged"}"#)])
        .script(second, vec![text(r#"{"type":"solution","date":5,"energy":-4}"#)]));

        let (handle, _task) = SessionRuntime::spawn(
            SessionController::new(origin()),
            launcher("unused"),
            connector.clone(),
            Some(JobId::parse("first").unwrap()),
        );
        wait_until(&handle, |s| s.status.stop_reason() == Some("converged")).await;

        handle
            .navigate(Some(JobId::parse("second").unwrap()))
            .await
            .unwrap();
        let snapshot = wait_until(&handle, |s| s.status == SessionStatus::Running).await;
        assert_eq!(snapshot.min_energy, -4.0);
        assert_eq!(
            connector.opened.lock().unwrap().as_slice(),
            [first.to_string(), second.to_string()]
        );
    }

    #[tokio::test]
    async fn test_shutdown_stops_runtime() {
        let connector = Arc::new(FakeConnector {
            hold_open: true,
            ..FakeConnector::default()
        });
        let (handle, task) = SessionRuntime::spawn(
            SessionController::new(origin()),
            launcher("unused"),
            connector,
            Some(JobId::parse("abc123").unwrap()),
        );

        handle.shutdown().await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("runtime did not stop")
            .unwrap();
        assert!(handle.start_job().await.is_err());
    }
}
