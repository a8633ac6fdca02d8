// Status projection - what the page shows under the chart
use crate::domain::session::SessionStatus;

pub const WAITING_TEXT: &str = "Waiting for a worker to pickup your task.";
pub const RUNNING_TEXT: &str = "Worker is running your task at the moment.";

/// Status line for `status`. An error always wins. `Idle`, `Loading` and an
/// `Active` session without a stop reason render blank: the start button is
/// the prompt, so the line stays empty instead of repeating it.
pub fn status_text(status: &SessionStatus) -> &str {
    if let Some(error) = status.error() {
        return error;
    }
    match status {
        SessionStatus::Waiting => WAITING_TEXT,
        SessionStatus::Running => RUNNING_TEXT,
        SessionStatus::Active {
            stop_reason: Some(reason),
            ..
        } => reason,
        SessionStatus::Idle | SessionStatus::Loading | SessionStatus::Active { .. } => "",
    }
}
