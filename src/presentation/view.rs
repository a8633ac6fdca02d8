// View model served to the page: status line, minimum energy, chart data
use crate::application::session_runtime::SessionSnapshot;
use crate::application::status::status_text;
use crate::domain::telemetry::{DataPoint, DISPLAY_OFFSET};
use chrono::DateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub job_id: Option<String>,
    pub location: String,
    pub status: &'static str,
    pub status_text: String,
    pub min_energy: f64,
    pub min_energy_text: String,
    pub demo_mode: bool,
    pub points: Vec<ChartPoint>,
}

/// A chart point with its axis labels already formatted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: i64,
    pub value: f64,
    pub time_label: String,
    pub energy_label: String,
}

impl From<&SessionSnapshot> for ViewModel {
    fn from(snapshot: &SessionSnapshot) -> Self {
        let points = snapshot
            .points
            .iter()
            .map(|point| chart_point(point, snapshot.demo_mode))
            .collect();

        Self {
            job_id: snapshot.job_id.as_ref().map(|id| id.to_string()),
            location: snapshot.location.clone(),
            status: snapshot.status.name(),
            status_text: status_text(&snapshot.status).to_string(),
            min_energy: snapshot.min_energy,
            min_energy_text: format!("{:.2}", snapshot.min_energy),
            demo_mode: snapshot.demo_mode,
            points,
        }
    }
}

fn chart_point(point: &DataPoint, demo_mode: bool) -> ChartPoint {
    ChartPoint {
        timestamp: point.timestamp,
        value: point.value,
        time_label: format_timestamp(point.timestamp),
        energy_label: format_energy(point.value, demo_mode),
    }
}

/// Energy axis label. Live values carry the display offset, demo values don't.
pub fn format_energy(value: f64, demo_mode: bool) -> String {
    let offset = if demo_mode { 0.0 } else { DISPLAY_OFFSET };
    format!("{:.2}", value - offset)
}

/// Time axis label, e.g. `01 Mar 10:00` (UTC)
pub fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%d %b %H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::JobId;
    use crate::domain::session::SessionStatus;
    use std::sync::Arc;

    #[test]
    fn test_format_energy() {
        assert_eq!(format_energy(997.5, false), "-2.50");
        assert_eq!(format_energy(0.5, true), "0.50");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1_677_664_800_250), "01 Mar 10:00");
    }

    #[test]
    fn test_view_from_snapshot() {
        let snapshot = SessionSnapshot {
            job_id: Some(JobId::parse("abc123").unwrap()),
            location: "/job/abc123/".to_string(),
            status: SessionStatus::stopped(Some("converged".to_string())),
            min_energy: -3.456,
            demo_mode: false,
            points: Arc::new(vec![DataPoint::new(1_677_664_800_000, DISPLAY_OFFSET - 3.456)]),
        };

        let view = ViewModel::from(&snapshot);
        assert_eq!(view.job_id.as_deref(), Some("abc123"));
        assert_eq!(view.status, "active");
        assert_eq!(view.status_text, "converged");
        assert_eq!(view.min_energy_text, "-3.46");
        assert_eq!(view.points[0].energy_label, "-3.46");
        assert_eq!(view.points[0].time_label, "01 Mar 10:00");
    }
}
