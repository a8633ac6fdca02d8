// Solution accumulator - ordered chart data for one session
use super::feed::FeedError;
use super::telemetry::{DataPoint, DISPLAY_OFFSET};
use std::sync::Arc;

/// Owns the accumulated points and running minimum of the current session.
///
/// Points live behind an `Arc` so the view can hold a snapshot while the
/// accumulator keeps ingesting; appending after a snapshot was taken copies
/// the sequence instead of mutating the shared one.
#[derive(Debug, Clone)]
pub struct SolutionAccumulator {
    points: Arc<Vec<DataPoint>>,
    min_energy: f64,
}

impl Default for SolutionAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl SolutionAccumulator {
    pub fn new() -> Self {
        Self {
            points: Arc::new(Vec::new()),
            min_energy: 0.0,
        }
    }

    /// Forget everything; used whenever a new session starts or connects.
    pub fn reset(&mut self) {
        self.points = Arc::new(Vec::new());
        self.min_energy = 0.0;
    }

    /// Append one solution. Timestamps that do not advance past the last
    /// accumulated point are bumped to `last + 1`; a bump past `i64::MAX`
    /// is rejected and leaves the accumulator unchanged.
    pub fn ingest(&mut self, timestamp_ms: i64, energy: f64) -> Result<(), FeedError> {
        let timestamp = match self.points.last() {
            Some(last) if timestamp_ms <= last.timestamp => last
                .timestamp
                .checked_add(1)
                .ok_or_else(|| FeedError::Parse("timestamp overflow".to_string()))?,
            _ => timestamp_ms,
        };

        Arc::make_mut(&mut self.points).push(DataPoint::new(timestamp, energy + DISPLAY_OFFSET));
        self.min_energy = self.min_energy.min(energy);
        Ok(())
    }

    pub fn points(&self) -> Arc<Vec<DataPoint>> {
        Arc::clone(&self.points)
    }

    pub fn min_energy(&self) -> f64 {
        self.min_energy
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
