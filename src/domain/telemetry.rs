// Energy time series domain models
use serde::Serialize;

/// Offset added to live energies so the chart's axis formatter can tell
/// live values from the demo series. Subtracted again when formatting.
pub const DISPLAY_OFFSET: f64 = 1000.0;

const DEMO_POINTS: usize = 101;
const DEMO_STEP_MS: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataPoint {
    pub timestamp: i64,
    pub value: f64,
}

impl DataPoint {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Placeholder series shown before any job is connected: a cosine
/// sampled once a minute starting at `start_ms`.
pub fn demo_series(start_ms: i64) -> Vec<DataPoint> {
    (0..DEMO_POINTS)
        .map(|i| {
            DataPoint::new(
                start_ms + i as i64 * DEMO_STEP_MS,
                (i as f64 / 5.0).cos(),
            )
        })
        .collect()
}
