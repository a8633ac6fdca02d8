// Streaming feed messages, decoded at the connection boundary
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeedError {
    #[error("connection error: {0}")]
    Transport(String),
    #[error("malformed message: {0}")]
    Parse(String),
}

/// A JSON scalar that the server may send either as a number or as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedMessage {
    /// A worker picked the job up
    Start,
    Solution {
        date: Scalar,
        energy: Scalar,
    },
    Stop {
        #[serde(default)]
        reason: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// A solution event with its fields parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    pub timestamp_ms: i64,
    pub energy: f64,
}

impl FeedMessage {
    pub fn decode(text: &str) -> Result<Self, FeedError> {
        serde_json::from_str(text).map_err(|e| FeedError::Parse(e.to_string()))
    }
}

/// Parse the raw `date`/`energy` pair of a solution event.
pub fn parse_solution(date: &Scalar, energy: &Scalar) -> Result<Solution, FeedError> {
    let timestamp_ms = match date {
        Scalar::Int(ms) => *ms,
        Scalar::Float(ms) if ms.is_finite() => ms.trunc() as i64,
        Scalar::Float(ms) => return Err(FeedError::Parse(format!("invalid date: {}", ms))),
        Scalar::Text(text) => parse_timestamp(text)
            .ok_or_else(|| FeedError::Parse(format!("invalid date: {:?}", text)))?,
    };
    if DateTime::from_timestamp_millis(timestamp_ms).is_none() {
        return Err(FeedError::Parse(format!("date out of range: {}", timestamp_ms)));
    }

    let energy = match energy {
        Scalar::Int(value) => *value as f64,
        Scalar::Float(value) => *value,
        Scalar::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| FeedError::Parse(format!("invalid energy: {:?}", text)))?,
    };
    if !energy.is_finite() {
        return Err(FeedError::Parse(format!("invalid energy: {}", energy)));
    }

    Ok(Solution {
        timestamp_ms,
        energy,
    })
}

/// Accepts RFC 3339, naive ISO-8601 (taken as UTC) or epoch milliseconds.
/// Fractional milliseconds are truncated, as for numeric dates.
pub fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();

    if let Ok(ms) = text.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(ms) = text.parse::<f64>() {
        return ms.is_finite().then(|| ms.trunc() as i64);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
}
