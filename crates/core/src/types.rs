use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// All timestamps are UTC.
pub type Timestamp = DateTime<Utc>;

/// Rendered in place of a timestamp that cannot be interpreted.
pub const INVALID_DATE: &str = "Invalid Date";

/// Opaque token (`id0`) identifying one submitted job to its submitter.
///
/// An empty token means "no job tracked" and is never constructed;
/// callers hold an `Option<JobIdentity>` instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobIdentity(String);

impl JobIdentity {
    /// Wrap a raw token, returning `None` for the empty string.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-reported status of a single job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Waiting,
    Working,
    Done,
    Canceled,
    Failed,
}

impl JobStatus {
    /// Parse the wire name. Unknown names yield `None` ("absent").
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting" => Some(Self::Waiting),
            "working" => Some(Self::Working),
            "done" => Some(Self::Done),
            "canceled" => Some(Self::Canceled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Working => "working",
            Self::Done => "done",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
        }
    }

    /// Whether the job is still queued or being mined.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Waiting | Self::Working)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a loosely-typed JSON field as table text.
///
/// Strings are shown verbatim, `null` (or a missing field) as empty,
/// everything else in its JSON form.
pub fn display_field(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a server timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
///
/// Numbers are epoch milliseconds; strings must be RFC 3339. Anything
/// else renders as [`INVALID_DATE`].
pub fn format_timestamp(value: &serde_json::Value) -> String {
    parse_timestamp(value)
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

fn parse_timestamp(value: &serde_json::Value) -> Option<Timestamp> {
    match value {
        serde_json::Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis)
        }
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}
