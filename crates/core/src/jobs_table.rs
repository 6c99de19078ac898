//! Operator view of all jobs: snapshot, overlay, and rendering.
//!
//! The service listing is kept as an immutable [`JobSnapshot`]; operator
//! state (expanded rows, filter text) lives in a separate
//! [`JobTableOverlay`]. The visible table is always recomputed as
//! `render_job_table(snapshot, overlay)`, so replacing the snapshot on
//! refresh never loses operator state.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::types::{display_field, format_timestamp, JobStatus};

/// Rendered for an empty pending queue.
pub const EMPTY_QUEUE_PLACEHOLDER: &str = "<empty>";

/// Summary fields of one job as listed for operators. Extra fields are
/// kept for the inspect view.
///
/// `key` and `status` are read as display text whatever JSON type they
/// arrive as, so one odd record never hides the rest of the listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub key: String,
    #[serde(rename = "type", default)]
    pub job_type: serde_json::Value,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: String,
    #[serde(default)]
    pub created: serde_json::Value,
    #[serde(default)]
    pub last_update: serde_json::Value,
    #[serde(default)]
    pub assignee: serde_json::Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl JobRecord {
    pub fn status(&self) -> Option<JobStatus> {
        JobStatus::parse(&self.status)
    }
}

/// `data` of the job listing endpoint, as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobListing {
    #[serde(default)]
    pub jobs: Vec<serde_json::Value>,
    #[serde(default)]
    pub queue: Vec<String>,
}

/// One job with its serialized forms precomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct JobEntry {
    pub record: JobRecord,
    /// Compact JSON of the job exactly as received; the filter target.
    pub serialized: String,
    /// Indented JSON shown in the inspect row.
    pub pretty: String,
}

/// An immutable listing: jobs in service order plus the pending queue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSnapshot {
    entries: Vec<JobEntry>,
    queue: Vec<String>,
}

impl JobSnapshot {
    /// Build a snapshot from a listing. Entries that are not JSON objects
    /// are logged and left out; everything else is kept.
    pub fn from_listing(listing: JobListing) -> Result<Self, CoreError> {
        let mut entries = Vec::with_capacity(listing.jobs.len());
        for raw in listing.jobs {
            let record: JobRecord = match serde_json::from_value(raw.clone()) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(error = %e, job = %raw, "Skipping malformed job record");
                    continue;
                }
            };
            let serialized = serde_json::to_string(&raw)
                .map_err(|e| CoreError::MalformedRecord(e.to_string()))?;
            let pretty = serde_json::to_string_pretty(&raw)
                .map_err(|e| CoreError::MalformedRecord(e.to_string()))?;
            entries.push(JobEntry {
                record,
                serialized,
                pretty,
            });
        }

        Ok(Self {
            entries,
            queue: listing.queue,
        })
    }

    pub fn entries(&self) -> &[JobEntry] {
        &self.entries
    }

    pub fn queue(&self) -> &[String] {
        &self.queue
    }
}

/// Operator-held state re-applied over every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobTableOverlay {
    inspected: HashSet<String>,
    filter: String,
}

impl JobTableOverlay {
    /// Flip the inspect state of `key`; returns whether it is now expanded.
    ///
    /// Keys missing from the current snapshot are still tracked; they are
    /// inert until a job with that key is listed again.
    pub fn toggle_inspect(&mut self, key: &str) -> bool {
        if self.inspected.remove(key) {
            false
        } else {
            self.inspected.insert(key.to_string());
            true
        }
    }

    pub fn is_inspected(&self, key: &str) -> bool {
        self.inspected.contains(key)
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Case-sensitive substring match; an empty filter matches everything.
    pub fn matches(&self, serialized: &str) -> bool {
        self.filter.is_empty() || serialized.contains(&self.filter)
    }
}

/// Per-row action offered to the operator. Exactly one per job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    Cancel,
    Reset,
}

impl JobAction {
    /// Canceled jobs can be reset; everything else can be cancelled.
    pub fn for_status(status: &str) -> Self {
        if status == JobStatus::Canceled.as_str() {
            Self::Reset
        } else {
            Self::Cancel
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cancel => "Cancel job",
            Self::Reset => "Reset job",
        }
    }
}

/// Display-ready summary of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummaryRow {
    pub key: String,
    pub job_type: String,
    pub status: String,
    pub created: String,
    pub last_update: String,
    pub assignee: String,
    pub action: JobAction,
}

/// A rendered table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobTableRow {
    Summary(JobSummaryRow),
    /// Full record beneath the summary row of the same key.
    Inspect { key: String, json: String },
}

fn summary_row(record: &JobRecord) -> JobSummaryRow {
    JobSummaryRow {
        key: record.key.clone(),
        job_type: display_field(&record.job_type),
        status: record.status.clone(),
        created: format_timestamp(&record.created),
        last_update: format_timestamp(&record.last_update),
        assignee: display_field(&record.assignee),
        action: JobAction::for_status(&record.status),
    }
}

/// Render the visible table: filtered jobs in snapshot order, each
/// expanded job followed immediately by its inspect row.
pub fn render_job_table(snapshot: &JobSnapshot, overlay: &JobTableOverlay) -> Vec<JobTableRow> {
    let mut rows = Vec::with_capacity(snapshot.entries.len());
    let mut expanded: HashSet<&str> = HashSet::new();

    for entry in snapshot.entries.iter().filter(|e| overlay.matches(&e.serialized)) {
        rows.push(JobTableRow::Summary(summary_row(&entry.record)));
        let key = entry.record.key.as_str();
        if overlay.is_inspected(key) && expanded.insert(key) {
            rows.push(JobTableRow::Inspect {
                key: key.to_string(),
                json: entry.pretty.clone(),
            });
        }
    }

    rows
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(|value| display_field(&value))
}

/// Render the pending queue, one entry per line in submission order.
pub fn render_queue(queue: &[String]) -> String {
    if queue.is_empty() {
        EMPTY_QUEUE_PLACEHOLDER.to_string()
    } else {
        queue.join("\n")
    }
}
