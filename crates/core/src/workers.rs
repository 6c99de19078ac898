//! Worker fleet records (miners and friendbots) and their table rows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{display_field, format_timestamp};

/// The two independently listed worker collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerKind {
    Miners,
    Friendbots,
}

impl WorkerKind {
    /// Field of the listing `data` holding the collection.
    pub fn data_field(self) -> &'static str {
        match self {
            Self::Miners => "miners",
            Self::Friendbots => "friendbots",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.data_field())
    }
}

/// One registered worker process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecord {
    #[serde(default)]
    pub name: serde_json::Value,
    #[serde(default)]
    pub ip: serde_json::Value,
    #[serde(default)]
    pub version: serde_json::Value,
    #[serde(default)]
    pub last_update: serde_json::Value,
}

/// Display-ready worker row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRow {
    pub name: String,
    pub ip: String,
    pub version: String,
    pub last_update: String,
}

impl From<&WorkerRecord> for WorkerRow {
    fn from(worker: &WorkerRecord) -> Self {
        Self {
            name: display_field(&worker.name),
            ip: display_field(&worker.ip),
            version: display_field(&worker.version),
            last_update: format_timestamp(&worker.last_update),
        }
    }
}

/// Build rows for either collection with the same routine.
pub fn render_worker_rows(workers: &[WorkerRecord]) -> Vec<WorkerRow> {
    workers.iter().map(WorkerRow::from).collect()
}
