//! Miner and friendbot tables.

use miimine_core::workers::{render_worker_rows, WorkerKind, WorkerRecord, WorkerRow};

use crate::api::MiningApi;
use crate::prompt::UserPrompt;

/// One worker collection with its last good listing.
#[derive(Debug)]
pub struct WorkerTable {
    kind: WorkerKind,
    api: MiningApi,
    workers: Option<Vec<WorkerRecord>>,
}

impl WorkerTable {
    pub fn new(kind: WorkerKind, api: MiningApi) -> Self {
        Self {
            kind,
            api,
            workers: None,
        }
    }

    pub fn kind(&self) -> WorkerKind {
        self.kind
    }

    /// Re-fetch this collection. A failure alerts and keeps the previous
    /// rows.
    pub async fn refresh<P: UserPrompt>(&mut self, prompt: &P) -> bool {
        match self.api.list_workers(self.kind).await {
            Ok(workers) => {
                tracing::debug!(
                    kind = %self.kind,
                    count = workers.len(),
                    "Worker listing refreshed"
                );
                self.workers = Some(workers);
                true
            }
            Err(e) => {
                tracing::warn!(kind = %self.kind, error = %e, "Worker listing failed");
                prompt.alert(&format!("Error retrieving {}: {e}", self.kind));
                false
            }
        }
    }

    pub fn rows(&self) -> Vec<WorkerRow> {
        self.workers
            .as_deref()
            .map(render_worker_rows)
            .unwrap_or_default()
    }
}

/// Both worker tables. They refresh independently; one failing leaves the
/// other untouched.
#[derive(Debug)]
pub struct FleetMonitor {
    pub miners: WorkerTable,
    pub friendbots: WorkerTable,
}

impl FleetMonitor {
    pub fn new(api: MiningApi) -> Self {
        Self {
            miners: WorkerTable::new(WorkerKind::Miners, api.clone()),
            friendbots: WorkerTable::new(WorkerKind::Friendbots, api),
        }
    }

    /// Refresh both tables concurrently. Returns `(miners_ok, friendbots_ok)`.
    pub async fn refresh<P: UserPrompt>(&mut self, prompt: &P) -> (bool, bool) {
        tokio::join!(self.miners.refresh(prompt), self.friendbots.refresh(prompt))
    }
}
