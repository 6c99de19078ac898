//! Operator view of the job table and pending queue.
//!
//! Each refresh replaces the snapshot wholesale; inspect and filter state
//! live in a [`JobTableOverlay`] that survives refreshes and is re-applied
//! on every render.

use miimine_core::error::CoreError;
use miimine_core::jobs_table::{
    render_job_table, render_queue, JobSnapshot, JobTableOverlay, JobTableRow,
};

use crate::api::{ApiError, MiningApi};
use crate::prompt::UserPrompt;

/// Why a job listing could not be turned into a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Listing(#[from] CoreError),
}

/// Admin job table: last good snapshot plus operator overlay.
#[derive(Debug)]
pub struct AdminJobMonitor {
    api: MiningApi,
    snapshot: Option<JobSnapshot>,
    overlay: JobTableOverlay,
}

impl AdminJobMonitor {
    pub fn new(api: MiningApi) -> Self {
        Self {
            api,
            snapshot: None,
            overlay: JobTableOverlay::default(),
        }
    }

    /// Fetch a fresh listing. On failure the user is alerted and the
    /// previous table stays up. Returns whether the snapshot was replaced.
    pub async fn refresh<P: UserPrompt>(&mut self, prompt: &P) -> bool {
        match self.fetch_snapshot().await {
            Ok(snapshot) => {
                tracing::debug!(
                    jobs = snapshot.entries().len(),
                    queued = snapshot.queue().len(),
                    "Job listing refreshed"
                );
                self.snapshot = Some(snapshot);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Job listing failed");
                prompt.alert(&format!("Error retrieving jobs: {e}"));
                false
            }
        }
    }

    pub fn snapshot(&self) -> Option<&JobSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn overlay(&self) -> &JobTableOverlay {
        &self.overlay
    }

    /// Rows for the current snapshot with the overlay applied. Empty until
    /// the first successful refresh.
    pub fn rows(&self) -> Vec<JobTableRow> {
        self.snapshot
            .as_ref()
            .map(|snapshot| render_job_table(snapshot, &self.overlay))
            .unwrap_or_default()
    }

    /// Pending queue as display text.
    pub fn queue_text(&self) -> String {
        render_queue(self.snapshot.as_ref().map(JobSnapshot::queue).unwrap_or(&[]))
    }

    /// Expand or collapse a job's full record. Purely local.
    pub fn toggle_inspect(&mut self, key: &str) -> bool {
        self.overlay.toggle_inspect(key)
    }

    /// Set the substring filter. Purely local.
    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.overlay.set_filter(filter);
    }

    /// Cancel a job by key, then re-fetch the table whatever the outcome.
    pub async fn cancel_job<P: UserPrompt>(&mut self, key: &str, prompt: &P) {
        match self.api.cancel_job(key).await {
            Ok(()) => tracing::info!(key, "Job canceled by operator"),
            Err(e) => {
                tracing::warn!(key, error = %e, "Operator cancel failed");
                prompt.alert(&format!("Error canceling job: {e}"));
            }
        }
        self.refresh(prompt).await;
    }

    /// Reset a canceled job by key, then re-fetch the table whatever the
    /// outcome.
    pub async fn reset_job<P: UserPrompt>(&mut self, key: &str, prompt: &P) {
        match self.api.reset_job(key).await {
            Ok(()) => tracing::info!(key, "Job reset by operator"),
            Err(e) => {
                tracing::warn!(key, error = %e, "Operator reset failed");
                prompt.alert(&format!("Error resetting job: {e}"));
            }
        }
        self.refresh(prompt).await;
    }

    async fn fetch_snapshot(&self) -> Result<JobSnapshot, MonitorError> {
        let listing = self.api.list_jobs().await?;
        Ok(JobSnapshot::from_listing(listing)?)
    }
}
