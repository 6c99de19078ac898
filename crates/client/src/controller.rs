//! Job lifecycle controller: drives one tracked job through the
//! transition table in [`miimine_core::lifecycle`].
//!
//! The controller owns the identity resolver, the poll timer and the user
//! prompt. It is meant to be owned by a single task; every operation takes
//! `&mut self`, so a poll tick can never run concurrently with another
//! operation.

use std::time::Duration;

use miimine_core::envelope::SubmitRejection;
use miimine_core::identity::{CookieStore, IdentityResolver, Navigation};
use miimine_core::lifecycle::{transition, Effect, JobPhase, LifecycleEvent, Transition};
use miimine_core::presenter::{present, Screen};
use miimine_core::submission::{FormFeedback, MiiSource, MiiSubmission, FETCHED_MII_FILE_NAME};
use miimine_core::types::JobIdentity;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, MiningApi};
use crate::poll::{PollTimer, PollToken};
use crate::prompt::UserPrompt;

/// Asked when the service already has a job for the submitted id0.
pub const DUPLICATE_JOB_PROMPT: &str =
    "A job with this ID0 already exists. Would you like to view its progress?";

/// Asked before a finished, failed or canceled job is cleared.
pub const DISMISS_PROMPT: &str = "Clear this job and return to the submission form?";

/// User actions fed to [`JobController::run`].
#[derive(Debug, Clone)]
pub enum ControllerCommand {
    Submit(MiiSubmission),
    CheckStatus,
    Cancel,
    /// Close the canceled/failed modal or leave the completion screen.
    Dismiss,
}

/// Client-side owner of one job's lifecycle.
///
/// Every operation takes `&mut self`, so a status check always completes
/// against the identity it was started with.
pub struct JobController<C, N, P> {
    api: MiningApi,
    identity: IdentityResolver<C, N>,
    prompt: P,
    phase: JobPhase,
    feedback: FormFeedback,
    timer: PollTimer,
}

impl<C, N, P> JobController<C, N, P>
where
    C: CookieStore,
    N: Navigation,
    P: UserPrompt,
{
    pub fn new(
        api: MiningApi,
        identity: IdentityResolver<C, N>,
        prompt: P,
        poll_interval: Duration,
    ) -> Self {
        Self {
            api,
            identity,
            prompt,
            phase: JobPhase::NoJob,
            feedback: FormFeedback::default(),
            timer: PollTimer::new(poll_interval),
        }
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    /// The single screen to show for the current state.
    pub fn screen(&self) -> Screen {
        present(
            self.phase,
            self.identity.current(),
            &self.feedback,
            self.api.base_url(),
        )
    }

    pub fn identity(&self) -> Option<&JobIdentity> {
        self.identity.current()
    }

    pub fn resolver(&self) -> &IdentityResolver<C, N> {
        &self.identity
    }

    pub fn feedback(&self) -> &FormFeedback {
        &self.feedback
    }

    /// Whether a status poll timer is live.
    pub fn is_polling(&self) -> bool {
        self.timer.is_active()
    }

    /// Resume after a restart: load the persisted identity and check it.
    pub async fn resume(&mut self) {
        let loaded = self.identity.load();
        tracing::info!(
            id0 = loaded.as_ref().map(JobIdentity::as_str).unwrap_or(""),
            "Resuming job tracking"
        );
        self.check_status().await;
    }

    /// Submit a new job.
    ///
    /// A URL source is fetched first; if that fails nothing is submitted.
    /// Field problems become form feedback, a duplicate offers to resume
    /// the existing job, and anything else is alerted.
    pub async fn submit(&mut self, submission: MiiSubmission) {
        if self.phase != JobPhase::NoJob {
            tracing::warn!(phase = ?self.phase, "Ignoring submission while a job is tracked");
            return;
        }
        self.apply(LifecycleEvent::SubmitStarted);

        let (file_name, bytes) = match &submission.source {
            MiiSource::File { file_name, bytes } => (file_name.clone(), bytes.clone()),
            MiiSource::Url(url) => match self.api.fetch_bytes(url).await {
                Ok(bytes) => (FETCHED_MII_FILE_NAME.to_string(), bytes),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Mii download failed");
                    self.prompt.alert(&format!("Error downloading Mii data: {e}"));
                    self.apply(LifecycleEvent::SubmitFailed);
                    return;
                }
            },
        };

        let resolved = submission.resolve(file_name, bytes);
        if let Err(feedback) = resolved.validate() {
            let fields: Vec<_> = feedback.fields().collect();
            tracing::debug!(fields = ?fields, "Submission rejected locally");
            self.feedback = feedback;
            self.apply(LifecycleEvent::SubmitFailed);
            return;
        }
        self.feedback.clear();

        match self.api.submit_job(&resolved).await {
            Ok(id0) => {
                tracing::info!(id0 = %id0, "Job submitted");
                if self.apply(LifecycleEvent::SubmitAccepted(id0)) {
                    self.check_status().await;
                }
            }
            Err(ApiError::Rejected { message, .. }) => match SubmitRejection::classify(&message) {
                SubmitRejection::Invalid(feedback) => {
                    tracing::debug!(message = %message, "Submission rejected by service");
                    self.feedback = feedback;
                    self.apply(LifecycleEvent::SubmitFailed);
                }
                SubmitRejection::Duplicate => {
                    let resume = JobIdentity::new(resolved.id0.clone())
                        .filter(|_| self.prompt.confirm(DUPLICATE_JOB_PROMPT));
                    match resume {
                        Some(id0) => {
                            tracing::info!(id0 = %id0, "Resuming existing job");
                            if self.apply(LifecycleEvent::SubmitAccepted(id0)) {
                                self.check_status().await;
                            }
                        }
                        None => {
                            self.apply(LifecycleEvent::SubmitFailed);
                        }
                    }
                }
                SubmitRejection::Other(message) => {
                    tracing::warn!(message = %message, "Submission failed");
                    self.prompt.alert(&format!("Error submitting job: {message}"));
                    self.apply(LifecycleEvent::SubmitFailed);
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Submission failed");
                self.prompt.alert(&format!("Error submitting job: {e}"));
                self.apply(LifecycleEvent::SubmitFailed);
            }
        }
    }

    /// Check the tracked job once and apply the result.
    ///
    /// With no identity this shows the form without any network call.
    /// Any failure is alerted and then resets.
    pub async fn check_status(&mut self) {
        let Some(id0) = self.identity.current().cloned() else {
            self.apply(LifecycleEvent::NoIdentity);
            return;
        };

        match self.api.job_status(&id0).await {
            Ok(status) => {
                tracing::debug!(id0 = %id0, status = ?status, "Job status observed");
                self.apply(LifecycleEvent::StatusObserved(status));
            }
            Err(e) => {
                tracing::warn!(id0 = %id0, error = %e, "Status check failed");
                self.prompt.alert(&format!("Error checking job status: {e}"));
                self.apply(LifecycleEvent::StatusCheckFailed);
            }
        }
    }

    /// Cancel the tracked job, then reset regardless of the outcome.
    pub async fn cancel(&mut self) {
        if let Some(id0) = self.identity.current().cloned() {
            match self.api.cancel_job(id0.as_str()).await {
                Ok(()) => tracing::info!(id0 = %id0, "Job canceled"),
                Err(e) => {
                    tracing::warn!(id0 = %id0, error = %e, "Cancel failed");
                    self.prompt.alert(&format!("Error canceling job: {e}"));
                }
            }
        }
        self.apply(LifecycleEvent::Cancelled);
    }

    /// Leave a terminal screen. A job still in progress is left alone.
    pub fn dismiss(&mut self) {
        self.apply(LifecycleEvent::Dismissed);
    }

    /// Offer to clear a finished, failed or canceled job.
    ///
    /// Returns whether the job was cleared. Nothing is asked while the job
    /// is still in progress.
    pub fn acknowledge(&mut self) -> bool {
        if !self.phase.is_terminal() {
            return false;
        }
        if !self.prompt.confirm(DISMISS_PROMPT) {
            tracing::debug!(phase = ?self.phase, "Keeping finished job");
            return false;
        }
        self.dismiss();
        true
    }

    /// Wait for the live poll timer. Never resolves while stopped.
    pub async fn next_poll(&mut self) -> PollToken {
        self.timer.tick().await
    }

    pub async fn handle(&mut self, command: ControllerCommand) {
        match command {
            ControllerCommand::Submit(submission) => self.submit(submission).await,
            ControllerCommand::CheckStatus => self.check_status().await,
            ControllerCommand::Cancel => self.cancel().await,
            ControllerCommand::Dismiss => self.dismiss(),
        }
    }

    /// Drive the controller until `cancel` fires or the command channel
    /// closes. Poll ticks and user commands are handled one at a time;
    /// `on_change` sees the screen after each.
    pub async fn run<F>(
        &mut self,
        mut commands: mpsc::Receiver<ControllerCommand>,
        cancel: CancellationToken,
        mut on_change: F,
    ) where
        F: FnMut(&Screen),
    {
        on_change(&self.screen());

        loop {
            let command = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.timer.tick() => ControllerCommand::CheckStatus,
                command = commands.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            self.handle(command).await;
            on_change(&self.screen());
        }

        self.timer.stop();
        tracing::debug!("Job controller stopped");
    }

    // ---- private helpers ----

    /// Apply one event and execute its effects. Returns whether an
    /// immediate status check was requested.
    fn apply(&mut self, event: LifecycleEvent) -> bool {
        let from = self.phase;
        let Transition { next, effects } = transition(from, event);
        self.phase = next;

        let mut check_now = false;
        for effect in effects {
            match effect {
                Effect::PersistIdentity(id0) => self.identity.set(Some(id0)),
                Effect::ClearIdentity => self.identity.set(None),
                Effect::StartPolling => {
                    self.timer.start();
                }
                Effect::StopPolling => {
                    self.timer.stop();
                }
                Effect::CheckNow => check_now = true,
                Effect::ResetForm => self.feedback.clear(),
            }
        }

        if from != next {
            tracing::info!(from = ?from, to = ?next, "Job phase changed");
        }
        check_now
    }
}
