//! Maps lifecycle state to exactly one client screen.

use crate::endpoints;
use crate::lifecycle::JobPhase;
use crate::submission::FormFeedback;
use crate::types::{JobIdentity, JobStatus};

pub const MESSAGE_WAITING: &str = "Waiting for an available miner...";
pub const MESSAGE_WORKING: &str = "Mining in progress...";
pub const MESSAGE_PENDING: &str = "Please wait...";

/// The single panel or modal visible to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Submission form, with any field-level feedback.
    SubmissionForm { feedback: FormFeedback },
    /// Job queued or being mined.
    InProgress { id0: JobIdentity, message: &'static str },
    /// Job finished; result available at `download_url`.
    Completed { id0: JobIdentity, download_url: String },
    /// Modal: the job was canceled. Dismissing resets.
    CanceledModal { id0: JobIdentity },
    /// Modal: the job failed. Dismissing resets.
    FailedModal { id0: JobIdentity },
}

impl Screen {
    /// Short stable name, handy for logs and assertions.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubmissionForm { .. } => "submission-form",
            Self::InProgress { .. } => "in-progress",
            Self::Completed { .. } => "completed",
            Self::CanceledModal { .. } => "canceled-modal",
            Self::FailedModal { .. } => "failed-modal",
        }
    }

    pub fn is_modal(&self) -> bool {
        matches!(self, Self::CanceledModal { .. } | Self::FailedModal { .. })
    }
}

/// In-progress message for a status.
pub fn status_message(status: Option<JobStatus>) -> &'static str {
    match status {
        Some(JobStatus::Waiting) => MESSAGE_WAITING,
        Some(JobStatus::Working) => MESSAGE_WORKING,
        _ => MESSAGE_PENDING,
    }
}

/// Build the screen for the current state.
///
/// Any phase past submission without an identity falls back to the form.
pub fn present(
    phase: JobPhase,
    identity: Option<&JobIdentity>,
    feedback: &FormFeedback,
    base_url: &str,
) -> Screen {
    let form = || Screen::SubmissionForm {
        feedback: feedback.clone(),
    };
    let Some(id0) = identity.cloned() else {
        return form();
    };

    match phase {
        JobPhase::NoJob | JobPhase::Submitting => form(),
        JobPhase::Waiting => Screen::InProgress {
            id0,
            message: status_message(Some(JobStatus::Waiting)),
        },
        JobPhase::Working => Screen::InProgress {
            id0,
            message: status_message(Some(JobStatus::Working)),
        },
        JobPhase::Done => Screen::Completed {
            download_url: endpoints::download_url(base_url, id0.as_str()),
            id0,
        },
        JobPhase::Canceled => Screen::CanceledModal { id0 },
        JobPhase::Failed => Screen::FailedModal { id0 },
    }
}
