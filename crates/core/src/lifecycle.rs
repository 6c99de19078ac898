//! Client-side job lifecycle state machine.
//!
//! [`transition`] is a pure function from `(phase, event)` to the next
//! phase plus the side effects the driver must perform. It knows nothing
//! about HTTP, timers or rendering; the controller in `miimine-client`
//! executes the [`Effect`]s.
//!
//! ```text
//! NoJob -> Submitting -> {Waiting, Working} -> {Done, Canceled, Failed}
//!   ^                                                   |
//!   +------------------- reset / dismiss ---------------+
//! ```

use crate::types::{JobIdentity, JobStatus};

/// Where the client is in tracking its job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobPhase {
    /// No job tracked; the submission form is shown.
    #[default]
    NoJob,
    /// A submission is in flight, or accepted but not yet observed.
    Submitting,
    Waiting,
    Working,
    Done,
    Canceled,
    Failed,
}

impl JobPhase {
    /// Phases during which the status poll timer runs.
    pub fn is_polling(self) -> bool {
        matches!(self, Self::Waiting | Self::Working)
    }

    /// Terminal phases of a single job. The controller itself always
    /// returns to [`JobPhase::NoJob`] afterwards.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Canceled | Self::Failed)
    }
}

/// Something that happened to the tracked job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The user submitted the form.
    SubmitStarted,
    /// The service accepted the submission (or the user chose to resume
    /// an existing job) under this identity.
    SubmitAccepted(JobIdentity),
    /// The submission was refused or could not be sent.
    SubmitFailed,
    /// A status check was requested with no identity held.
    NoIdentity,
    /// A status check answered. `None` means absent or unrecognised.
    StatusObserved(Option<JobStatus>),
    /// A status check failed in transport or was rejected.
    StatusCheckFailed,
    /// The user cancelled the job (after the cancel call, whatever its outcome).
    Cancelled,
    /// A terminal screen was dismissed ("do another", modal closed).
    /// Ignored outside terminal phases.
    Dismissed,
}

/// Side effect requested by a transition, executed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Make this the active identity.
    PersistIdentity(JobIdentity),
    /// Clear the active identity.
    ClearIdentity,
    /// (Re)start the status poll timer, replacing any live one.
    StartPolling,
    /// Stop the status poll timer.
    StopPolling,
    /// Run one status check immediately.
    CheckNow,
    /// Clear the submission form and its field feedback.
    ResetForm,
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: JobPhase,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: JobPhase, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }

    fn stay(phase: JobPhase) -> Self {
        Self {
            next: phase,
            effects: Vec::new(),
        }
    }

    fn reset() -> Self {
        Self::to(
            JobPhase::NoJob,
            vec![Effect::ClearIdentity, Effect::StopPolling, Effect::ResetForm],
        )
    }
}

/// Apply `event` in `phase`.
pub fn transition(phase: JobPhase, event: LifecycleEvent) -> Transition {
    match event {
        LifecycleEvent::SubmitStarted => match phase {
            JobPhase::NoJob => Transition::to(JobPhase::Submitting, Vec::new()),
            other => Transition::stay(other),
        },
        LifecycleEvent::SubmitAccepted(id) => Transition::to(
            JobPhase::Submitting,
            vec![Effect::PersistIdentity(id), Effect::CheckNow],
        ),
        LifecycleEvent::SubmitFailed => match phase {
            JobPhase::Submitting => Transition::to(JobPhase::NoJob, Vec::new()),
            other => Transition::stay(other),
        },
        LifecycleEvent::NoIdentity => {
            Transition::to(JobPhase::NoJob, vec![Effect::StopPolling, Effect::ResetForm])
        }
        LifecycleEvent::StatusObserved(status) => match status {
            Some(JobStatus::Waiting) => {
                Transition::to(JobPhase::Waiting, vec![Effect::StartPolling])
            }
            Some(JobStatus::Working) => {
                Transition::to(JobPhase::Working, vec![Effect::StartPolling])
            }
            Some(JobStatus::Done) => Transition::to(JobPhase::Done, vec![Effect::StopPolling]),
            Some(JobStatus::Canceled) => {
                Transition::to(JobPhase::Canceled, vec![Effect::StopPolling])
            }
            Some(JobStatus::Failed) => Transition::to(JobPhase::Failed, vec![Effect::StopPolling]),
            None => Transition::reset(),
        },
        LifecycleEvent::StatusCheckFailed | LifecycleEvent::Cancelled => Transition::reset(),
        LifecycleEvent::Dismissed if phase.is_terminal() => Transition::reset(),
        LifecycleEvent::Dismissed => Transition::stay(phase),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(v: &str) -> JobIdentity {
        JobIdentity::new(v).unwrap()
    }

    fn run(events: Vec<LifecycleEvent>) -> (JobPhase, Vec<Effect>) {
        let mut phase = JobPhase::NoJob;
        let mut effects = Vec::new();
        for event in events {
            let t = transition(phase, event);
            phase = t.next;
            effects.extend(t.effects);
        }
        (phase, effects)
    }

    #[test]
    fn accepted_submission_persists_and_checks_immediately() {
        let (phase, effects) = run(vec![
            LifecycleEvent::SubmitStarted,
            LifecycleEvent::SubmitAccepted(id("abc123")),
        ]);
        assert_eq!(phase, JobPhase::Submitting);
        assert_eq!(
            effects,
            vec![Effect::PersistIdentity(id("abc123")), Effect::CheckNow]
        );
    }

    #[test]
    fn active_statuses_restart_polling() {
        for status in [JobStatus::Waiting, JobStatus::Working] {
            let t = transition(JobPhase::Submitting, LifecycleEvent::StatusObserved(Some(status)));
            assert!(t.next.is_polling());
            assert_eq!(t.effects, vec![Effect::StartPolling]);
        }
    }

    #[test]
    fn waiting_working_done_stops_polling_exactly_once() {
        let (phase, effects) = run(vec![
            LifecycleEvent::SubmitStarted,
            LifecycleEvent::SubmitAccepted(id("abc123")),
            LifecycleEvent::StatusObserved(Some(JobStatus::Waiting)),
            LifecycleEvent::StatusObserved(Some(JobStatus::Working)),
            LifecycleEvent::StatusObserved(Some(JobStatus::Done)),
        ]);
        assert_eq!(phase, JobPhase::Done);
        let stops = effects.iter().filter(|e| **e == Effect::StopPolling).count();
        assert_eq!(stops, 1);
        assert_eq!(effects.last(), Some(&Effect::StopPolling));
    }

    #[test]
    fn terminal_statuses_stop_polling() {
        for (status, phase) in [
            (JobStatus::Done, JobPhase::Done),
            (JobStatus::Canceled, JobPhase::Canceled),
            (JobStatus::Failed, JobPhase::Failed),
        ] {
            let t = transition(JobPhase::Working, LifecycleEvent::StatusObserved(Some(status)));
            assert_eq!(t.next, phase);
            assert!(t.next.is_terminal());
            assert_eq!(t.effects, vec![Effect::StopPolling]);
        }
    }

    #[test]
    fn absent_status_resets() {
        let t = transition(JobPhase::Waiting, LifecycleEvent::StatusObserved(None));
        assert_eq!(t.next, JobPhase::NoJob);
        assert!(t.effects.contains(&Effect::ClearIdentity));
        assert!(t.effects.contains(&Effect::StopPolling));
    }

    #[test]
    fn every_reset_event_clears_identity_and_stops_polling() {
        for event in [LifecycleEvent::StatusCheckFailed, LifecycleEvent::Cancelled] {
            for phase in [
                JobPhase::Waiting,
                JobPhase::Working,
                JobPhase::Done,
                JobPhase::Canceled,
                JobPhase::Failed,
            ] {
                let t = transition(phase, event.clone());
                assert_eq!(t.next, JobPhase::NoJob);
                assert!(t.effects.contains(&Effect::ClearIdentity));
                assert!(t.effects.contains(&Effect::StopPolling));
            }
        }
    }

    #[test]
    fn dismiss_resets_only_terminal_phases() {
        for phase in [JobPhase::Done, JobPhase::Canceled, JobPhase::Failed] {
            let t = transition(phase, LifecycleEvent::Dismissed);
            assert_eq!(t.next, JobPhase::NoJob);
            assert!(t.effects.contains(&Effect::ClearIdentity));
        }
        for phase in [
            JobPhase::NoJob,
            JobPhase::Submitting,
            JobPhase::Waiting,
            JobPhase::Working,
        ] {
            let t = transition(phase, LifecycleEvent::Dismissed);
            assert_eq!(t.next, phase);
            assert!(t.effects.is_empty());
        }
    }

    #[test]
    fn missing_identity_shows_form_without_network() {
        let t = transition(JobPhase::NoJob, LifecycleEvent::NoIdentity);
        assert_eq!(t.next, JobPhase::NoJob);
        assert!(!t.effects.contains(&Effect::CheckNow));
        assert!(!t.effects.contains(&Effect::ClearIdentity));
    }

    #[test]
    fn failed_submission_returns_to_form() {
        let (phase, effects) = run(vec![
            LifecycleEvent::SubmitStarted,
            LifecycleEvent::SubmitFailed,
        ]);
        assert_eq!(phase, JobPhase::NoJob);
        assert!(effects.is_empty());
    }

    #[test]
    fn controller_loops_back_after_terminal() {
        let (phase, _) = run(vec![
            LifecycleEvent::SubmitStarted,
            LifecycleEvent::SubmitAccepted(id("abc123")),
            LifecycleEvent::StatusObserved(Some(JobStatus::Failed)),
            LifecycleEvent::Dismissed,
            LifecycleEvent::SubmitStarted,
        ]);
        assert_eq!(phase, JobPhase::Submitting);
    }
}
