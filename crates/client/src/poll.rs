//! Cancellable periodic poll timer.
//!
//! At most one interval is live at a time. Starting always replaces the
//! previous interval and bumps the poll token, so a tick can always be
//! attributed to the exact start that produced it.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Shortest accepted period; tokio intervals reject a zero period.
pub const MIN_TIMER_PERIOD: Duration = Duration::from_millis(1);

/// Identifies one start of the timer.
pub type PollToken = u64;

/// Status poll timer owned by the job controller.
#[derive(Debug)]
pub struct PollTimer {
    period: Duration,
    interval: Option<Interval>,
    token: PollToken,
}

impl PollTimer {
    /// `period` is clamped to at least [`MIN_TIMER_PERIOD`].
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_TIMER_PERIOD),
            interval: None,
            token: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// (Re)start the timer. The first tick fires one full period from now.
    pub fn start(&mut self) -> PollToken {
        self.stop();
        self.token += 1;
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
        tracing::debug!(
            token = self.token,
            period_ms = self.period.as_millis() as u64,
            "Poll timer started"
        );
        self.token
    }

    /// Stop the timer. Returns whether one was running.
    pub fn stop(&mut self) -> bool {
        let was_active = self.interval.take().is_some();
        if was_active {
            tracing::debug!(token = self.token, "Poll timer stopped");
        }
        was_active
    }

    pub fn is_active(&self) -> bool {
        self.interval.is_some()
    }

    /// Token of the most recent start.
    pub fn token(&self) -> PollToken {
        self.token
    }

    /// Wait for the next tick of the live timer, returning its token.
    /// Never resolves while the timer is stopped.
    pub async fn tick(&mut self) -> PollToken {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
                self.token
            }
            None => std::future::pending().await,
        }
    }
}
