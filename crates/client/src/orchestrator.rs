//! Periodic refresh loop for the operator console.
//!
//! One refresh fires the jobs, miners and friendbots fetches concurrently.
//! Each fetch reports its own failure and leaves its own table as it was.
//! The refresh timestamp is stamped after every pass, successful or not.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::admin::AdminJobMonitor;
use crate::api::MiningApi;
use crate::fleet::FleetMonitor;
use crate::poll::MIN_TIMER_PERIOD;
use crate::prompt::UserPrompt;

/// Which fetches of a refresh pass succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub jobs: bool,
    pub miners: bool,
    pub friendbots: bool,
}

impl RefreshReport {
    pub fn all_ok(&self) -> bool {
        self.jobs && self.miners && self.friendbots
    }
}

/// Operator requests fed to [`AdminConsole::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Refresh,
    SetFilter(String),
    ToggleInspect(String),
    CancelJob(String),
    ResetJob(String),
}

/// Jobs, miners and friendbots tables refreshed on one timer.
#[derive(Debug)]
pub struct AdminConsole {
    pub jobs: AdminJobMonitor,
    pub fleet: FleetMonitor,
    refresh_interval: Duration,
    last_refreshed: Option<DateTime<Utc>>,
}

impl AdminConsole {
    /// `refresh_interval` is clamped to at least [`MIN_TIMER_PERIOD`].
    pub fn new(api: MiningApi, refresh_interval: Duration) -> Self {
        Self {
            jobs: AdminJobMonitor::new(api.clone()),
            fleet: FleetMonitor::new(api),
            refresh_interval: refresh_interval.max(MIN_TIMER_PERIOD),
            last_refreshed: None,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// When the last refresh pass completed.
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    /// Fetch all three listings concurrently, then stamp the refresh time.
    pub async fn refresh_all<P: UserPrompt>(&mut self, prompt: &P) -> RefreshReport {
        let (jobs, (miners, friendbots)) =
            tokio::join!(self.jobs.refresh(prompt), self.fleet.refresh(prompt));
        let now = Utc::now();
        self.last_refreshed = Some(now);

        let report = RefreshReport {
            jobs,
            miners,
            friendbots,
        };
        tracing::debug!(?report, refreshed_at = %now, "Admin tables refreshed");
        report
    }

    /// Apply one operator command. Filter and inspect never hit the network.
    pub async fn handle<P: UserPrompt>(&mut self, command: AdminCommand, prompt: &P) {
        match command {
            AdminCommand::Refresh => {
                self.refresh_all(prompt).await;
            }
            AdminCommand::SetFilter(filter) => self.jobs.set_filter(filter),
            AdminCommand::ToggleInspect(key) => {
                self.jobs.toggle_inspect(&key);
            }
            AdminCommand::CancelJob(key) => self.jobs.cancel_job(&key, prompt).await,
            AdminCommand::ResetJob(key) => self.jobs.reset_job(&key, prompt).await,
        }
    }

    /// Refresh immediately, then every `refresh_interval`, handling operator
    /// commands in between. Runs until `cancel` fires or the command channel
    /// closes. `on_change` is called after every refresh or command.
    pub async fn run<P, F>(
        &mut self,
        prompt: &P,
        mut commands: mpsc::Receiver<AdminCommand>,
        cancel: CancellationToken,
        mut on_change: F,
    ) where
        P: UserPrompt,
        F: FnMut(&AdminConsole),
    {
        tracing::info!(
            interval_ms = self.refresh_interval.as_millis() as u64,
            "Admin console started"
        );

        self.refresh_all(prompt).await;
        on_change(self);

        let period = self.refresh_interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let command = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Admin console stopping");
                    break;
                }
                _ = interval.tick() => AdminCommand::Refresh,
                command = commands.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            self.handle(command, prompt).await;
            on_change(self);
        }
    }
}
