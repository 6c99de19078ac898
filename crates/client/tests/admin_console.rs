mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use common::*;
use miimine_client::admin::AdminJobMonitor;
use miimine_client::fleet::FleetMonitor;
use miimine_client::orchestrator::{AdminCommand, AdminConsole};
use miimine_core::jobs_table::{JobAction, JobTableRow, EMPTY_QUEUE_PLACEHOLDER};

fn listing() -> Reply {
    Reply::success(json!({
        "jobs": [
            {
                "key": "a1",
                "type": "mii",
                "status": "waiting",
                "created": 1_700_000_000_000u64,
                "last_update": 1_700_000_000_000u64,
                "assignee": null,
            },
            {
                "key": "b2",
                "type": "mii",
                "status": "canceled",
                "created": 1_700_000_000_000u64,
                "last_update": 1_700_000_060_000u64,
                "assignee": "rig-7",
            },
        ],
        "queue": ["a1"],
    }))
}

fn summary_keys(rows: &[JobTableRow]) -> Vec<&str> {
    rows.iter()
        .filter_map(|row| match row {
            JobTableRow::Summary(summary) => Some(summary.key.as_str()),
            JobTableRow::Inspect { .. } => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Job table
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_renders_rows_and_queue() {
    let state = MockState {
        jobs_reply: Some(listing()),
        ..MockState::default()
    };
    let service = spawn_service(state).await;
    let prompt = RecordingPrompt::default();
    let mut monitor = AdminJobMonitor::new(service.api());

    assert!(monitor.rows().is_empty());
    assert_eq!(monitor.queue_text(), EMPTY_QUEUE_PLACEHOLDER);

    assert!(monitor.refresh(&prompt).await);

    let rows = monitor.rows();
    assert_eq!(summary_keys(&rows), vec!["a1", "b2"]);
    assert_matches!(&rows[0], JobTableRow::Summary(row) if row.action == JobAction::Cancel && row.assignee.is_empty());
    assert_matches!(&rows[1], JobTableRow::Summary(row) if row.action == JobAction::Reset && row.assignee == "rig-7");
    assert_eq!(monitor.queue_text(), "a1");
}

#[tokio::test]
async fn overlay_survives_refresh() {
    let state = MockState {
        jobs_reply: Some(listing()),
        ..MockState::default()
    };
    let service = spawn_service(state).await;
    let prompt = RecordingPrompt::default();
    let mut monitor = AdminJobMonitor::new(service.api());

    monitor.refresh(&prompt).await;
    monitor.set_filter("rig-7");
    assert!(monitor.toggle_inspect("b2"));
    let before = monitor.rows();

    monitor.refresh(&prompt).await;
    let after = monitor.rows();

    assert_eq!(before, after);
    assert_eq!(summary_keys(&after), vec!["b2"]);
    assert_matches!(&after[1], JobTableRow::Inspect { key, .. } if key == "b2");
}

#[tokio::test]
async fn failed_refresh_keeps_previous_table() {
    let state = MockState {
        jobs_reply: Some(listing()),
        ..MockState::default()
    };
    let service = spawn_service(state).await;
    let prompt = RecordingPrompt::default();
    let mut monitor = AdminJobMonitor::new(service.api());

    monitor.refresh(&prompt).await;
    service.state().jobs_reply = Some(Reply::error(StatusCode::UNAUTHORIZED, "Unauthorized"));

    assert!(!monitor.refresh(&prompt).await);
    assert_eq!(summary_keys(&monitor.rows()), vec!["a1", "b2"]);
    assert_eq!(
        prompt.alerts(),
        vec!["Error retrieving jobs: Unauthorized".to_string()]
    );
}

#[tokio::test]
async fn odd_job_record_does_not_hide_the_listing() {
    let state = MockState {
        jobs_reply: Some(Reply::success(json!({
            "jobs": [
                { "key": "a1", "status": "waiting" },
                { "key": "b2", "status": null },
                { "key": 7, "status": "done" },
                "not a job",
            ],
            "queue": [],
        }))),
        ..MockState::default()
    };
    let service = spawn_service(state).await;
    let prompt = RecordingPrompt::default();
    let mut monitor = AdminJobMonitor::new(service.api());

    assert!(monitor.refresh(&prompt).await);
    assert_eq!(summary_keys(&monitor.rows()), vec!["a1", "b2", "7"]);
    assert!(prompt.alerts().is_empty());
}

#[tokio::test]
async fn cancel_and_reset_always_refetch() {
    let state = MockState {
        jobs_reply: Some(listing()),
        reset_reply: Some(Reply::error(StatusCode::BAD_REQUEST, "Job not canceled")),
        ..MockState::default()
    };
    let service = spawn_service(state).await;
    let prompt = RecordingPrompt::default();
    let mut monitor = AdminJobMonitor::new(service.api());

    monitor.cancel_job("a1", &prompt).await;
    monitor.reset_job("a1", &prompt).await;

    let state = service.state();
    assert_eq!(state.cancel_calls, vec!["a1".to_string()]);
    assert_eq!(state.reset_calls, vec!["a1".to_string()]);
    assert_eq!(state.list_jobs_calls, 2);
    assert_eq!(
        prompt.alerts(),
        vec!["Error resetting job: Job not canceled".to_string()]
    );
}

// ---------------------------------------------------------------------------
// Fleet and orchestration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn worker_tables_fail_independently() {
    let state = MockState {
        miners_reply: Some(Reply::success(json!({
            "miners": [{ "name": "rig-7", "ip": "10.0.0.7", "version": "1.2", "last_update": 1_700_000_000_000u64 }]
        }))),
        friendbots_reply: Some(Reply::raw(StatusCode::BAD_GATEWAY, "bad gateway")),
        ..MockState::default()
    };
    let service = spawn_service(state).await;
    let prompt = RecordingPrompt::default();
    let mut fleet = FleetMonitor::new(service.api());

    assert_eq!(fleet.refresh(&prompt).await, (true, false));

    let miners = fleet.miners.rows();
    assert_eq!(miners.len(), 1);
    assert_eq!(miners[0].name, "rig-7");
    assert_eq!(miners[0].last_update, "2023-11-14 22:13:20 UTC");
    assert!(fleet.friendbots.rows().is_empty());
    assert_eq!(
        prompt.alerts(),
        vec!["Error retrieving friendbots: 502 - Bad Gateway".to_string()]
    );
}

#[tokio::test]
async fn refresh_all_stamps_time_even_on_failure() {
    let state = MockState {
        jobs_reply: Some(listing()),
        miners_reply: Some(Reply::error(StatusCode::INTERNAL_SERVER_ERROR, "db down")),
        ..MockState::default()
    };
    let service = spawn_service(state).await;
    let prompt = RecordingPrompt::default();
    let mut console = AdminConsole::new(service.api(), Duration::from_secs(15));

    assert!(console.last_refreshed().is_none());
    let report = console.refresh_all(&prompt).await;

    assert!(report.jobs);
    assert!(!report.miners);
    assert!(report.friendbots);
    assert!(!report.all_ok());
    assert!(console.last_refreshed().is_some());
    assert_eq!(summary_keys(&console.jobs.rows()), vec!["a1", "b2"]);
    assert_eq!(
        prompt.alerts(),
        vec!["Error retrieving miners: db down".to_string()]
    );
}

#[tokio::test]
async fn run_loop_refreshes_and_applies_commands() {
    let state = MockState {
        jobs_reply: Some(listing()),
        ..MockState::default()
    };
    let service = spawn_service(state).await;
    let prompt = RecordingPrompt::default();
    let mut console = AdminConsole::new(service.api(), Duration::from_secs(60));

    let (tx, rx) = mpsc::channel(8);
    tx.send(AdminCommand::SetFilter("canceled".into())).await.unwrap();
    tx.send(AdminCommand::ToggleInspect("b2".into())).await.unwrap();
    drop(tx);

    tokio::time::timeout(
        Duration::from_secs(5),
        console.run(&prompt, rx, CancellationToken::new(), |_| {}),
    )
    .await
    .expect("run loop should stop when commands close");

    let rows = console.jobs.rows();
    assert_eq!(summary_keys(&rows), vec!["b2"]);
    assert_eq!(rows.len(), 2);
    assert!(console.last_refreshed().is_some());
}

#[tokio::test]
async fn run_loop_refreshes_before_any_command() {
    let state = MockState {
        jobs_reply: Some(listing()),
        ..MockState::default()
    };
    let service = spawn_service(state).await;
    let prompt = RecordingPrompt::default();
    let mut console = AdminConsole::new(service.api(), Duration::from_secs(60));

    let (tx, rx) = mpsc::channel(1);
    drop(tx);

    let mut seen = Vec::new();
    tokio::time::timeout(
        Duration::from_secs(5),
        console.run(&prompt, rx, CancellationToken::new(), |console| {
            seen.push((console.last_refreshed().is_some(), console.jobs.snapshot().is_some()));
        }),
    )
    .await
    .expect("run loop should stop when commands close");

    assert_eq!(seen, vec![(true, true)]);
    assert_eq!(service.state().list_jobs_calls, 1);
}
