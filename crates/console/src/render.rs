//! Plain-text rendering of presenter output and admin tables.

use miimine_client::orchestrator::AdminConsole;
use miimine_core::envelope::NetworkStats;
use miimine_core::jobs_table::JobTableRow;
use miimine_core::presenter::Screen;
use miimine_core::workers::{WorkerKind, WorkerRow};

pub fn screen(screen: &Screen) -> String {
    match screen {
        Screen::SubmissionForm { feedback } => {
            let mut out = String::from("No job tracked. Start one with `miimine submit`.");
            if !feedback.is_empty() {
                let fields: Vec<&str> = feedback.fields().collect();
                out.push_str(&format!("\nInvalid fields: {}", fields.join(", ")));
            }
            out
        }
        Screen::InProgress { id0, message } => format!("Job {id0}\n{message}"),
        Screen::Completed { id0, download_url } => {
            format!("Job {id0} is done.\nDownload: {download_url}")
        }
        Screen::CanceledModal { id0 } => format!("Job {id0} was canceled."),
        Screen::FailedModal { id0 } => format!("Job {id0} failed."),
    }
}

pub fn stats(stats: &NetworkStats) -> String {
    format!(
        "Waiting: {}\nWorking: {}\nMiners online: {}\nTotal mined: {}",
        stats.waiting, stats.working, stats.miners, stats.total_mined
    )
}

pub fn job_table(rows: &[JobTableRow]) -> String {
    let mut lines = Vec::new();
    let mut summaries = Vec::new();

    // Summary rows are aligned as a block; inspect rows are spliced back
    // in after their summary.
    for row in rows {
        if let JobTableRow::Summary(summary) = row {
            summaries.push(vec![
                summary.key.clone(),
                summary.job_type.clone(),
                summary.status.clone(),
                summary.created.clone(),
                summary.last_update.clone(),
                summary.assignee.clone(),
                summary.action.label().to_string(),
            ]);
        }
    }
    let header = [
        "Key",
        "Type",
        "Status",
        "Created",
        "Last update",
        "Assignee",
        "Action",
    ];
    let mut aligned = table(&header, &summaries).into_iter();
    if let Some(head) = aligned.next() {
        lines.push(head);
    }

    for row in rows {
        match row {
            JobTableRow::Summary(_) => lines.extend(aligned.next()),
            JobTableRow::Inspect { json, .. } => {
                lines.extend(json.lines().map(|l| format!("    {l}")));
            }
        }
    }
    lines.join("\n")
}

pub fn worker_table(kind: WorkerKind, rows: &[WorkerRow]) -> String {
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|w| {
            vec![
                w.name.clone(),
                w.ip.clone(),
                w.version.clone(),
                w.last_update.clone(),
            ]
        })
        .collect();
    let mut lines = vec![format!("[{kind}]")];
    lines.extend(table(&["Name", "IP", "Version", "Last update"], &body));
    lines.join("\n")
}

/// Full operator view: jobs, queue, both worker tables and the refresh time.
pub fn admin(console: &AdminConsole) -> String {
    let refreshed = console
        .last_refreshed()
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let filter = console.jobs.overlay().filter();

    let mut out = String::new();
    out.push_str(&format!("Last refreshed: {refreshed}\n"));
    if !filter.is_empty() {
        out.push_str(&format!("Filter: {filter}\n"));
    }
    out.push_str(&job_table(&console.jobs.rows()));
    out.push_str("\n\n[queue]\n");
    out.push_str(&console.jobs.queue_text());
    out.push_str("\n\n");
    out.push_str(&worker_table(WorkerKind::Miners, &console.fleet.miners.rows()));
    out.push_str("\n\n");
    out.push_str(&worker_table(
        WorkerKind::Friendbots,
        &console.fleet.friendbots.rows(),
    ));
    out
}

/// Left-aligned columns, header first.
fn table(header: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(header.to_vec())];
    lines.extend(
        rows.iter()
            .map(|row| format_row(row.iter().map(String::as_str).collect())),
    );
    lines
}
