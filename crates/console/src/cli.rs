use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use miimine_client::controller::ControllerCommand;
use miimine_client::orchestrator::AdminCommand;

#[derive(Debug, Parser)]
#[command(name = "miimine", version, about = "Mii mining job client and operator console")]
pub struct Cli {
    /// Base URL of the job service (overrides MIIMINE_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Track this job instead of the one in the cookie jar
    #[arg(long, global = true, value_name = "ID0")]
    pub id0: Option<String>,

    /// Answer every confirmation with yes and log alerts instead of printing
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Submit a new mining job and follow it
    Submit(SubmitArgs),
    /// Follow the tracked job until it finishes
    Watch,
    /// Check the tracked job once
    Status,
    /// Cancel the tracked job
    Cancel,
    /// Clear a finished, failed or canceled job
    Dismiss,
    /// Show service-wide queue counters
    Stats,
    /// Operator console: jobs, queue, miners and friendbots
    Admin,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("mii").required(true).args(["file", "url"])))]
pub struct SubmitArgs {
    /// 32-character hex console identifier
    #[arg(value_name = "ID0")]
    pub job_id0: String,

    /// Console model: old or new
    #[arg(short, long)]
    pub model: String,

    /// Year of manufacture (2011-2020)
    #[arg(long)]
    pub year: Option<String>,

    /// Mii data file to upload
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// URL to fetch the Mii data from
    #[arg(short, long)]
    pub url: Option<String>,

    /// Print the first status and exit instead of following the job
    #[arg(long)]
    pub no_watch: bool,
}

/// A line typed while following a job. `None` means quit.
pub fn parse_watch_line(line: &str) -> Result<Option<ControllerCommand>, String> {
    match line.trim() {
        "q" | "quit" => Ok(None),
        "c" | "cancel" => Ok(Some(ControllerCommand::Cancel)),
        "d" | "dismiss" => Ok(Some(ControllerCommand::Dismiss)),
        "" | "s" | "status" => Ok(Some(ControllerCommand::CheckStatus)),
        other => Err(format!("unknown command '{other}' (s, c, d, q)")),
    }
}

/// A line typed in the operator console. `None` means quit.
pub fn parse_admin_line(line: &str) -> Result<Option<AdminCommand>, String> {
    let line = line.trim();
    let (verb, arg) = line.split_once(' ').unwrap_or((line, ""));
    let arg = arg.trim();

    let require_key = |build: fn(String) -> AdminCommand| {
        if arg.is_empty() {
            Err(format!("'{verb}' needs a job key"))
        } else {
            Ok(Some(build(arg.to_string())))
        }
    };

    match verb {
        "q" | "quit" => Ok(None),
        "" | "r" | "refresh" => Ok(Some(AdminCommand::Refresh)),
        "f" | "filter" => Ok(Some(AdminCommand::SetFilter(arg.to_string()))),
        "i" | "inspect" => require_key(AdminCommand::ToggleInspect),
        "c" | "cancel" => require_key(AdminCommand::CancelJob),
        "x" | "reset" => require_key(AdminCommand::ResetJob),
        other => Err(format!("unknown command '{other}' (r, f, i, c, x, q)")),
    }
}
