//! `miimine` -- terminal client and operator console for the Mii mining
//! job service.
//!
//! Configuration comes from the environment (a `.env` file is honoured);
//! see [`ClientConfig::from_env`] for the variables. `--api-url` and
//! `--id0` override the environment and the cookie jar respectively.
//! Logs go to stderr and are filtered by `RUST_LOG`.

mod cli;
mod commands;
mod prompt;
mod render;

use clap::Parser;
use miimine_client::prompt::{LoggingPrompt, UserPrompt};
use miimine_client::{ClientConfig, MiningApi};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};
use commands::Session;
use prompt::ConsolePrompt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "miimine=info,miimine_client=info,miimine_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url.clone() {
        config.api_url = api_url;
    }

    let api = MiningApi::with_timeout(config.api_url.clone(), config.request_timeout)?
        .with_admin_credentials(config.admin.clone());

    tracing::debug!(
        api_url = %config.api_url,
        poll_secs = config.poll_interval.as_secs(),
        "Starting miimine",
    );

    let session = Session {
        config,
        api,
        id0_override: cli.id0.clone(),
    };

    if cli.yes {
        dispatch(&session, cli.command, LoggingPrompt { confirm_answer: true }).await
    } else {
        dispatch(&session, cli.command, ConsolePrompt).await
    }
}

async fn dispatch<P: UserPrompt>(
    session: &Session,
    command: Commands,
    prompt: P,
) -> anyhow::Result<()> {
    match command {
        Commands::Submit(args) => commands::submit(session, args, prompt).await,
        Commands::Watch => commands::watch(session, prompt).await,
        Commands::Status => commands::status(session, prompt).await,
        Commands::Cancel => commands::cancel(session, prompt).await,
        Commands::Dismiss => commands::dismiss(session, prompt).await,
        Commands::Stats => commands::stats(session).await,
        Commands::Admin => commands::admin(session, prompt).await,
    }
}
