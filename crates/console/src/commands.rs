//! Subcommand drivers.

use std::path::Path;

use anyhow::Context;
use miimine_client::controller::JobController;
use miimine_client::cookies::FileCookieStore;
use miimine_client::orchestrator::AdminConsole;
use miimine_client::prompt::UserPrompt;
use miimine_client::{ClientConfig, MiningApi};
use miimine_core::identity::{IdentityResolver, SessionHistory};
use miimine_core::presenter::Screen;
use miimine_core::submission::{MiiSource, MiiSubmission};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cli::{parse_admin_line, parse_watch_line, SubmitArgs};
use crate::render;

type Controller<P> = JobController<FileCookieStore, SessionHistory, P>;

/// Everything a subcommand needs, resolved from config and flags.
pub struct Session {
    pub config: ClientConfig,
    pub api: MiningApi,
    pub id0_override: Option<String>,
}

impl Session {
    fn controller<P: UserPrompt>(&self, prompt: P) -> Controller<P> {
        let cookies = FileCookieStore::open(&self.config.cookie_jar);
        let navigation = SessionHistory::with_identity(self.id0_override.as_deref());
        JobController::new(
            self.api.clone(),
            IdentityResolver::new(cookies, navigation),
            prompt,
            self.config.poll_interval,
        )
    }
}

pub async fn submit<P: UserPrompt>(
    session: &Session,
    args: SubmitArgs,
    prompt: P,
) -> anyhow::Result<()> {
    let source = match (args.file, args.url) {
        (Some(path), _) => file_source(&path)?,
        (None, Some(url)) => MiiSource::Url(url),
        (None, None) => anyhow::bail!("either --file or --url is required"),
    };
    let submission = MiiSubmission {
        id0: args.job_id0,
        model: args.model,
        year: args.year,
        source,
    };

    let mut controller = session.controller(prompt);
    controller.submit(submission).await;
    println!("{}", render::screen(&controller.screen()));

    if !args.no_watch && controller.phase().is_polling() {
        follow(&mut controller).await;
    }
    offer_dismiss(&mut controller);
    Ok(())
}

pub async fn watch<P: UserPrompt>(session: &Session, prompt: P) -> anyhow::Result<()> {
    let mut controller = session.controller(prompt);
    controller.resume().await;
    println!("{}", render::screen(&controller.screen()));

    if controller.phase().is_polling() {
        follow(&mut controller).await;
    }
    offer_dismiss(&mut controller);
    Ok(())
}

pub async fn status<P: UserPrompt>(session: &Session, prompt: P) -> anyhow::Result<()> {
    let mut controller = session.controller(prompt);
    controller.resume().await;
    println!("{}", render::screen(&controller.screen()));
    offer_dismiss(&mut controller);
    Ok(())
}

pub async fn cancel<P: UserPrompt>(session: &Session, prompt: P) -> anyhow::Result<()> {
    let mut controller = session.controller(prompt);
    controller.resume().await;
    if controller.identity().is_none() {
        println!("No job tracked.");
        return Ok(());
    }
    controller.cancel().await;
    println!("{}", render::screen(&controller.screen()));
    Ok(())
}

pub async fn dismiss<P: UserPrompt>(session: &Session, prompt: P) -> anyhow::Result<()> {
    let mut controller = session.controller(prompt);
    controller.resume().await;
    if controller.identity().is_none() {
        println!("No job tracked.");
        return Ok(());
    }
    if !controller.phase().is_terminal() {
        println!("Job is still in progress; use `miimine cancel` to stop it.");
        return Ok(());
    }
    controller.dismiss();
    println!("{}", render::screen(&controller.screen()));
    Ok(())
}

pub async fn stats(session: &Session) -> anyhow::Result<()> {
    let stats = session
        .api
        .network_stats()
        .await
        .context("Error retrieving network stats")?;
    println!("{}", render::stats(&stats));
    Ok(())
}

pub async fn admin<P: UserPrompt>(session: &Session, prompt: P) -> anyhow::Result<()> {
    let mut console = AdminConsole::new(session.api.clone(), session.config.admin_refresh_interval);
    let (tx, rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();

    eprintln!(
        "Commands: r refresh | f <text> filter | i <key> inspect | c <key> cancel \
         | x <key> reset | q quit"
    );
    let reader = spawn_line_reader(tx, cancel.clone(), parse_admin_line);

    console
        .run(&prompt, rx, cancel.clone(), |console| {
            println!("{}\n", render::admin(console));
        })
        .await;

    cancel.cancel();
    reader.abort();
    Ok(())
}

// ---- private helpers ----

fn file_source(path: &Path) -> anyhow::Result<MiiSource> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read Mii file {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(MiiSource::File { file_name, bytes })
}

/// Follow a polling job until it leaves the in-progress screen, taking
/// cancel / dismiss / status commands from stdin.
async fn follow<P: UserPrompt>(controller: &mut Controller<P>) {
    eprintln!("Commands: s status | c cancel | d dismiss | q quit");
    let (tx, rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let reader = spawn_line_reader(tx, cancel.clone(), parse_watch_line);

    let stop = cancel.clone();
    let mut last = Some(controller.screen());
    controller
        .run(rx, cancel.clone(), |screen| {
            if last.as_ref() != Some(screen) {
                println!("{}", render::screen(screen));
                last = Some(screen.clone());
            }
            if !matches!(screen, Screen::InProgress { .. }) {
                stop.cancel();
            }
        })
        .await;

    cancel.cancel();
    reader.abort();
}

/// On a terminal screen, ask whether to clear the job.
fn offer_dismiss<P: UserPrompt>(controller: &mut Controller<P>) {
    if controller.acknowledge() {
        println!("{}", render::screen(&controller.screen()));
    }
}

/// Forward parsed stdin lines to `tx` until a quit line or `cancel`.
fn spawn_line_reader<T, F>(
    tx: mpsc::Sender<T>,
    cancel: CancellationToken,
    parse: F,
) -> tokio::task::JoinHandle<()>
where
    T: Send + 'static,
    F: Fn(&str) -> Result<Option<T>, String> + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) => match parse(&line) {
                    Ok(Some(command)) => {
                        if tx.send(command).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        cancel.cancel();
                        break;
                    }
                    Err(message) => eprintln!("{message}"),
                },
                // EOF: keep following on the timer alone.
                Ok(None) => {
                    cancel.cancelled().await;
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    })
}
