use std::io::{self, BufRead, Write};

use miimine_client::prompt::UserPrompt;

/// Terminal prompt: alerts go to stderr, confirmations read a line from
/// stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt;

impl UserPrompt for ConsolePrompt {
    fn alert(&self, message: &str) {
        eprintln!("! {message}");
    }

    fn confirm(&self, message: &str) -> bool {
        eprint!("{message} [y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if let Err(e) = io::stdin().lock().read_line(&mut answer) {
            tracing::warn!(error = %e, "Could not read confirmation");
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
