//! User-facing notification port.
//!
//! Alerts and confirmations are how every failure and every decision
//! reaches the person driving the client. The terminal front end prints
//! and reads stdin; tests record.

/// Blocking alert / confirm dialogs.
pub trait UserPrompt {
    /// Show a message the user must see.
    fn alert(&self, message: &str);

    /// Ask a yes/no question.
    fn confirm(&self, message: &str) -> bool;
}

impl<P: UserPrompt + ?Sized> UserPrompt for &P {
    fn alert(&self, message: &str) {
        (**self).alert(message)
    }

    fn confirm(&self, message: &str) -> bool {
        (**self).confirm(message)
    }
}

/// Prompt that logs alerts and answers every confirmation the same way.
#[derive(Debug, Clone, Copy)]
pub struct LoggingPrompt {
    pub confirm_answer: bool,
}

impl UserPrompt for LoggingPrompt {
    fn alert(&self, message: &str) {
        tracing::warn!(message, "Alert");
    }

    fn confirm(&self, message: &str) -> bool {
        tracing::info!(message, answer = self.confirm_answer, "Confirm");
        self.confirm_answer
    }
}
