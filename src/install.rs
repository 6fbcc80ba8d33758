//! Deferred "install as app" prompt.
//!
//! A host that can offer a native install (a PWA shell, a desktop wrapper)
//! hands its prompt to [`InstallPromptSlot::capture`] when the platform raises
//! it. The slot holds at most one prompt and gives it up exactly once. It is
//! independent of [`crate::Session`] and never touches the solve lifecycle.

use futures::future::BoxFuture;
use tracing::info;

/// What the user chose when the prompt was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Accepted,
    Dismissed,
}

/// A platform install prompt that can be shown once.
pub trait InstallPrompt: Send {
    /// Show the prompt and resolve with the user's choice.
    fn show(self) -> BoxFuture<'static, InstallOutcome>;
}

/// Holds the most recently captured prompt until it is used.
pub struct InstallPromptSlot<P> {
    pending: Option<P>,
}

impl<P> Default for InstallPromptSlot<P> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<P: InstallPrompt> InstallPromptSlot<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stash a prompt, replacing any earlier one.
    pub fn capture(&mut self, prompt: P) {
        self.pending = Some(prompt);
    }

    /// Whether an install affordance should be offered.
    pub fn is_available(&self) -> bool {
        self.pending.is_some()
    }

    /// Show the captured prompt and clear the slot.
    ///
    /// Returns `None` when nothing was captured.
    pub async fn prompt_install(&mut self) -> Option<InstallOutcome> {
        let prompt = self.pending.take()?;
        let outcome = prompt.show().await;
        match outcome {
            InstallOutcome::Accepted => info!("User accepted the install prompt"),
            InstallOutcome::Dismissed => info!("User dismissed the install prompt"),
        }
        Some(outcome)
    }
}
