//! Blocking yes/no confirmation

/// Asked before destructive operations.
pub trait ConfirmPrompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Prompt with a preset answer (`--yes`, scripted runs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAnswer(pub bool);

impl ConfirmPrompt for FixedAnswer {
    fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}
