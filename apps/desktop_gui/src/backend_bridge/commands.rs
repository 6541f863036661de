//! Backend commands queued from UI to backend worker.

use client_core::FormEffect;

pub enum BackendCommand {
    /// Perform one form effect and report its outcome.
    Perform(FormEffect),
    Shutdown,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Perform(effect) => effect.name(),
            BackendCommand::Shutdown => "shutdown",
        }
    }
}
