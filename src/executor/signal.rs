use nix::sys::signal::{signal, SigHandler, Signal};
use crate::config::SessionConfig;

/// Signals the shell ignores for its own lifetime. Children put them back to
/// the default disposition so interactive signals reach the foreground job.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalPolicy {
    signals: Vec<Signal>,
}

impl SignalPolicy {
    pub fn new(signals: Vec<Signal>) -> Self {
        SignalPolicy { signals }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        SignalPolicy::new(config.ignored_signals.clone())
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Called once at shell startup.
    pub fn ignore_in_shell(&self) -> nix::Result<()> {
        for &sig in &self.signals {
            unsafe { signal(sig, SigHandler::SigIgn) }?;
        }
        Ok(())
    }

    /// Called in a freshly forked child, before any exec. SIGPIPE is reset
    /// as well: the Rust runtime ignores it in the shell, and an ignored
    /// disposition survives exec.
    pub fn restore_defaults(&self) {
        for &sig in self.signals.iter().chain(&[Signal::SIGPIPE]) {
            let _ = unsafe { signal(sig, SigHandler::SigDfl) };
        }
    }
}
