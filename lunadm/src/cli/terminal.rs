//! Terminal state and interrupt handling for the CLI.

use std::future::Future;

use log::debug;

/// Outcome of work raced against an interrupt.
#[derive(Debug, PartialEq, Eq)]
pub enum Interruptible<T> {
    Completed(T),
    Interrupted,
}

/// Run `work` until it finishes or `interrupt` fires, whichever is first.
pub async fn until_interrupted<F, I>(work: F, interrupt: I) -> Interruptible<F::Output>
where
    F: Future,
    I: Future,
{
    tokio::select! {
        output = work => Interruptible::Completed(output),
        _ = interrupt => Interruptible::Interrupted,
    }
}

/// RAII guard restoring the terminal settings of stdin.
///
/// A password prompt turns echo off while it reads. If the process is
/// interrupted mid-prompt the prompt never gets to turn it back on, so the
/// settings are captured up front and put back when the guard drops.
pub struct TerminalGuard {
    #[cfg(unix)]
    saved: Option<nix::sys::termios::Termios>,
}

impl TerminalGuard {
    /// Snapshot the current settings. Does nothing when stdin is not a
    /// terminal.
    #[cfg(unix)]
    pub fn capture() -> Self {
        let saved = match nix::sys::termios::tcgetattr(std::io::stdin()) {
            Ok(termios) => Some(termios),
            Err(e) => {
                debug!("Not capturing terminal settings: {}", e);
                None
            }
        };
        Self { saved }
    }

    #[cfg(not(unix))]
    pub fn capture() -> Self {
        debug!("Terminal settings are not captured on this platform");
        Self {}
    }

    /// Whether there is anything to restore.
    #[cfg(unix)]
    pub fn is_active(&self) -> bool {
        self.saved.is_some()
    }

    #[cfg(not(unix))]
    pub fn is_active(&self) -> bool {
        false
    }

    #[cfg(unix)]
    fn restore(&mut self) {
        use nix::sys::termios::{SetArg, tcsetattr};

        let Some(saved) = self.saved.take() else {
            return;
        };
        if let Err(e) = tcsetattr(std::io::stdin(), SetArg::TCSANOW, &saved) {
            debug!("Failed to restore terminal settings: {}", e);
        }
    }

    #[cfg(not(unix))]
    fn restore(&mut self) {}
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.restore();
    }
}
