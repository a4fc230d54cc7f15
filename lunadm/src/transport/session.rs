//! The transport-agnostic session contract.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use super::streams::ExecStreams;
use crate::error::{Result, SessionError, TransportError};

/// Lifecycle of a session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not yet connected (or a connect attempt failed).
    Unconnected,

    /// Connected and authenticated.
    Connected,

    /// Closed; the session cannot be reused.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unconnected => "unconnected",
            SessionState::Connected => "connected",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// What a command execution hands back.
#[derive(Debug)]
pub enum CommandOutput {
    /// Live stdin/stdout/stderr handles (SSH).
    Streams(ExecStreams),

    /// Everything the peer sent before hanging up (Telnet).
    Text(String),
}

impl CommandOutput {
    /// Collect the whole of standard output as text.
    ///
    /// For streamed output this waits for the remote command to finish.
    pub async fn into_text(self) -> std::io::Result<String> {
        match self {
            CommandOutput::Streams(streams) => streams.read_stdout_to_string().await,
            CommandOutput::Text(text) => Ok(text),
        }
    }
}

/// A connection to one remote host over one transport.
pub trait Session: Send {
    /// Connect and authenticate.
    fn connect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Run a single command.
    fn execute(&mut self, command: &str) -> impl Future<Output = Result<CommandOutput>> + Send;

    /// Close the session.
    ///
    /// Always leaves the session [`Closed`](SessionState::Closed). Returns
    /// `false` if the transport reported an error while shutting down; the
    /// error is logged rather than returned.
    fn close(&mut self) -> impl Future<Output = Result<bool>> + Send;

    /// Current lifecycle state.
    fn state(&self) -> SessionState;
}

/// Fail with `InvalidState` unless `state` is `Connected`.
pub(crate) fn require_connected(state: SessionState, operation: &'static str) -> Result<()> {
    if state == SessionState::Connected {
        Ok(())
    } else {
        Err(SessionError::InvalidState { operation, state }.into())
    }
}

/// Run `fut`, bounded by `timeout` when one is set.
pub(crate) async fn with_deadline<F, T>(timeout: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| TransportError::Timeout(limit))?,
        None => fut.await,
    }
}
