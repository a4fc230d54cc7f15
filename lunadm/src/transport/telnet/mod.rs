//! Telnet session implementation.
//!
//! A Telnet session is single-shot: `execute` sends the command followed by
//! `exit` and collects everything the peer writes until it hangs up.

mod negotiation;

pub use negotiation::{Filtered, Negotiator, escape};

use std::time::Duration;

use log::{debug, trace, warn};
use regex::bytes::Regex;
use secrecy::ExposeSecret;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::config::SessionConfig;
use super::session::{CommandOutput, Session, SessionState, require_connected, with_deadline};
use crate::credentials::Credentials;
use crate::error::{Result, SessionError, TransportError};

/// Port used when the target does not name one.
pub const DEFAULT_TELNET_PORT: u16 = 23;

/// How long to wait for each login prompt when no session timeout is set.
const LOGIN_PROMPT_TIMEOUT: Duration = Duration::from_secs(10);

const LOGIN_PROMPT: &str = r"(?i-u)login:\s*$";
const PASSWORD_PROMPT: &str = r"(?i-u)password:\s*$";

/// Telnet session to a storage controller.
pub struct TelnetSession {
    host: String,
    port: u16,
    credentials: Option<Credentials>,
    config: SessionConfig,
    stream: Option<TcpStream>,
    negotiator: Negotiator,
    /// Data read past the last matched prompt.
    pending: Vec<u8>,
    executed: bool,
    state: SessionState,
}

impl TelnetSession {
    /// Create an unconnected session.
    ///
    /// With credentials, `connect` answers the peer's `login:` and
    /// `Password:` prompts after the socket is open.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        credentials: Option<Credentials>,
        config: SessionConfig,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            credentials,
            config,
            stream: None,
            negotiator: Negotiator::new(),
            pending: Vec::new(),
            executed: false,
            state: SessionState::Unconnected,
        }
    }

    /// Read one chunk, answer any negotiation in it and return the data.
    ///
    /// An empty result means the peer closed the connection.
    async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let stream = self.stream.as_mut().ok_or(TransportError::Disconnected)?;

        let mut buf = [0u8; 4096];
        let n = stream.read(&mut buf).await.map_err(TransportError::Io)?;
        if n == 0 {
            return Ok(None);
        }

        let Filtered { data, replies } = self.negotiator.feed(&buf[..n]);
        if !replies.is_empty() {
            trace!("telnet: refusing {} bytes of option negotiation", replies.len());
            // The peer may already be hanging up after `exit`.
            if let Err(e) = stream.write_all(&replies).await {
                debug!("telnet: failed to send negotiation reply: {}", e);
            }
        }
        Ok(Some(data))
    }

    /// Read until `pattern` matches the accumulated data.
    async fn read_until(&mut self, pattern: &Regex) -> Result<Vec<u8>> {
        let mut buffer = std::mem::take(&mut self.pending);
        loop {
            if let Some(m) = pattern.find(&buffer) {
                self.pending = buffer.split_off(m.end());
                return Ok(buffer);
            }
            match self.read_chunk().await? {
                Some(data) => buffer.extend_from_slice(&data),
                None => return Err(TransportError::Disconnected.into()),
            }
        }
    }

    /// Read until the peer closes the connection.
    async fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut buffer = std::mem::take(&mut self.pending);
        while let Some(data) = self.read_chunk().await? {
            buffer.extend_from_slice(&data);
        }
        Ok(buffer)
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(TransportError::Disconnected)?;
        let mut framed = escape(line.as_bytes()).into_owned();
        framed.push(b'\n');
        stream.write_all(&framed).await.map_err(TransportError::Io)?;
        Ok(())
    }

    /// Answer the login and password prompts.
    async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let deadline = Some(self.config.timeout.unwrap_or(LOGIN_PROMPT_TIMEOUT));
        let login = Regex::new(LOGIN_PROMPT).map_err(TransportError::InvalidPattern)?;
        let password_prompt = Regex::new(PASSWORD_PROMPT).map_err(TransportError::InvalidPattern)?;

        with_deadline(deadline, self.read_until(&login)).await?;
        self.write_line(username).await?;
        with_deadline(deadline, self.read_until(&password_prompt)).await?;
        self.write_line(password).await?;
        debug!("telnet: sent credentials for {}", username);
        Ok(())
    }

    async fn open(&self) -> Result<TcpStream> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|source| TransportError::ConnectionFailed {
                host: self.host.clone(),
                port: self.port,
                source,
            })?;
        Ok(stream)
    }

    async fn run(&mut self, command: &str) -> Result<String> {
        self.write_line(command.trim_end_matches(['\r', '\n'])).await?;
        self.write_line("exit").await?;
        let output = self.read_all().await?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

impl Session for TelnetSession {
    async fn connect(&mut self) -> Result<()> {
        if self.state != SessionState::Unconnected {
            return Err(SessionError::InvalidState {
                operation: "connect",
                state: self.state,
            }
            .into());
        }

        debug!("Connecting to {}:{} over Telnet", self.host, self.port);
        let stream = with_deadline(self.config.timeout, self.open()).await?;
        self.stream = Some(stream);
        self.state = SessionState::Connected;

        if let Some(credentials) = self.credentials.take() {
            let username = credentials.username.clone();
            let result = self
                .login(&username, credentials.password.expose_secret())
                .await;
            if let Err(e) = result {
                warn!("Telnet login to {} as {} failed: {}", self.host, username, e);
            }
        }

        Ok(())
    }

    async fn execute(&mut self, command: &str) -> Result<CommandOutput> {
        require_connected(self.state, "execute")?;
        if self.executed {
            return Err(SessionError::AlreadyExecuted.into());
        }
        self.executed = true;

        debug!("Executing over Telnet: {}", command);
        let timeout = self.config.timeout;
        let output = with_deadline(timeout, self.run(command)).await?;
        Ok(CommandOutput::Text(output))
    }

    async fn close(&mut self) -> Result<bool> {
        self.state = SessionState::Closed;

        let Some(mut stream) = self.stream.take() else {
            return Ok(true);
        };

        match stream.shutdown().await {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("Failed to close Telnet connection to {}: {}", self.host, e);
                Ok(false)
            }
        }
    }

    fn state(&self) -> SessionState {
        self.state
    }
}
