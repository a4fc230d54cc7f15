//! Error types for lunadm.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for lunadm operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Operator input errors (target string, connection type, prompts)
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Transport-level errors (connect, authentication, host keys)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Connection facade errors
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
}

/// Errors caused directly by what the operator supplied.
#[derive(Error, Debug)]
pub enum InputError {
    /// The target string did not name a host
    #[error("Hostname required")]
    MissingHost,

    /// The port part of the target is not a valid port number
    #[error("Invalid port '{value}'")]
    InvalidPort { value: String },

    /// The connection type name is not one of the known types
    #[error("Unsupported connection type '{name}'")]
    UnsupportedConnectionType { name: String },

    /// The connection type needs credentials and none were resolved
    #[error("{kind} connections require credentials")]
    MissingCredentials { kind: &'static str },

    /// A LUN subcommand was given no LUN names
    #[error("'{subcommand}' needs at least one LUN name")]
    MissingLunNames { subcommand: &'static str },

    /// Neither a subcommand nor a raw command was given
    #[error("No command given; use a subcommand or --command")]
    MissingCommand,

    /// Reading an interactive prompt failed
    #[error("Failed to read from terminal: {0}")]
    Prompt(#[source] io::Error),
}

/// Transport layer errors (socket connect, SSH handshake, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Server presented a key different from the trusted one
    #[error("Host key for {host}:{port} does not match the known_hosts entry")]
    HostKeyMismatch { host: String, port: u16 },

    /// Strict checking is on and the host has no known_hosts entry
    #[error("No trusted host key for {host}:{port}")]
    HostKeyUnknown { host: String, port: u16 },

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Invalid prompt pattern
    #[error("Invalid prompt pattern: {0}")]
    InvalidPattern(#[source] regex::Error),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Session state machine violations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Operation called in a state that does not allow it
    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: crate::transport::SessionState,
    },

    /// Telnet sessions run a single command before the peer hangs up
    #[error("Session already executed its command")]
    AlreadyExecuted,
}

/// Connection facade errors.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The connection type is recognised but has no transport
    #[error("{kind} connections are not implemented")]
    NotImplemented { kind: crate::connection::ConnectionType },
}

impl Error {
    /// Whether the error came from operator input rather than the remote side.
    pub fn is_input(&self) -> bool {
        matches!(self, Error::Input(_))
    }
}

/// Result type alias using lunadm's Error.
pub type Result<T> = std::result::Result<T, Error>;
