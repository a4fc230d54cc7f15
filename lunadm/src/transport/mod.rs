//! Transport sessions.
//!
//! Each transport owns the connect/execute/close lifecycle for one kind of
//! remote session. Callers normally go through
//! [`Connection`](crate::connection::Connection) instead of using these
//! directly.

pub mod config;
mod session;
mod ssh;
pub mod streams;
pub mod telnet;
#[cfg(test)]
pub(crate) mod testing;

pub use config::{HostKeyPolicy, SessionConfig};
pub use session::{CommandOutput, Session, SessionState};
pub use ssh::SshSession;
pub use streams::{ExecStreams, InputStream, OutputStream};
pub use telnet::{DEFAULT_TELNET_PORT, TelnetSession};
