//! Builder for creating connections.

use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use secrecy::SecretString;

use super::{Connection, ConnectionType};
use crate::credentials::{CredentialResolver, Prompter, TargetSpec};
use crate::error::Result;
use crate::transport::{HostKeyPolicy, SessionConfig};

/// Builder for constructing a [`Connection`] from operator input.
///
/// # Example
///
/// ```rust,no_run
/// use lunadm::connection::ConnectionBuilder;
/// use lunadm::credentials::TerminalPrompter;
/// use lunadm::transport::Session;
///
/// # async fn example() -> Result<(), lunadm::Error> {
/// let mut conn = ConnectionBuilder::new("root@filer01")
///     .connection_type("SSH")
///     .build(TerminalPrompter)?;
/// conn.connect().await?;
/// # Ok(())
/// # }
/// ```
pub struct ConnectionBuilder {
    target: String,
    connection_type: String,
    password: Option<SecretString>,
    timeout: Option<Duration>,
    host_key_policy: HostKeyPolicy,
    known_hosts_paths: Vec<PathBuf>,
}

impl ConnectionBuilder {
    /// Create a builder for a `[user@]host[:port]` target string.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            connection_type: ConnectionType::Ssh.as_str().to_string(),
            password: None,
            timeout: None,
            host_key_policy: HostKeyPolicy::default(),
            known_hosts_paths: Vec::new(),
        }
    }

    /// Set the connection type by name (default: "SSH").
    pub fn connection_type(mut self, name: impl Into<String>) -> Self {
        self.connection_type = name.into();
        self
    }

    /// Supply the password up front instead of prompting for it.
    pub fn password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    /// Set the deadline for connect and execute.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the host key verification mode.
    pub fn host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }

    /// Add a known_hosts file to consult instead of the defaults.
    pub fn known_hosts(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_paths.push(path.into());
        self
    }

    /// Build the connection.
    ///
    /// The connection type and target are validated before `prompter` is
    /// asked anything. SSH always resolves credentials; Telnet only does so
    /// when the target names a user. The returned connection is not yet
    /// connected.
    pub fn build<P: Prompter>(self, prompter: P) -> Result<Connection> {
        let kind: ConnectionType = self.connection_type.parse()?;
        let target = TargetSpec::parse(&self.target)?;

        let needs_credentials = match kind {
            ConnectionType::Ssh => true,
            ConnectionType::Telnet => target.user.is_some(),
            ConnectionType::Rsh | ConnectionType::Zapi | ConnectionType::Http => false,
        };

        let credentials = if needs_credentials {
            let mut resolver = CredentialResolver::new(prompter);
            Some(resolver.credentials_for(&target, self.password)?)
        } else {
            None
        };

        let config = SessionConfig {
            timeout: self.timeout,
            host_key_policy: self.host_key_policy,
            known_hosts_paths: self.known_hosts_paths,
        };

        debug!("Building {} connection for {}", kind, target);
        Connection::new(kind, target, credentials, config)
    }
}
