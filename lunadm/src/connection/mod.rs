//! Connection facade.
//!
//! [`Connection`] gives callers one `connect` / `exec_cmd` / `close` surface
//! whatever the transport. It only routes calls to the session selected by
//! its [`ConnectionType`]; types without a transport fail loudly on every
//! call instead of doing nothing.

mod builder;
mod kind;

pub use builder::ConnectionBuilder;
pub use kind::ConnectionType;

use log::debug;

use crate::credentials::{Credentials, TargetSpec};
use crate::error::{ConnectionError, Error, InputError, Result};
use crate::transport::{
    CommandOutput, DEFAULT_TELNET_PORT, Session, SessionConfig, SessionState, SshSession,
    TelnetSession,
};

/// The session behind a connection.
enum ActiveSession {
    Ssh(SshSession),
    Telnet(TelnetSession),
    Unimplemented,
}

/// A connection to one storage controller.
pub struct Connection {
    kind: ConnectionType,
    target: TargetSpec,
    session: ActiveSession,
}

impl Connection {
    /// Wrap the session for `kind` around already resolved credentials.
    ///
    /// SSH requires credentials; Telnet logs in only when given some. For
    /// SSH the trust store named by `config` is loaded here.
    pub fn new(
        kind: ConnectionType,
        target: TargetSpec,
        credentials: Option<Credentials>,
        config: SessionConfig,
    ) -> Result<Self> {
        let session = match kind {
            ConnectionType::Ssh => {
                let credentials =
                    credentials.ok_or(InputError::MissingCredentials { kind: kind.as_str() })?;
                let trust_store = config.load_trust_store();
                let port = target.effective_port();
                ActiveSession::Ssh(SshSession::new(
                    target.host.clone(),
                    port,
                    credentials,
                    config,
                    trust_store,
                ))
            }
            ConnectionType::Telnet => ActiveSession::Telnet(TelnetSession::new(
                target.host.clone(),
                target.port_or(DEFAULT_TELNET_PORT),
                credentials,
                config,
            )),
            ConnectionType::Rsh | ConnectionType::Zapi | ConnectionType::Http => {
                ActiveSession::Unimplemented
            }
        };

        debug!("Prepared {} connection to {}", kind, target);
        Ok(Self {
            kind,
            target,
            session,
        })
    }

    /// The connection type.
    pub fn kind(&self) -> ConnectionType {
        self.kind
    }

    /// The target this connection points at.
    pub fn target(&self) -> &TargetSpec {
        &self.target
    }

    /// Run `command` on the controller.
    pub async fn exec_cmd(&mut self, command: &str) -> Result<CommandOutput> {
        self.execute(command).await
    }
}

fn not_implemented(kind: ConnectionType) -> Error {
    ConnectionError::NotImplemented { kind }.into()
}

impl Session for Connection {
    async fn connect(&mut self) -> Result<()> {
        match &mut self.session {
            ActiveSession::Ssh(ssh) => ssh.connect().await,
            ActiveSession::Telnet(telnet) => telnet.connect().await,
            ActiveSession::Unimplemented => Err(not_implemented(self.kind)),
        }
    }

    async fn execute(&mut self, command: &str) -> Result<CommandOutput> {
        match &mut self.session {
            ActiveSession::Ssh(ssh) => ssh.execute(command).await,
            ActiveSession::Telnet(telnet) => telnet.execute(command).await,
            ActiveSession::Unimplemented => Err(not_implemented(self.kind)),
        }
    }

    async fn close(&mut self) -> Result<bool> {
        match &mut self.session {
            ActiveSession::Ssh(ssh) => ssh.close().await,
            ActiveSession::Telnet(telnet) => telnet.close().await,
            ActiveSession::Unimplemented => Err(not_implemented(self.kind)),
        }
    }

    fn state(&self) -> SessionState {
        match &self.session {
            ActiveSession::Ssh(ssh) => ssh.state(),
            ActiveSession::Telnet(telnet) => telnet.state(),
            ActiveSession::Unimplemented => SessionState::Unconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::error::{Error, SessionError};

    fn credentials() -> Option<Credentials> {
        Some(Credentials::new("root", SecretString::from("secret".to_string())))
    }

    fn isolated_config() -> SessionConfig {
        SessionConfig {
            known_hosts_paths: vec!["/nonexistent/lunadm/known_hosts".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_unimplemented_types_fail_on_every_call() {
        for kind in [ConnectionType::Rsh, ConnectionType::Zapi, ConnectionType::Http] {
            let target = TargetSpec::parse("root@10.0.0.5").unwrap();
            let mut conn = Connection::new(kind, target, None, isolated_config()).unwrap();

            let err = tokio_test::block_on(conn.connect()).unwrap_err();
            assert!(matches!(
                err,
                Error::Connection(ConnectionError::NotImplemented { kind: k }) if k == kind
            ));
            assert!(matches!(
                tokio_test::block_on(conn.exec_cmd("lun show all")),
                Err(Error::Connection(ConnectionError::NotImplemented { .. }))
            ));
            assert!(matches!(
                tokio_test::block_on(conn.close()),
                Err(Error::Connection(ConnectionError::NotImplemented { .. }))
            ));
            assert_eq!(conn.state(), SessionState::Unconnected);
        }
    }

    #[test]
    fn test_ssh_requires_credentials() {
        let target = TargetSpec::parse("root@10.0.0.5").unwrap();
        let result = Connection::new(ConnectionType::Ssh, target, None, isolated_config());
        assert!(matches!(
            result,
            Err(Error::Input(InputError::MissingCredentials { kind: "SSH" }))
        ));
    }

    #[tokio::test]
    async fn test_ssh_exec_before_connect_is_invalid_state() {
        let target = TargetSpec::parse("root@10.0.0.5").unwrap();
        let mut conn =
            Connection::new(ConnectionType::Ssh, target, credentials(), isolated_config()).unwrap();
        assert_eq!(conn.state(), SessionState::Unconnected);
        assert_eq!(conn.kind(), ConnectionType::Ssh);

        let err = conn.exec_cmd("lun show all").await.unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_telnet_round_trip_through_facade() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 128];
            while !received.ends_with(b"exit\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            socket.write_all(b"/vol/vol0/lun0 10g online\n").await.unwrap();
            let _ = socket.shutdown().await;
            received
        });

        let target = TargetSpec::parse(&format!("127.0.0.1:{port}")).unwrap();
        let mut conn =
            Connection::new(ConnectionType::Telnet, target, None, isolated_config()).unwrap();
        conn.connect().await.unwrap();
        assert_eq!(conn.state(), SessionState::Connected);

        let text = conn.exec_cmd("lun show all").await.unwrap().into_text().await.unwrap();
        assert_eq!(text, "/vol/vol0/lun0 10g online\n");
        assert!(conn.close().await.is_ok());
        assert_eq!(conn.state(), SessionState::Closed);

        assert_eq!(server.await.unwrap(), b"lun show all\nexit\n");
    }

    #[test]
    fn test_telnet_uses_telnet_default_port() {
        let target = TargetSpec::parse("filer01").unwrap();
        let conn = Connection::new(ConnectionType::Telnet, target, None, isolated_config()).unwrap();
        assert_eq!(conn.target().port_or(DEFAULT_TELNET_PORT), 23);
    }
}
