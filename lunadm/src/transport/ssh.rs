//! SSH session implementation using russh.

use std::sync::{Arc, Mutex};

use log::{debug, trace, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::config::{HostKeyPolicy, SessionConfig};
use super::session::{CommandOutput, Session, SessionState, require_connected, with_deadline};
use super::streams::{ExecStreams, StdinEvent, StreamSink};
use crate::credentials::Credentials;
use crate::error::{Result, SessionError, TransportError};
use crate::known_hosts::{HostKeyStore, TrustedHostKey};

/// SSH session running one remote command per `execute`.
pub struct SshSession {
    host: String,
    port: u16,
    credentials: Credentials,
    config: SessionConfig,
    trust_store: HostKeyStore,
    trusted_keys: Vec<TrustedHostKey>,
    handle: Option<Handle<TrustHandler>>,
    state: SessionState,
}

impl SshSession {
    /// Create an unconnected session.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        credentials: Credentials,
        config: SessionConfig,
        trust_store: HostKeyStore,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            credentials,
            config,
            trust_store,
            trusted_keys: Vec::new(),
            handle: None,
            state: SessionState::Unconnected,
        }
    }

    /// Pin the key the server must present, bypassing the trust store.
    pub fn with_trusted_key(mut self, key: TrustedHostKey) -> Self {
        self.trusted_keys = vec![key];
        self
    }

    /// The trusted keys in effect, once known.
    pub fn trusted_keys(&self) -> &[TrustedHostKey] {
        &self.trusted_keys
    }

    /// Fill in the trusted keys from the trust store unless one is pinned.
    fn resolve_trusted_keys(&mut self) {
        if self.trusted_keys.is_empty() {
            self.trusted_keys = self
                .trust_store
                .lookup_target_all(&self.host, self.port)
                .into_iter()
                .cloned()
                .collect();
        }
    }

    async fn open(&mut self) -> Result<Handle<TrustHandler>> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: self.config.timeout,
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = TrustHandler {
            host: self.host.clone(),
            port: self.port,
            policy: self.config.host_key_policy,
            trusted_keys: self.trusted_keys.clone(),
            host_key_error: host_key_error.clone(),
        };

        let mut session = client::connect(ssh_config, (self.host.as_str(), self.port), handler)
            .await
            .map_err(|e| {
                // Prefer the detailed host-key error over russh's generic one
                match host_key_error.lock().ok().and_then(|mut slot| slot.take()) {
                    Some(hk_err) => hk_err,
                    None => TransportError::Ssh(e),
                }
            })?;

        let username = self.credentials.username.as_str();
        let success = session
            .authenticate_password(username, self.credentials.password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success();

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: username.to_string(),
            }
            .into());
        }

        Ok(session)
    }

    async fn start(&self, command: &str) -> Result<ExecStreams> {
        let handle = self
            .handle
            .as_ref()
            .ok_or(SessionError::InvalidState {
                operation: "execute",
                state: self.state,
            })?;

        let channel = handle
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .exec(true, command)
            .await
            .map_err(TransportError::Ssh)?;

        let (streams, sink) = ExecStreams::pipe();
        tokio::spawn(relay(channel, sink));
        Ok(streams)
    }
}

impl Session for SshSession {
    async fn connect(&mut self) -> Result<()> {
        if self.state != SessionState::Unconnected {
            return Err(SessionError::InvalidState {
                operation: "connect",
                state: self.state,
            }
            .into());
        }

        self.resolve_trusted_keys();
        for key in &self.trusted_keys {
            debug!("Trusting host key of type {} ({})", key.key_type, key.fingerprint);
        }

        debug!("Connecting to {}:{} over SSH", self.host, self.port);
        let timeout = self.config.timeout;
        let handle = with_deadline(timeout, self.open()).await?;

        self.handle = Some(handle);
        self.state = SessionState::Connected;
        Ok(())
    }

    async fn execute(&mut self, command: &str) -> Result<CommandOutput> {
        require_connected(self.state, "execute")?;

        debug!("Executing over SSH: {}", command);
        let streams = with_deadline(self.config.timeout, self.start(command)).await?;
        Ok(CommandOutput::Streams(streams))
    }

    async fn close(&mut self) -> Result<bool> {
        self.state = SessionState::Closed;

        let Some(handle) = self.handle.take() else {
            return Ok(true);
        };

        match handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
        {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("Failed to close connection to {}: {}", self.host, e);
                Ok(false)
            }
        }
    }

    fn state(&self) -> SessionState {
        self.state
    }
}

/// Copy channel traffic into the caller's stream handles until the
/// channel closes.
async fn relay(mut channel: Channel<Msg>, mut sink: StreamSink) {
    let mut stdin_open = true;

    loop {
        tokio::select! {
            input = sink.next_input(), if stdin_open => match input {
                Some(StdinEvent::Data(data)) => {
                    if let Err(e) = channel.data(&data[..]).await {
                        debug!("Failed to forward stdin: {}", e);
                        stdin_open = false;
                    }
                }
                Some(StdinEvent::Eof) | None => {
                    stdin_open = false;
                    let _ = channel.eof().await;
                }
            },
            msg = channel.wait() => match msg {
                Some(ChannelMsg::Data { data }) => sink.stdout(&data),
                Some(ChannelMsg::ExtendedData { data, ext: 1 }) => sink.stderr(&data),
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    trace!("remote command exited with {}", exit_status);
                    sink.exit(exit_status);
                }
                Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            },
        }
    }
}

/// Decide whether a server key is acceptable.
///
/// The key is accepted when any trusted key matches it. It is a mismatch
/// only when a trusted key of the same type exists; a type with no trusted
/// key is treated like an unknown host.
fn verify_host_key(
    policy: HostKeyPolicy,
    trusted: &[TrustedHostKey],
    key_type: &str,
    wire_key: &[u8],
    host: &str,
    port: u16,
) -> std::result::Result<(), TransportError> {
    if policy == HostKeyPolicy::Disabled || trusted.iter().any(|key| key.matches(wire_key)) {
        return Ok(());
    }

    if trusted.iter().any(|key| key.key_type == key_type) {
        return Err(TransportError::HostKeyMismatch {
            host: host.to_string(),
            port,
        });
    }

    match policy {
        HostKeyPolicy::Strict => Err(TransportError::HostKeyUnknown {
            host: host.to_string(),
            port,
        }),
        _ => {
            warn!(
                "No known_hosts entry of type {} for {}:{}, host key not verified",
                key_type, host, port
            );
            Ok(())
        }
    }
}

/// russh client handler checking the server key against the trusted one.
struct TrustHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    trusted_keys: Vec<TrustedHostKey>,
    /// Stores a detailed host-key error so connect() can surface it
    /// instead of the generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl client::Handler for TrustHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let wire_key = server_public_key.to_bytes().unwrap_or_default();
        let key_type = server_public_key.algorithm();

        match verify_host_key(
            self.policy,
            &self.trusted_keys,
            key_type.as_str(),
            &wire_key,
            &self.host,
            self.port,
        ) {
            Ok(()) => Ok(true),
            Err(e) => {
                if let Ok(mut slot) = self.host_key_error.lock() {
                    *slot = Some(e);
                }
                Ok(false)
            }
        }
    }
}
