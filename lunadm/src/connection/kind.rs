//! Connection type names.

use std::fmt;
use std::str::FromStr;

use crate::credentials::DEFAULT_PORT;
use crate::error::InputError;
use crate::transport::DEFAULT_TELNET_PORT;

/// Kinds of remote session a controller can be reached over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionType {
    Ssh,
    Telnet,
    /// Recognised, but has no transport.
    Rsh,
    /// Recognised, but has no transport.
    Zapi,
    /// Recognised, but has no transport.
    Http,
}

impl ConnectionType {
    /// Every recognised connection type.
    pub const ALL: [ConnectionType; 5] = [
        ConnectionType::Ssh,
        ConnectionType::Telnet,
        ConnectionType::Rsh,
        ConnectionType::Zapi,
        ConnectionType::Http,
    ];

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Ssh => "SSH",
            ConnectionType::Telnet => "TELNET",
            ConnectionType::Rsh => "RSH",
            ConnectionType::Zapi => "ZAPI",
            ConnectionType::Http => "HTTP",
        }
    }

    /// Whether a transport exists for this type.
    pub fn is_implemented(&self) -> bool {
        matches!(self, ConnectionType::Ssh | ConnectionType::Telnet)
    }

    /// Port used when the target does not name one.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            ConnectionType::Ssh => Some(DEFAULT_PORT),
            ConnectionType::Telnet => Some(DEFAULT_TELNET_PORT),
            ConnectionType::Rsh | ConnectionType::Zapi | ConnectionType::Http => None,
        }
    }
}

impl FromStr for ConnectionType {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InputError::UnsupportedConnectionType {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
