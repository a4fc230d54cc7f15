//! Target address parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::InputError;

/// Port used when the target does not name one.
pub const DEFAULT_PORT: u16 = 22;

/// A parsed `[user@]host[:port]` target.
///
/// `host` is never empty once parsing succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetSpec {
    /// Username, if the target carried one.
    pub user: Option<String>,

    /// Hostname or IP address.
    pub host: String,

    /// Port, if the target carried one.
    pub port: Option<u16>,
}

impl TargetSpec {
    /// Parse a target string.
    ///
    /// The user part is split at the first `@`. IPv6 literals may be given
    /// in brackets (`[::1]:2222`).
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let raw = raw.trim();

        let (user, rest) = match raw.split_once('@') {
            Some((user, rest)) => (Some(user), rest),
            None => (None, raw),
        };
        let user = user.filter(|u| !u.is_empty()).map(str::to_string);

        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            match bracketed.split_once(']') {
                Some((host, "")) => (host, None),
                Some((host, tail)) => match tail.strip_prefix(':') {
                    Some(port) => (host, Some(port)),
                    None => {
                        return Err(InputError::InvalidPort {
                            value: tail.to_string(),
                        });
                    }
                },
                None => (rest, None),
            }
        } else {
            match rest.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (rest, None),
            }
        };

        if host.is_empty() {
            return Err(InputError::MissingHost);
        }

        let port = port
            .map(|p| {
                p.parse::<u16>().map_err(|_| InputError::InvalidPort {
                    value: p.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            user,
            host: host.to_string(),
            port,
        })
    }

    /// Port to connect to, falling back to `default`.
    pub fn port_or(&self, default: u16) -> u16 {
        self.port.unwrap_or(default)
    }

    /// Port to connect to, falling back to the SSH default.
    pub fn effective_port(&self) -> u16 {
        self.port_or(DEFAULT_PORT)
    }
}

impl FromStr for TargetSpec {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        if self.host.contains(':') {
            write!(f, "[{}]", self.host)?;
        } else {
            write!(f, "{}", self.host)?;
        }
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}
