//! Session configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::known_hosts::HostKeyStore;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Reject hosts without a known_hosts entry, and changed keys.
    Strict,

    /// Enforce a known_hosts entry when one exists; hosts without one are
    /// accepted with a warning.
    #[default]
    AcceptUnknown,

    /// Accept all keys without checking. For lab use only.
    Disabled,
}

impl FromStr for HostKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yes" | "strict" => Ok(Self::Strict),
            "accept-new" | "accept-unknown" => Ok(Self::AcceptUnknown),
            "no" | "off" | "disabled" => Ok(Self::Disabled),
            other => Err(format!(
                "unknown host key policy '{other}' (expected yes, no or accept-new)"
            )),
        }
    }
}

/// Configuration shared by every transport.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Deadline for connect and execute. `None` blocks until the peer
    /// answers or the connection fails.
    pub timeout: Option<Duration>,

    /// Host key verification mode (SSH only).
    pub host_key_policy: HostKeyPolicy,

    /// known_hosts candidates, tried in order. Empty means the defaults.
    pub known_hosts_paths: Vec<PathBuf>,
}

impl SessionConfig {
    /// Load the trust store this configuration points at.
    pub fn load_trust_store(&self) -> HostKeyStore {
        if self.known_hosts_paths.is_empty() {
            HostKeyStore::load_default()
        } else {
            HostKeyStore::load(&self.known_hosts_paths)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_names() {
        assert_eq!("yes".parse::<HostKeyPolicy>().unwrap(), HostKeyPolicy::Strict);
        assert_eq!(
            "Accept-New".parse::<HostKeyPolicy>().unwrap(),
            HostKeyPolicy::AcceptUnknown
        );
        assert_eq!("no".parse::<HostKeyPolicy>().unwrap(), HostKeyPolicy::Disabled);
        assert!("maybe".parse::<HostKeyPolicy>().is_err());
    }

    #[test]
    fn test_defaults_block_without_deadline() {
        let config = SessionConfig::default();
        assert!(config.timeout.is_none());
        assert_eq!(config.host_key_policy, HostKeyPolicy::AcceptUnknown);
    }
}
