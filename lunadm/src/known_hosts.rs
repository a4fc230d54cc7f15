//! Host-key trust store backed by an OpenSSH `known_hosts` file.
//!
//! The store is loaded once and only answers lookups; it never writes the
//! file back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};
use ssh_key::known_hosts::{HostPatterns, KnownHosts};
use ssh_key::{HashAlg, PublicKey};

use crate::credentials::DEFAULT_PORT;

/// A trusted key taken from `known_hosts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedHostKey {
    /// Algorithm name, e.g. `ssh-ed25519`.
    pub key_type: String,

    /// Wire encoding of the public key (the decoded base64 blob).
    pub key_material: Vec<u8>,

    /// SHA-256 fingerprint, for display.
    pub fingerprint: String,
}

impl TrustedHostKey {
    fn from_public_key(key: &PublicKey) -> Option<Self> {
        let key_material = key.to_bytes().ok()?;
        Some(Self {
            key_type: key.algorithm().as_str().to_string(),
            key_material,
            fingerprint: key.fingerprint(HashAlg::Sha256).to_string(),
        })
    }

    /// Check a server key blob against this trusted key.
    pub fn matches(&self, wire_key: &[u8]) -> bool {
        self.key_material == wire_key
    }
}

#[derive(Debug, Clone)]
struct Entry {
    names: Vec<String>,
    key: TrustedHostKey,
}

/// In-memory view of a `known_hosts` file.
#[derive(Debug, Clone, Default)]
pub struct HostKeyStore {
    entries: Vec<Entry>,
    source: Option<PathBuf>,
}

impl HostKeyStore {
    /// A store with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Candidate `known_hosts` locations, in lookup order.
    ///
    /// `~/.ssh/known_hosts` first, then `~/ssh/known_hosts` for systems
    /// whose SSH clients do not use the dot directory.
    pub fn default_paths() -> Vec<PathBuf> {
        match dirs::home_dir() {
            Some(home) => vec![
                home.join(".ssh").join("known_hosts"),
                home.join("ssh").join("known_hosts"),
            ],
            None => Vec::new(),
        }
    }

    /// Load the first readable file among the default locations.
    pub fn load_default() -> Self {
        Self::load(&Self::default_paths())
    }

    /// Load the first readable file among `paths`.
    ///
    /// A missing or unreadable file is not an error: the store is left
    /// empty and a warning is logged.
    pub fn load(paths: &[PathBuf]) -> Self {
        for path in paths {
            match fs::read_to_string(path) {
                Ok(contents) => {
                    let mut store = Self::parse(&contents);
                    debug!(
                        "Loaded {} known host entries from {}",
                        store.entries.len(),
                        path.display()
                    );
                    store.source = Some(path.clone());
                    return store;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    trace!("No known_hosts at {}", path.display());
                }
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                }
            }
        }

        warn!("Unable to open host keys file");
        Self::empty()
    }

    /// Parse `known_hosts` contents.
    ///
    /// Hashed host names and marker lines (`@cert-authority`, `@revoked`)
    /// are skipped, as are lines that fail to parse.
    pub fn parse(contents: &str) -> Self {
        let mut entries = Vec::new();

        for (index, entry) in KnownHosts::new(contents).enumerate() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping known_hosts entry {}: {}", index + 1, e);
                    continue;
                }
            };

            if entry.marker().is_some() {
                trace!("Skipping marked known_hosts entry {}", index + 1);
                continue;
            }

            let names = match entry.host_patterns() {
                HostPatterns::Patterns(names) => names.clone(),
                HostPatterns::HashedName { .. } => {
                    trace!("Skipping hashed known_hosts entry {}", index + 1);
                    continue;
                }
            };

            if let Some(key) = TrustedHostKey::from_public_key(entry.public_key()) {
                entries.push(Entry { names, key });
            }
        }

        Self {
            entries,
            source: None,
        }
    }

    /// First key recorded for exactly `host`.
    pub fn lookup(&self, host: &str) -> Option<&TrustedHostKey> {
        self.entries
            .iter()
            .find(|entry| entry.names.iter().any(|name| name == host))
            .map(|entry| &entry.key)
    }

    /// Every key recorded for exactly `host`, in file order.
    ///
    /// A host usually has one line per key type.
    pub fn lookup_all(&self, host: &str) -> Vec<&TrustedHostKey> {
        self.entries
            .iter()
            .filter(|entry| entry.names.iter().any(|name| name == host))
            .map(|entry| &entry.key)
            .collect()
    }

    /// First key recorded for `host` reached on `port`.
    ///
    /// Non-default ports are recorded as `[host]:port`.
    pub fn lookup_target(&self, host: &str, port: u16) -> Option<&TrustedHostKey> {
        self.lookup(&host_entry_name(host, port))
    }

    /// Every key recorded for `host` reached on `port`.
    pub fn lookup_target_all(&self, host: &str, port: u16) -> Vec<&TrustedHostKey> {
        self.lookup_all(&host_entry_name(host, port))
    }

    /// Number of usable entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no usable entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The file this store was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Name under which `known_hosts` records `host` on `port`.
pub fn host_entry_name(host: &str, port: u16) -> String {
    if port == DEFAULT_PORT {
        host.to_string()
    } else {
        format!("[{host}]:{port}")
    }
}
