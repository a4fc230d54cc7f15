//! Target parsing and credential acquisition.
//!
//! Acquisition is kept apart from session construction: sessions take an
//! already resolved [`TargetSpec`] and [`Credentials`], and only the
//! [`CredentialResolver`] ever talks to the operator.

pub mod prompt;
mod resolver;
mod target;

pub use prompt::{Prompter, TerminalPrompter};
pub use resolver::CredentialResolver;
pub use target::{DEFAULT_PORT, TargetSpec};

use secrecy::SecretString;

/// Username and password for one session attempt.
///
/// The password is never printed; its `Debug` output is redacted.
#[derive(Debug)]
pub struct Credentials {
    /// Login name.
    pub username: String,

    /// Login password.
    pub password: SecretString,
}

impl Credentials {
    /// Create credentials from a username and password.
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}
