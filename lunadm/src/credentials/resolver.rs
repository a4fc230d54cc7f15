//! Turns a raw target string into a target and credentials.

use log::debug;
use secrecy::SecretString;

use super::prompt::Prompter;
use super::target::TargetSpec;
use super::Credentials;
use crate::error::{InputError, Result};

/// Resolves targets and credentials, prompting for whatever is missing.
pub struct CredentialResolver<P> {
    prompter: P,
}

impl<P: Prompter> CredentialResolver<P> {
    /// Create a resolver that asks `prompter` for missing values.
    pub fn new(prompter: P) -> Self {
        Self { prompter }
    }

    /// Parse `raw` and obtain credentials for it.
    ///
    /// The target is parsed before any prompt is shown, so malformed input
    /// fails without touching the terminal. A `password` supplied by the
    /// caller skips the password prompt.
    pub fn resolve(
        &mut self,
        raw: &str,
        password: Option<SecretString>,
    ) -> Result<(TargetSpec, Credentials)> {
        let target = TargetSpec::parse(raw)?;
        let credentials = self.credentials_for(&target, password)?;
        Ok((target, credentials))
    }

    /// Obtain credentials for an already parsed target.
    pub fn credentials_for(
        &mut self,
        target: &TargetSpec,
        password: Option<SecretString>,
    ) -> Result<Credentials> {
        let username = match &target.user {
            Some(user) => user.clone(),
            None => self.prompt_username()?,
        };

        let password = match password {
            Some(password) => password,
            None => {
                let prompt = format!("Password for {}@{}: ", username, target.host);
                self.prompter
                    .prompt_secret(&prompt)
                    .map(SecretString::from)
                    .map_err(InputError::Prompt)?
            }
        };

        debug!("Resolved credentials for {}@{}", username, target.host);
        Ok(Credentials::new(username, password))
    }

    /// Ask for a username, defaulting to the current OS user.
    fn prompt_username(&mut self) -> Result<String> {
        let default_user = self.prompter.current_user();
        let answer = self
            .prompter
            .prompt_line(&format!("Username [{default_user}]: "))
            .map_err(InputError::Prompt)?;

        let answer = answer.trim();
        if answer.is_empty() {
            Ok(default_user)
        } else {
            Ok(answer.to_string())
        }
    }

    /// Give the prompter back.
    pub fn into_inner(self) -> P {
        self.prompter
    }
}
