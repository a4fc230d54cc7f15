//! Interactive prompting.
//!
//! Credential acquisition talks to the operator through the [`Prompter`]
//! trait so that resolution can be driven without a terminal.

use std::io::{self, BufRead, Write};

/// Source of interactive answers.
pub trait Prompter {
    /// Ask a question and return the answer without its line ending.
    fn prompt_line(&mut self, prompt: &str) -> io::Result<String>;

    /// Ask for a secret with terminal echo disabled.
    fn prompt_secret(&mut self, prompt: &str) -> io::Result<String>;

    /// Name of the user running this process.
    fn current_user(&self) -> String;
}

/// Prompter backed by the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt_line(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        drop(stdout);

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn prompt_secret(&mut self, prompt: &str) -> io::Result<String> {
        rpassword::prompt_password(prompt)
    }

    fn current_user(&self) -> String {
        whoami::username()
    }
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn prompt_line(&mut self, prompt: &str) -> io::Result<String> {
        (**self).prompt_line(prompt)
    }

    fn prompt_secret(&mut self, prompt: &str) -> io::Result<String> {
        (**self).prompt_secret(prompt)
    }

    fn current_user(&self) -> String {
        (**self).current_user()
    }
}
