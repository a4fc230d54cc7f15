//! Operator-facing output.
//!
//! [`Console`] is the one place the binary writes user messages. It is
//! created once in `main` and passed by reference to whatever prints. Each
//! message is written while holding the console lock, and the lock is
//! released as soon as that single write returns.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::sync::{Mutex, PoisonError};

use owo_colors::OwoColorize;

struct Streams<O, E> {
    out: O,
    err: E,
}

/// Leveled message sink for stdout and stderr.
pub struct Console<O = io::Stdout, E = io::Stderr> {
    verbose: bool,
    color: bool,
    streams: Mutex<Streams<O, E>>,
}

impl Console {
    /// Console on the process's stdout and stderr. Colors are used only when
    /// both are terminals.
    pub fn stdio(verbose: bool) -> Self {
        let color = io::stdout().is_terminal() && io::stderr().is_terminal();
        Console::new(io::stdout(), io::stderr(), verbose, color)
    }
}

impl<O: Write, E: Write> Console<O, E> {
    /// Console over arbitrary writers.
    pub fn new(out: O, err: E, verbose: bool, color: bool) -> Self {
        Self {
            verbose,
            color,
            streams: Mutex::new(Streams { out, err }),
        }
    }

    /// Whether verbose messages are shown.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Plain message on stdout.
    pub fn msg(&self, msg: impl Display) {
        self.write_out(|out, _| writeln!(out, "{msg}"));
    }

    /// Success message on stdout, green on a terminal.
    pub fn success(&self, msg: impl Display) {
        self.write_out(|out, color| {
            if color {
                writeln!(out, "{}", msg.green())
            } else {
                writeln!(out, "{msg}")
            }
        });
    }

    /// Diagnostic on stdout, shown only in verbose mode.
    pub fn verbose(&self, msg: impl Display) {
        if !self.verbose {
            return;
        }
        self.write_out(|out, color| {
            let line = format!("VERBOSE: {msg}");
            if color {
                writeln!(out, "{}", line.cyan())
            } else {
                writeln!(out, "{line}")
            }
        });
    }

    /// Error on stderr, red on a terminal.
    pub fn err(&self, msg: impl Display) {
        let line = format!("ERROR: {msg}");
        let mut streams = self.streams.lock().unwrap_or_else(PoisonError::into_inner);
        let result = if self.color {
            writeln!(streams.err, "{}", line.red())
        } else {
            writeln!(streams.err, "{line}")
        };
        // Nothing useful can be done when stderr itself is gone.
        let _ = result.and_then(|()| streams.err.flush());
    }

    /// Consume the console and hand back its writers.
    pub fn into_inner(self) -> (O, E) {
        let streams = self
            .streams
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        (streams.out, streams.err)
    }

    fn write_out(&self, write: impl FnOnce(&mut O, bool) -> io::Result<()>) {
        let mut streams = self.streams.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = write(&mut streams.out, self.color).and_then(|()| streams.out.flush());
    }
}
