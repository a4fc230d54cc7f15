//! Command-line surface: arguments, `lun` command lines and console output.

mod args;
mod command;
mod console;
mod output;
mod terminal;

pub use args::{Cli, GlobalArgs, LunCommand, PASSWORD_ENV, password_from_env};
pub use command::{format_size, resolve_command};
pub use console::Console;
pub use output::relay_output;
pub use terminal::{Interruptible, TerminalGuard, until_interrupted};
