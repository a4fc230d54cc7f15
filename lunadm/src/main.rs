use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::debug;

use lunadm::cli::{
    Cli, Console, Interruptible, TerminalGuard, password_from_env, relay_output, resolve_command,
    until_interrupted,
};
use lunadm::connection::{Connection, ConnectionBuilder};
use lunadm::credentials::TerminalPrompter;
use lunadm::error::{Result, TransportError};
use lunadm::transport::Session;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);
    let console = Arc::new(Console::stdio(cli.global.verbose));
    let terminal = TerminalGuard::capture();

    match until_interrupted(execute(cli, Arc::clone(&console)), interrupt()).await {
        Interruptible::Completed(Ok(code)) => code,
        Interruptible::Completed(Err(e)) => report(&console, e),
        Interruptible::Interrupted => {
            drop(terminal);
            eprintln!("Exiting on user request.");
            // A prompt may still be blocked on stdin, so skip runtime shutdown.
            std::process::exit(130);
        }
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        debug!("Not listening for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Prompt on a blocking thread, then connect and run the command.
async fn execute(cli: Cli, console: Arc<Console>) -> Result<ExitCode> {
    let prompt_console = Arc::clone(&console);
    let (mut connection, command) =
        tokio::task::spawn_blocking(move || prepare(&cli, &prompt_console))
            .await
            .map_err(|e| TransportError::Io(io::Error::other(e)))??;

    run(&mut connection, &command, &console).await
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "warn,lunadm=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// Work out the command and build the connection, prompting as needed.
fn prepare(cli: &Cli, console: &Console) -> Result<(Connection, String)> {
    let global = &cli.global;
    let command = resolve_command(global.command.as_deref(), cli.command.as_ref())?;
    let target = global.target.clone().unwrap_or_default();

    console.verbose(format!("Target is: {target}"));
    console.verbose(format!("Command is: {command}"));
    if let Some(size) = cli.command.as_ref().and_then(|c| c.size_summary()) {
        console.verbose(format!("Size is: {size}"));
    }

    let mut builder = ConnectionBuilder::new(target)
        .connection_type(global.protocol.clone())
        .host_key_policy(global.strict_host_key_checking);
    if let Some(secs) = global.timeout.filter(|secs| *secs > 0) {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(path) = &global.known_hosts {
        builder = builder.known_hosts(path.clone());
    }
    if let Some(password) = password_from_env() {
        builder = builder.password(password);
    }

    let connection = builder.build(TerminalPrompter)?;
    Ok((connection, command))
}

async fn run(connection: &mut Connection, command: &str, console: &Console) -> Result<ExitCode> {
    connection.connect().await?;
    console.verbose(format!(
        "Connected to {} over {}",
        connection.target(),
        connection.kind()
    ));

    let output = connection.exec_cmd(command).await?;
    let status = relay_output(console, output)
        .await
        .map_err(TransportError::Io)?;
    debug!("Remote exit status: {:?}", status);

    if !connection.close().await? {
        console.verbose("Connection did not close cleanly");
    }

    match status {
        Some(code) if code != 0 => {
            console.err(format!("Command exited with status {code}"));
            Ok(ExitCode::FAILURE)
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}

fn report(console: &Console, error: lunadm::Error) -> ExitCode {
    console.err(&error);
    if error.is_input() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}
