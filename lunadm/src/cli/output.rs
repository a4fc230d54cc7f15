//! Relays command output to the console.

use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};

use super::Console;
use crate::transport::CommandOutput;

/// Print everything a command produced.
///
/// Streamed stdout lines are printed with leading whitespace removed and
/// stderr lines are reported as errors. Text output is printed unchanged.
/// Returns the remote exit status when the transport reports one.
pub async fn relay_output<O: Write, E: Write>(
    console: &Console<O, E>,
    output: CommandOutput,
) -> io::Result<Option<u32>> {
    let mut streams = match output {
        CommandOutput::Text(text) => {
            for line in text.lines() {
                console.msg(line);
            }
            return Ok(None);
        }
        CommandOutput::Streams(streams) => streams,
    };

    let stdout = &mut streams.stdout;
    let stderr = &mut streams.stderr;

    let relay_stdout = async move {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            console.msg(line.trim_start());
        }
        Ok::<_, io::Error>(())
    };
    let relay_stderr = async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Some(line) = lines.next_line().await? {
            console.err(line);
        }
        Ok::<_, io::Error>(())
    };

    let (out, err) = tokio::join!(relay_stdout, relay_stderr);
    out?;
    err?;

    Ok(streams.exit_status().await)
}
