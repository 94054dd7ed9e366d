/*!
shell.rs - the `shell` subcommand: read commands from stdin until EOF or
`exit`/`quit`, dispatching each line.

Unlike `run`, a rejected or failing command does not end the session; the
diagnostic is printed and the next line is read. Settings changed by a
command (e.g. `profile -enable false`) stay in effect for the session.
*/

use anyhow::{Context, Result};
use clap::Args;
use std::io::{BufRead, Write};
use tracing::debug;

use crate::cmd::format::{Role, StyleOptions, color, outcome_line};
use crate::cmd::shared::Session;
use crate::runtime::Dispatcher;

#[derive(Args, Debug)]
pub struct ShellArgs {
    /// Prompt printed before each line (empty disables it)
    #[arg(long, default_value = "% ")]
    pub prompt: String,
}

pub fn execute_shell(args: ShellArgs, session: &Session) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut dispatcher = session.dispatcher();
    let stats = run_shell(
        &mut dispatcher,
        stdin.lock(),
        stdout.lock(),
        &args.prompt,
        &StyleOptions::detect(),
    )?;
    debug!(
        lines = stats.lines,
        failures = stats.failures,
        profile = dispatcher.settings().profile,
        "shell closed"
    );
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ShellStats {
    pub lines: usize,
    pub failures: usize,
}

pub fn run_shell<R: BufRead, W: Write>(
    dispatcher: &mut Dispatcher<'_>,
    input: R,
    mut out: W,
    prompt: &str,
    style: &StyleOptions,
) -> Result<ShellStats> {
    let mut stats = ShellStats::default();
    let mut lines = input.lines();
    loop {
        if !prompt.is_empty() {
            write!(out, "{prompt}")?;
            out.flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read from stdin")?;
        let trimmed = line.trim();
        if matches!(trimmed, "exit" | "quit") {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }
        stats.lines += 1;

        match dispatcher.execute_script(trimmed) {
            Ok(results) => {
                for dispatch in &results {
                    if dispatch.is_rejected() {
                        stats.failures += 1;
                    }
                    let text = outcome_line(dispatch, style);
                    if !text.is_empty() {
                        writeln!(out, "{}", text.trim_end())?;
                    }
                }
            }
            Err(e) => {
                stats.failures += 1;
                writeln!(out, "{}", color(Role::Error, format!("{e:#}"), style))?;
            }
        }
    }
    Ok(stats)
}
