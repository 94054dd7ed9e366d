/*!
run.rs - the `run` subcommand: execute command lines through the dispatcher.

Each LINE may hold several commands separated by `;`; `--file` appends a
script (one command per line, `#` comments allowed). Execution stops at the
first rejected invocation or failing handler.

  cmdspec run "echo -text hi -upper" "sum 2 3 -scale 0.5"
  cmdspec run -f flow.cmds --json

JSON output:
{
  "status": "ok" | "rejected",
  "results": [ { "status": "completed", "command": "echo", "output": "HI" }, ... ]
}

On a handler failure:
{ "status": "error", "error": "...", "results": [ ...completed so far... ] }
*/

use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;

use crate::cmd::format::{Role, StyleOptions, banner, color, emoji, outcome_line};
use crate::cmd::shared::Session;
use crate::runtime::{Dispatch, Dispatcher};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Command lines to execute (`;` separates commands within one line)
    #[arg(value_name = "LINE")]
    pub lines: Vec<String>,

    /// Read additional commands from a script file
    #[arg(short = 'f', long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

pub fn execute_run(args: RunArgs, session: &Session) -> Result<()> {
    let mut script = args.lines.join("\n");
    if let Some(path) = &args.file {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script: {}", path.display()))?;
        script.push('\n');
        script.push_str(&body);
    }
    if script.trim().is_empty() {
        bail!("nothing to run: pass at least one LINE or --file");
    }

    let mut dispatcher = session.dispatcher();
    let (results, failure) = run_script(&mut dispatcher, &script);
    let rejected = results.last().is_some_and(Dispatch::is_rejected);

    if args.json {
        let status = match (&failure, rejected) {
            (Some(_), _) => "error",
            (None, true) => "rejected",
            (None, false) => "ok",
        };
        let mut out = serde_json::json!({ "status": status, "results": results });
        if let (Some(err), serde_json::Value::Object(map)) = (&failure, &mut out) {
            map.insert("error".into(), format!("{err:#}").into());
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&out).unwrap_or_else(|_| out.to_string())
        );
    } else {
        let style = StyleOptions::detect();
        for dispatch in &results {
            let text = outcome_line(dispatch, &style);
            if !text.is_empty() {
                println!("{text}");
            }
        }
        if let Some(err) = &failure {
            let title = format!("{} Command Error", emoji("reject", &style));
            let detail = color(Role::Error, format!("{err:#}"), &style);
            println!("{}", banner(title.trim_start(), Some(detail.as_str()), &style));
        }
    }

    if let Some(err) = failure {
        return Err(err);
    }
    if rejected {
        bail!("command rejected");
    }
    Ok(())
}

/// Like `Dispatcher::execute_script`, but keeps the results gathered before a
/// handler error so they can still be reported.
fn run_script(
    dispatcher: &mut Dispatcher<'_>,
    script: &str,
) -> (Vec<Dispatch>, Option<anyhow::Error>) {
    let mut results = Vec::new();
    for line in crate::runtime::dispatch::split_script(script) {
        match dispatcher.execute_line(&line) {
            Ok(None) => {}
            Ok(Some(dispatch)) => {
                let stop = dispatch.is_rejected();
                results.push(dispatch);
                if stop {
                    break;
                }
            }
            Err(e) => return (results, Some(e)),
        }
    }
    (results, None)
}
