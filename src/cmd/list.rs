/*!
list.rs - the `list` subcommand: registered commands as a table or JSON.

JSON output:
{
  "status": "ok",
  "manifest": "<path or null>",
  "count": 6,
  "commands": [
    { "name": "sum", "arguments": "<a> <b>",
      "options": [ { "flag": "-scale", "constraint": "<double>", "hidden": false } ] }
  ]
}
*/

use anyhow::Result;
use clap::Args;

use crate::cmd::format::{Role, StyleOptions, banner, color, emoji, table};
use crate::cmd::shared::Session;
use crate::spec::CommandSpec;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,

    /// Include hidden (`-!flag`) options in the OPTIONS column
    #[arg(short = 'a', long)]
    pub all: bool,
}

pub fn execute_list(args: ListArgs, session: &Session) -> Result<()> {
    let specs: Vec<&CommandSpec> = session.registry.iter().map(|e| &e.spec).collect();

    if args.json {
        let commands: Vec<serde_json::Value> = specs
            .iter()
            .map(|spec| {
                let options: Vec<serde_json::Value> = spec
                    .options
                    .iter()
                    .filter(|o| args.all || !o.is_hidden())
                    .map(|o| {
                        serde_json::json!({
                            "flag": o.flag,
                            "constraint": o.constraint,
                            "hidden": o.is_hidden(),
                        })
                    })
                    .collect();
                serde_json::json!({
                    "name": spec.name,
                    "arguments": spec.argument_pattern,
                    "options": options,
                })
            })
            .collect();
        let out = serde_json::json!({
            "status": "ok",
            "manifest": session.source,
            "count": commands.len(),
            "commands": commands,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).unwrap_or_else(|_| out.to_string())
        );
        return Ok(());
    }

    let style = StyleOptions::detect();
    let subtitle = match &session.source {
        Some(path) => format!("manifest={path}"),
        None => "built-ins only".to_string(),
    };
    let title = format!("{} Commands ({})", emoji("list", &style), specs.len());
    println!("{}", banner(title.trim_start(), Some(subtitle.as_str()), &style));

    let rows = command_rows(&specs, args.all);
    println!("{}", table(&["#", "NAME", "ARGUMENTS", "OPTIONS"], &rows, &style));
    println!(
        "\n{} {}",
        emoji("help", &style),
        color(
            Role::Dim,
            "Use `cmdspec help <command>` for the full option listing",
            &style
        )
    );
    Ok(())
}

fn command_rows(specs: &[&CommandSpec], all: bool) -> Vec<Vec<String>> {
    specs
        .iter()
        .enumerate()
        .map(|(idx, spec)| {
            let flags: Vec<&str> = spec
                .options
                .iter()
                .filter(|o| all || !o.is_hidden())
                .map(|o| o.flag.as_str())
                .collect();
            vec![
                (idx + 1).to_string(),
                spec.name.clone(),
                or_dash(&spec.argument_pattern),
                or_dash(&flags.join(" ")),
            ]
        })
        .collect()
}

fn or_dash(s: &str) -> String {
    if s.is_empty() { "-".into() } else { s.to_string() }
}
