/*!
help.rs - the `help` subcommand.

  cmdspec help                   index of every command (internal `test*` ones skipped)
  cmdspec help sum               help for one command
  cmdspec help sum -scale        help for one option, hidden (`-!x`) ones included
*/

use anyhow::{Result, anyhow};
use clap::Args;

use crate::cmd::shared::Session;
use crate::spec::help::{render, render_index};

#[derive(Args, Debug)]
pub struct HelpArgs {
    /// Command to describe (omit for the index)
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,

    /// Restrict the help to one option of COMMAND
    #[arg(value_name = "OPTION", allow_hyphen_values = true)]
    pub option: Option<String>,
}

pub fn execute_help(args: HelpArgs, session: &Session) -> Result<()> {
    print!("{}", help_text(&args, session)?);
    Ok(())
}

fn help_text(args: &HelpArgs, session: &Session) -> Result<String> {
    let Some(name) = &args.command else {
        let mut index = render_index(&session.registry);
        if !index.ends_with('\n') {
            index.push('\n');
        }
        return Ok(index);
    };
    let entry = session
        .registry
        .lookup(name)
        .ok_or_else(|| anyhow!("invalid command name \"{name}\""))?;

    let option = args.option.as_deref().map(|o| {
        if o.starts_with('-') {
            o.to_string()
        } else {
            format!("-{o}")
        }
    });
    if let Some(flag) = &option
        && entry.spec.option(flag).is_none()
    {
        return Err(anyhow!("command '{name}' has no option {flag}"));
    }
    Ok(render(&entry.spec, option.as_deref()))
}
