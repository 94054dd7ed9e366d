/*!
check.rs - the `check` subcommand: validate one invocation without running it.

  cmdspec check place_cell u1 -orient Q
  cmdspec check --json -- sum 1

Everything after the flags is the invocation, token 0 being the command
name. Exit status is non-zero unless the outcome is `ok` or `help_requested`.

JSON output:
{ "command": "sum", "outcome": { "outcome": "argument_count_error", "required": 2, "supplied": 1 },
  "message": "...", "help": "..." }
*/

use anyhow::{Result, anyhow, bail};
use clap::Args;

use crate::cmd::format::{Role, StyleOptions, color, emoji};
use crate::cmd::shared::Session;
use crate::spec::help::render;
use crate::spec::{ValidationOutcome, validate};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,

    /// Invocation tokens: COMMAND [ARGS/OPTIONS...]
    #[arg(
        value_name = "TOKENS",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub tokens: Vec<String>,
}

pub fn execute_check(args: CheckArgs, session: &Session) -> Result<()> {
    let name = args
        .tokens
        .first()
        .ok_or_else(|| anyhow!("missing command name"))?;
    let entry = session
        .registry
        .lookup(name)
        .ok_or_else(|| anyhow!("invalid command name \"{name}\""))?;

    let outcome = validate(&entry.spec, &args.tokens);
    let help = match &outcome {
        ValidationOutcome::Ok => None,
        ValidationOutcome::HelpRequested { topic } => Some(render(&entry.spec, topic.as_deref())),
        ValidationOutcome::OptionConstraintError { flag, .. } => {
            Some(render(&entry.spec, Some(flag.as_str())))
        }
        _ => Some(render(&entry.spec, None)),
    };

    if args.json {
        let out = serde_json::json!({
            "command": name,
            "outcome": outcome,
            "message": outcome.message(),
            "help": help,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).unwrap_or_else(|_| out.to_string())
        );
    } else {
        let style = StyleOptions::detect();
        match &outcome {
            ValidationOutcome::Ok => println!(
                "{}",
                color(
                    Role::Success,
                    format!("{} {name}: ok", emoji("ok", &style)).trim_start(),
                    &style
                )
            ),
            ValidationOutcome::HelpRequested { .. } => {}
            rejected => println!(
                "{}",
                color(
                    Role::Error,
                    format!("{} {rejected}", emoji("reject", &style)).trim_start(),
                    &style
                )
            ),
        }
        if let Some(text) = &help {
            println!("{text}");
        }
    }

    if !outcome.permits_dispatch() && !matches!(outcome, ValidationOutcome::HelpRequested { .. }) {
        bail!("{outcome}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::shared::Manifest;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        cmd: TestSub,
    }

    #[derive(clap::Subcommand, Debug)]
    enum TestSub {
        Check(CheckArgs),
    }

    fn session() -> Session {
        Session::from_manifest(&Manifest::default(), true).unwrap()
    }

    fn check(tokens: &[&str]) -> Result<()> {
        let args = CheckArgs {
            json: true,
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
        };
        execute_check(args, &session())
    }

    #[test]
    fn clap_keeps_hyphenated_tokens() {
        let cli = TestCli::try_parse_from(["t", "check", "--json", "echo", "-text", "-5"]).unwrap();
        match cli.cmd {
            TestSub::Check(a) => {
                assert!(a.json);
                assert_eq!(a.tokens, vec!["echo", "-text", "-5"]);
            }
        }
    }

    #[test]
    fn clap_requires_tokens() {
        assert!(TestCli::try_parse_from(["t", "check"]).is_err());
    }

    #[test]
    fn valid_invocation_passes() {
        assert!(check(&["sum", "1", "2", "-scale", "2.5"]).is_ok());
    }

    #[test]
    fn help_request_is_not_a_failure() {
        assert!(check(&["sum", "-help", "-scale"]).is_ok());
    }

    #[test]
    fn violations_fail() {
        assert!(check(&["sum", "1"]).is_err());
        assert!(check(&["sum", "1", "2", "-scale", "big"]).is_err());
        assert!(check(&["echo", "-loud"]).is_err());
    }

    #[test]
    fn unknown_command_fails() {
        let err = check(&["nope"]).unwrap_err();
        assert!(err.to_string().contains("invalid command name"));
    }
}
