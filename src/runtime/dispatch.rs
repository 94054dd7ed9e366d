/*!
dispatch.rs - the command dispatch loop.

Per invocation:
  tokens -> lookup -> validate -> (help | reject | profile(handler))

Handlers only run after validation passed, one at a time, on the calling
thread. A script (`a; b` or one command per line) stops at the first
command that is rejected or fails.
*/

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::profiler::{DEFAULT_NOISE_FLOOR, ProfileReport, Profiler};
use super::usage::SharedUsage;
use crate::spec::access::{self, AccessResult};
use crate::spec::help::render;
use crate::spec::registry::{CommandRegistry, get_object};
use crate::spec::token::full_name;
use crate::spec::{CommandSpec, ValidationOutcome, validate};

/* ---- Handler Contract ---- */

/// Command body. Returns the text result of the command.
pub type Handler = fn(&mut CallContext<'_>) -> Result<String>;

pub type Registry = CommandRegistry<Handler>;

/// Mutable per-session knobs that commands may flip.
#[derive(Debug, Clone)]
pub struct Settings {
    pub profile: bool,
    pub noise_floor: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile: true,
            noise_floor: DEFAULT_NOISE_FLOOR,
        }
    }
}

/// Everything a handler may look at while it runs.
pub struct CallContext<'a> {
    pub tokens: &'a [String],
    pub spec: &'a CommandSpec,
    pub registry: &'a Registry,
    pub settings: &'a mut Settings,
}

impl CallContext<'_> {
    pub fn has(&self, flag: &str) -> bool {
        access::is_option_used(self.tokens, flag)
    }
    pub fn bool(&self, flag: &str) -> AccessResult<bool> {
        access::get_bool(self.tokens, flag)
    }
    pub fn int(&self, flag: &str) -> AccessResult<i64> {
        access::get_int(self.tokens, flag)
    }
    pub fn double(&self, flag: &str) -> AccessResult<f64> {
        access::get_double(self.tokens, flag)
    }
    pub fn float(&self, flag: &str) -> AccessResult<f32> {
        access::get_float(self.tokens, flag)
    }
    pub fn string(&self, flag: &str) -> AccessResult<String> {
        access::get_string(self.tokens, flag)
    }
    /// Positional token bound to a placeholder of the argument pattern.
    pub fn positional(&self, placeholder: &str) -> Option<&str> {
        get_object(self.spec, self.tokens, placeholder)
    }
}

/* ---- Results ---- */

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Dispatch {
    Completed {
        command: String,
        output: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        profile: Option<ProfileReport>,
    },
    Help {
        command: String,
        text: String,
    },
    Rejected {
        command: String,
        outcome: ValidationOutcome,
        message: String,
        help: String,
    },
}

impl Dispatch {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Dispatch::Rejected { .. })
    }
}

/* ---- Dispatcher ---- */

pub struct Dispatcher<'r> {
    registry: &'r Registry,
    usage: Arc<SharedUsage>,
    settings: Settings,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r Registry, usage: Arc<SharedUsage>, settings: Settings) -> Self {
        Self {
            registry,
            usage,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validate and run one tokenized invocation.
    pub fn execute(&mut self, tokens: &[String]) -> Result<Dispatch> {
        let registry = self.registry;
        let Some(name) = tokens.first() else {
            bail!("empty invocation");
        };
        let entry = registry
            .lookup(name)
            .ok_or_else(|| anyhow!("invalid command name \"{name}\""))?;
        let spec = &entry.spec;

        let outcome = validate(spec, tokens);
        match &outcome {
            ValidationOutcome::Ok => {}
            ValidationOutcome::HelpRequested { topic } => {
                return Ok(Dispatch::Help {
                    command: name.clone(),
                    text: render(spec, topic.as_deref()),
                });
            }
            rejected => {
                let message = rejected.message().unwrap_or_default();
                warn!(command = %full_name(tokens), "{message}");
                let help = match rejected {
                    ValidationOutcome::OptionConstraintError { flag, .. } => {
                        render(spec, Some(flag.as_str()))
                    }
                    _ => render(spec, None),
                };
                return Ok(Dispatch::Rejected {
                    command: name.clone(),
                    outcome: rejected.clone(),
                    message,
                    help,
                });
            }
        }

        debug!(command = %full_name(tokens), "dispatching");
        let profiler = Profiler::new(self.settings.profile, self.settings.noise_floor);
        let usage = Arc::clone(&self.usage);
        let mut ctx = CallContext {
            tokens,
            spec,
            registry,
            settings: &mut self.settings,
        };

        usage.begin_command();
        let (result, profile) = profiler.run(name, usage.as_ref(), || (entry.handler)(&mut ctx));
        usage.end_command();

        if let Some(report) = &profile {
            info!("{report}");
        }
        let output = result.with_context(|| format!("command failed: {}", full_name(tokens)))?;
        Ok(Dispatch::Completed {
            command: name.clone(),
            output,
            profile,
        })
    }

    /// Tokenize one line (shell quoting rules) and execute it.
    ///
    /// Blank lines and `#` comments yield `None`.
    pub fn execute_line(&mut self, line: &str) -> Result<Option<Dispatch>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        let tokens = shell_words::split(trimmed)
            .with_context(|| format!("failed to tokenize command line: {trimmed}"))?;
        self.execute(&tokens).map(Some)
    }

    /// Run `;`/newline separated commands, stopping at the first rejection.
    /// A failing handler aborts the script with its error.
    pub fn execute_script(&mut self, script: &str) -> Result<Vec<Dispatch>> {
        let mut results = Vec::new();
        for line in split_script(script) {
            let Some(dispatch) = self.execute_line(&line)? else {
                continue;
            };
            let stop = dispatch.is_rejected();
            results.push(dispatch);
            if stop {
                break;
            }
        }
        Ok(results)
    }
}

/// Split on `;` and newlines that are not inside quotes.
pub fn split_script(script: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in script.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match (ch, quote) {
            ('\\', q) if q != Some('\'') => {
                escaped = true;
                current.push(ch);
            }
            ('"' | '\'', None) => {
                quote = Some(ch);
                current.push(ch);
            }
            (c, Some(q)) if c == q => {
                quote = None;
                current.push(ch);
            }
            (';' | '\n', None) => commands.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    commands.push(current);
    commands.retain(|c| !c.trim().is_empty());
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(ctx: &mut CallContext<'_>) -> Result<String> {
        Ok(ctx.string("-text").unwrap_or_default())
    }

    fn fail(_: &mut CallContext<'_>) -> Result<String> {
        bail!("boom")
    }

    fn toggle(ctx: &mut CallContext<'_>) -> Result<String> {
        ctx.settings.profile = ctx.bool("-on")?;
        Ok(String::new())
    }

    fn area(ctx: &mut CallContext<'_>) -> Result<String> {
        let w: i64 = ctx.positional("<w>").unwrap_or("0").parse()?;
        let h: i64 = ctx.positional("<h>").unwrap_or("0").parse()?;
        Ok((w * h).to_string())
    }

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register("echo", "-text <string> -!raw", echo as Handler);
        reg.register("fail", "", fail as Handler);
        reg.register("toggle", "-on true|false", toggle as Handler);
        reg.register("area", "<w> <h> -unit cm|mm", area as Handler);
        reg
    }

    fn dispatcher(reg: &Registry) -> Dispatcher<'_> {
        Dispatcher::new(reg, Arc::new(SharedUsage::new()), Settings::default())
    }

    #[test]
    fn runs_valid_invocation() {
        let reg = registry();
        let mut d = dispatcher(&reg);
        let out = d
            .execute_line(r#"echo -text "hello there" friend"#)
            .unwrap()
            .unwrap();
        match out {
            Dispatch::Completed { output, .. } => assert_eq!(output, "hello there friend"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn positional_lookup_through_context() {
        let reg = registry();
        let mut d = dispatcher(&reg);
        let out = d.execute_line("area 3 4 -unit cm").unwrap().unwrap();
        assert!(matches!(out, Dispatch::Completed { ref output, .. } if output == "12"));
    }

    #[test]
    fn help_short_circuits_handler() {
        let reg = registry();
        let mut d = dispatcher(&reg);
        let out = d.execute_line("fail -h").unwrap().unwrap();
        assert!(matches!(out, Dispatch::Help { .. }));

        let out = d.execute_line("echo -help -!raw").unwrap().unwrap();
        match out {
            Dispatch::Help { text, .. } => assert!(text.contains("-!raw")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn help_on_undeclared_flag_lists_every_option() {
        let mut reg = registry();
        reg.register("w", "<x> -a <int> -b", echo as Handler);
        let mut d = dispatcher(&reg);
        match d.execute_line("w -help -zzz").unwrap().unwrap() {
            Dispatch::Help { text, .. } => {
                assert!(text.contains("Arguments: <x>"));
                assert!(text.contains("Options: -a <int> -b -help -h"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejection_carries_outcome_and_option_help() {
        let reg = registry();
        let mut d = dispatcher(&reg);
        let out = d.execute_line("area 1 2 -unit km").unwrap().unwrap();
        match out {
            Dispatch::Rejected {
                outcome, help, message, ..
            } => {
                assert!(matches!(
                    outcome,
                    ValidationOutcome::OptionConstraintError { .. }
                ));
                assert!(message.contains("-unit km"));
                assert!(help.contains("-unit cm|mm -help -h"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_command_is_an_error() {
        let reg = registry();
        let mut d = dispatcher(&reg);
        let err = d.execute_line("nope 1").unwrap_err();
        assert!(err.to_string().contains("invalid command name"));
    }

    #[test]
    fn handler_error_propagates_with_context() {
        let reg = registry();
        let mut d = dispatcher(&reg);
        let err = d.execute_line("fail").unwrap_err();
        assert!(err.to_string().contains("command failed: fail"));
        assert!(format!("{err:#}").contains("boom"));
    }

    #[test]
    fn handlers_can_change_settings() {
        let reg = registry();
        let mut d = dispatcher(&reg);
        d.execute_line("toggle -on false").unwrap();
        assert!(!d.settings().profile);
    }

    #[test]
    fn script_stops_at_first_rejection() {
        let reg = registry();
        let mut d = dispatcher(&reg);
        let results = d
            .execute_script("echo -text a; area 1; echo -text never")
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[1].is_rejected());
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        let reg = registry();
        let mut d = dispatcher(&reg);
        assert!(d.execute_line("   ").unwrap().is_none());
        assert!(d.execute_line("# note").unwrap().is_none());
    }

    #[test]
    fn split_script_respects_quotes() {
        assert_eq!(
            split_script("echo -text \"a; b\"; area 1 2\n\necho"),
            vec!["echo -text \"a; b\"", " area 1 2", "echo"]
        );
    }

    #[test]
    fn dispatch_serializes_with_status() {
        let d = Dispatch::Help {
            command: "x".into(),
            text: "t".into(),
        };
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["status"], "help");
    }
}
