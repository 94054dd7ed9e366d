/*!
validate.rs - check one invocation against a compiled `CommandSpec`.

Order of checks:
  1. `-help` / `-h` anywhere        -> HelpRequested (nothing else is checked)
  2. too few non-flag tokens         -> ArgumentCountError (extra is fine)
  3. each flag + its parameter run   -> UnknownOption / OptionConstraintError
  4. otherwise                       -> Ok

The check is pure: it can run any number of times on the same tokens.
*/

use serde::Serialize;
use std::fmt;

use super::grammar::CommandSpec;
use super::matcher::matches_compiled;
use super::token::is_flag_like;

pub const HELP_FLAGS: [&str; 2] = ["-help", "-h"];

/// Result of validating one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Ok,
    HelpRequested {
        /// Declared flag named right after `-help`, if any (`cmd -help -width`).
        topic: Option<String>,
    },
    ArgumentCountError {
        required: usize,
        supplied: usize,
    },
    UnknownOption {
        flag: String,
    },
    OptionConstraintError {
        flag: String,
        params: Vec<String>,
        constraint: String,
    },
}

impl ValidationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationOutcome::Ok)
    }

    /// Whether the handler may run.
    pub fn permits_dispatch(&self) -> bool {
        self.is_ok()
    }

    /// Diagnostic for the error variants.
    pub fn message(&self) -> Option<String> {
        match self {
            ValidationOutcome::Ok | ValidationOutcome::HelpRequested { .. } => None,
            ValidationOutcome::ArgumentCountError { required, supplied } => Some(format!(
                "Invalid option arguments: expected at least {required} positional argument(s), got {supplied}"
            )),
            ValidationOutcome::UnknownOption { flag } => {
                Some(format!("Invalid option name: {flag}"))
            }
            ValidationOutcome::OptionConstraintError {
                flag,
                params,
                constraint,
            } => Some(format!(
                "Invalid option arguments: {flag} {} (expected {})",
                params.join(" "),
                if constraint.is_empty() {
                    "no value"
                } else {
                    constraint.as_str()
                }
            )),
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationOutcome::Ok => f.write_str("ok"),
            ValidationOutcome::HelpRequested { .. } => f.write_str("help requested"),
            other => f.write_str(&other.message().unwrap_or_default()),
        }
    }
}

/// Validate `tokens` (token 0 is the command name) against `spec`.
pub fn validate(spec: &CommandSpec, tokens: &[String]) -> ValidationOutcome {
    let args = tokens.get(1..).unwrap_or_default();

    if let Some(pos) = args.iter().position(|t| HELP_FLAGS.contains(&t.as_str())) {
        let topic = args
            .get(pos + 1)
            .filter(|t| is_flag_like(t) && spec.option(t).is_some())
            .cloned();
        return ValidationOutcome::HelpRequested { topic };
    }

    let required = spec.required_arguments();
    let supplied = args.iter().filter(|t| !is_flag_like(t)).count();
    if supplied < required {
        return ValidationOutcome::ArgumentCountError { required, supplied };
    }

    let mut i = 0;
    while i < args.len() {
        let flag = &args[i];
        i += 1;
        if !is_flag_like(flag) {
            continue;
        }
        let start = i;
        while i < args.len() && !is_flag_like(&args[i]) {
            i += 1;
        }
        let params = &args[start..i];

        let Some(option) = spec.option(flag) else {
            return ValidationOutcome::UnknownOption { flag: flag.clone() };
        };
        if !matches_compiled(params, &option.compiled) {
            return ValidationOutcome::OptionConstraintError {
                flag: flag.clone(),
                params: params.to_vec(),
                constraint: option.constraint.clone(),
            };
        }
    }

    ValidationOutcome::Ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn resize() -> CommandSpec {
        CommandSpec::compile(
            "resize",
            "<width> <height> -color <string> -id <int> -mode fast|slow -keep",
        )
    }

    #[test]
    fn help_wins_over_everything() {
        let spec = resize();
        for t in [
            tokens(&["resize", "-help"]),
            tokens(&["resize", "-bogus", "x", "-h"]),
            tokens(&["resize", "-id", "nope", "-help"]),
        ] {
            assert!(matches!(
                validate(&spec, &t),
                ValidationOutcome::HelpRequested { .. }
            ));
        }
    }

    #[test]
    fn help_topic_is_captured() {
        let spec = resize();
        assert_eq!(
            validate(&spec, &tokens(&["resize", "-help", "-id"])),
            ValidationOutcome::HelpRequested {
                topic: Some("-id".into())
            }
        );
    }

    #[test]
    fn undeclared_help_topic_is_dropped() {
        let spec = resize();
        for t in [
            tokens(&["resize", "-help", "-zzz"]),
            tokens(&["resize", "-help", "-h"]),
            tokens(&["resize", "-h", "10"]),
        ] {
            assert_eq!(
                validate(&spec, &t),
                ValidationOutcome::HelpRequested { topic: None }
            );
        }
    }

    #[test]
    fn argument_count_is_a_minimum() {
        let spec = resize();
        assert_eq!(
            validate(&spec, &tokens(&["resize", "10"])),
            ValidationOutcome::ArgumentCountError {
                required: 2,
                supplied: 1
            }
        );
        assert!(validate(&spec, &tokens(&["resize", "10", "20"])).is_ok());
        assert!(validate(&spec, &tokens(&["resize", "10", "20", "30"])).is_ok());
    }

    #[test]
    fn option_parameters_count_as_positionals() {
        let spec = resize();
        assert!(validate(&spec, &tokens(&["resize", "-color", "red", "green"])).is_ok());
    }

    #[test]
    fn negative_numbers_are_data() {
        let spec = resize();
        assert!(validate(&spec, &tokens(&["resize", "-5", "-6", "-id", "-7"])).is_ok());
    }

    #[test]
    fn unknown_option() {
        let spec = resize();
        assert_eq!(
            validate(&spec, &tokens(&["resize", "1", "2", "-depth", "3"])),
            ValidationOutcome::UnknownOption {
                flag: "-depth".into()
            }
        );
    }

    #[test]
    fn constraint_failures() {
        let spec = resize();
        let out = validate(&spec, &tokens(&["resize", "1", "2", "-id", "x"]));
        assert_eq!(
            out,
            ValidationOutcome::OptionConstraintError {
                flag: "-id".into(),
                params: vec!["x".into()],
                constraint: "<int>".into(),
            }
        );
        assert!(out.message().unwrap().contains("-id x"));

        let out = validate(&spec, &tokens(&["resize", "1", "2", "-keep", "yes"]));
        assert!(matches!(out, ValidationOutcome::OptionConstraintError { .. }));
    }

    #[test]
    fn multi_word_string_and_enumeration() {
        let spec = resize();
        let t = tokens(&["resize", "1", "2", "-color", "deep", "blue", "-mode", "fast"]);
        assert!(validate(&spec, &t).is_ok());
        let t = tokens(&["resize", "1", "2", "-mode"]);
        assert!(validate(&spec, &t).is_ok(), "empty enumeration passes");
    }

    #[test]
    fn validation_is_repeatable() {
        let spec = resize();
        let t = tokens(&["resize", "1", "2", "-id", "3"]);
        assert_eq!(validate(&spec, &t), validate(&spec, &t));
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let v = serde_json::to_value(ValidationOutcome::UnknownOption { flag: "-q".into() })
            .unwrap();
        assert_eq!(v["outcome"], "unknown_option");
        assert_eq!(v["flag"], "-q");
    }
}
