/*!
builtin.rs - commands every session starts with, plus the named handlers a
manifest may bind its own commands to.

Built-in commands:
  echo      -text <string> -upper
  sum       <a> <b> -scale <double>
  sleep     -ms <int>
  profile   -enable true|false
  commands

Manifest handlers (by name): describe (default), echo, noop.
*/

use anyhow::{Context, Result};
use std::time::Duration;

use crate::runtime::{CallContext, Handler, Registry};
use crate::spec::grammar::{Constraint, Slot, ValueType};
use crate::spec::help::render_index;

/// (name, spec, handler) registered before any manifest command.
pub const BUILTINS: &[(&str, &str, Handler)] = &[
    ("echo", "-text <string> -upper", echo),
    ("sum", "<a> <b> -scale <double>", sum),
    ("sleep", "-ms <int>", sleep),
    ("profile", "-enable true|false", profile),
    ("commands", "", commands),
];

pub fn register_builtins(registry: &mut Registry) {
    for (name, spec, handler) in BUILTINS {
        registry.register(name, spec, *handler);
    }
}

/// Handler a manifest entry can name.
pub fn resolve(handler: &str) -> Option<Handler> {
    match handler {
        "describe" => Some(describe),
        "echo" => Some(echo),
        "noop" => Some(noop),
        _ => None,
    }
}

pub const HANDLER_NAMES: &[&str] = &["describe", "echo", "noop"];

/* ---- Handlers ---- */

fn echo(ctx: &mut CallContext<'_>) -> Result<String> {
    let text = match ctx.string("-text") {
        Ok(text) => text,
        Err(e) if e.is_absent() => String::new(),
        Err(e) => return Err(e.into()),
    };
    Ok(if ctx.has("-upper") {
        text.to_uppercase()
    } else {
        text
    })
}

fn sum(ctx: &mut CallContext<'_>) -> Result<String> {
    let mut total = 0.0;
    for placeholder in ["<a>", "<b>"] {
        let raw = ctx.positional(placeholder).unwrap_or_default();
        let value: f64 = raw
            .parse()
            .with_context(|| format!("{placeholder} must be a number, got '{raw}'"))?;
        total += value;
    }
    let scale = match ctx.double("-scale") {
        Ok(scale) => scale,
        Err(e) if e.is_absent() => 1.0,
        Err(e) => return Err(e.into()),
    };
    Ok(format!("{}", total * scale))
}

fn sleep(ctx: &mut CallContext<'_>) -> Result<String> {
    let ms = match ctx.int("-ms") {
        Ok(ms) => ms.max(0) as u64,
        Err(e) if e.is_absent() => 0,
        Err(e) => return Err(e.into()),
    };
    std::thread::sleep(Duration::from_millis(ms));
    Ok(format!("slept {ms} ms"))
}

/// `profile -enable false` switches reporting off; bare `profile` reports.
fn profile(ctx: &mut CallContext<'_>) -> Result<String> {
    if let Ok(enable) = ctx.bool("-enable") {
        ctx.settings.profile = enable;
    }
    Ok(format!(
        "profiling {}",
        if ctx.settings.profile { "on" } else { "off" }
    ))
}

fn commands(ctx: &mut CallContext<'_>) -> Result<String> {
    Ok(render_index(ctx.registry))
}

fn noop(_: &mut CallContext<'_>) -> Result<String> {
    Ok(String::new())
}

/// Report the supplied positionals and options, each read with the accessor
/// that fits its declared constraint.
fn describe(ctx: &mut CallContext<'_>) -> Result<String> {
    let mut parts = Vec::new();
    for placeholder in ctx.spec.arguments() {
        if let Some(value) = ctx.positional(placeholder) {
            parts.push(format!("{placeholder}={value}"));
        }
    }
    for option in &ctx.spec.options {
        if !ctx.has(&option.flag) {
            continue;
        }
        let value = match &option.compiled {
            Constraint::Empty => "set".to_string(),
            Constraint::Sequence(slots) if slots.len() == 1 => match &slots[0] {
                Slot::Typed(ValueType::Int) => ctx.int(&option.flag)?.to_string(),
                Slot::Typed(ValueType::Double) => ctx.double(&option.flag)?.to_string(),
                Slot::Typed(ValueType::Float) => ctx.float(&option.flag)?.to_string(),
                _ => ctx.string(&option.flag)?,
            },
            Constraint::Enumeration(_) => ctx.string(&option.flag).unwrap_or_default(),
            _ => ctx.string(&option.flag)?,
        };
        parts.push(format!("{}={value}", option.flag));
    }
    Ok(format!("{}: {}", ctx.spec.name, parts.join(" ")).trim_end().to_string())
}
