//! Help text for compiled command specs.
//!
//! Layout:
//!
//! ```text
//! Command: resize
//! Arguments: <width> <height>
//! Options: -color <string> -id <int> -mode fast|slow -keep -scale <double>
//!          -anchor n|s -help -h
//! ```
//!
//! A new line starts at every fifth declared option. `-!flag` options only
//! show up when asked for by name, and `-help -h` always closes the listing.
//! The `Arguments:` line is always present, empty when the command takes none.

use super::grammar::{CommandSpec, OptionSpec};
use super::registry::CommandRegistry;

const OPTIONS_PER_LINE: usize = 5;
const OPTIONS_LABEL: &str = "Options: ";
const HELP_ENTRY: &str = "-help -h";

fn option_slot(option: &OptionSpec) -> String {
    if option.constraint.is_empty() {
        option.flag.clone()
    } else {
        format!("{} {}", option.flag, option.constraint)
    }
}

/// Visible options grouped into help lines. A line starts at every fifth
/// declared option, hidden ones included in the count.
fn option_lines(spec: &CommandSpec) -> Vec<Vec<&OptionSpec>> {
    let mut lines: Vec<Vec<&OptionSpec>> = vec![Vec::new()];
    for (i, option) in spec.options.iter().enumerate() {
        if option.is_hidden() {
            continue;
        }
        if i > 0 && i % OPTIONS_PER_LINE == 0 && lines.last().is_some_and(|l| !l.is_empty()) {
            lines.push(Vec::new());
        }
        if let Some(line) = lines.last_mut() {
            line.push(option);
        }
    }
    lines.retain(|l| !l.is_empty());
    lines
}

/// Help for one command, or only for `requested_flag` when given.
pub fn render(spec: &CommandSpec, requested_flag: Option<&str>) -> String {
    let grouped: Vec<Vec<&OptionSpec>> = match requested_flag {
        Some(flag) => vec![spec.options.iter().filter(|o| o.flag == flag).take(1).collect()],
        None => option_lines(spec),
    };

    let mut lines: Vec<String> = grouped
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.iter()
                .map(|o| option_slot(o))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    match lines.last_mut() {
        Some(last) => {
            last.push(' ');
            last.push_str(HELP_ENTRY);
        }
        None => lines.push(HELP_ENTRY.to_string()),
    }

    let indent = " ".repeat(OPTIONS_LABEL.len());
    let mut out = format!("Command: {}\n", spec.name);
    out.push_str(format!("Arguments: {}", spec.argument_pattern).trim_end());
    out.push('\n');
    for (i, line) in lines.iter().enumerate() {
        out.push_str(if i == 0 { OPTIONS_LABEL } else { indent.as_str() });
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Help for every registered command, in registration order.
///
/// Commands named `test*` are internal and left out.
pub fn render_index<H>(registry: &CommandRegistry<H>) -> String {
    registry
        .iter()
        .filter(|e| !e.spec.name.starts_with("test"))
        .map(|e| render(&e.spec, None))
        .collect::<Vec<_>>()
        .join("\n")
}
