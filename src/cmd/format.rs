/*!
format.rs - human output helpers for the CLI (JSON paths never use these).

Style is decided once per process; output that is not a terminal is plain:
  NO_COLOR  -> plain text
  NO_EMOJI  -> no status glyphs
  COLUMNS   -> table width (clamped 40..=220, default 100)

API:
  StyleOptions::detect()
  color(role, text, &style)
  emoji(tag, &style)
  banner(title, subtitle, &style)
  table(headers, rows, &style)
  outcome_line(&Dispatch, &style)
*/

use std::borrow::Cow;
use std::io::IsTerminal;

use crate::runtime::Dispatch;

/* ---- Style Options ---- */

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub use_emoji: bool,
    pub term_width: usize,
}

impl StyleOptions {
    pub fn detect() -> Self {
        let term_width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|w| w.clamp(40, 220))
            .unwrap_or(100);
        let mut style = Self::plain();
        style.term_width = term_width;
        if std::io::stdout().is_terminal() {
            style.use_color = std::env::var_os("NO_COLOR").is_none();
            style.use_emoji = std::env::var_os("NO_EMOJI").is_none();
        }
        style
    }

    pub fn plain() -> Self {
        Self {
            use_color: false,
            use_emoji: false,
            term_width: 100,
        }
    }
}

/* ---- Color / Emoji ---- */

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Primary,
    Secondary,
    Accent,
    Success,
    Error,
    Dim,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Primary => "38;5;45",
        Role::Secondary => "38;5;250",
        Role::Accent => "38;5;213",
        Role::Success => "38;5;82",
        Role::Error => "38;5;196",
        Role::Dim => "2",
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

pub fn emoji(tag: &str, style: &StyleOptions) -> &'static str {
    if !style.use_emoji {
        return "";
    }
    match tag {
        "ok" => "✔",
        "reject" => "✖",
        "help" => "ℹ",
        "clock" => "⏱",
        "list" => "📜",
        _ => "",
    }
}

/* ---- Banner ---- */

/// Title (and optional dimmed subtitle) inside a three-line box.
pub fn banner(title: impl AsRef<str>, subtitle: Option<&str>, style: &StyleOptions) -> String {
    let title = color(Role::Primary, title.as_ref(), style);
    let inner = match subtitle {
        Some(sub) => format!(" {title}  {} ", color(Role::Secondary, sub, style)),
        None => format!(" {title} "),
    };
    let width = display_width(&inner) + 2;
    let rule = "─".repeat(width);
    format!("┌{rule}┐\n│ {inner} │\n└{rule}┘")
}

/* ---- Table ---- */

/// Left-aligned columns separated by two spaces; the widest column is
/// truncated with `…` when the row would exceed the terminal width.
pub fn table(headers: &[&str], rows: &[Vec<String>], style: &StyleOptions) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(cols) {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    let total = widths.iter().sum::<usize>() + (cols - 1) * 2;
    if total > style.term_width
        && let Some((widest, _)) = widths.iter().enumerate().max_by_key(|(_, w)| **w)
    {
        let overflow = total - style.term_width;
        widths[widest] = widths[widest].saturating_sub(overflow).max(4);
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(color(
        Role::Accent,
        render_row(headers.iter().copied(), &widths),
        style,
    ));
    lines.push(color(
        Role::Dim,
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
        style,
    ));
    for row in rows {
        let cells = (0..cols).map(|c| row.get(c).map(String::as_str).unwrap_or(""));
        lines.push(render_row(cells, &widths));
    }
    lines.join("\n")
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, w)| fit(cell, *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn fit(cell: &str, width: usize) -> String {
    let len = display_width(cell);
    if len <= width {
        return format!("{cell}{}", " ".repeat(width - len));
    }
    let mut out: String = strip_ansi(cell).chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/* ---- Dispatch Output ---- */

/// Human rendering of one dispatch result.
pub fn outcome_line(dispatch: &Dispatch, style: &StyleOptions) -> String {
    match dispatch {
        Dispatch::Completed {
            output, profile, ..
        } => {
            let mut out = output.clone();
            if let Some(report) = profile {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&color(
                    Role::Dim,
                    format!("{} {report}", emoji("clock", style)).trim_start(),
                    style,
                ));
            }
            out
        }
        Dispatch::Help { text, .. } => text.clone(),
        Dispatch::Rejected { message, help, .. } => format!(
            "{}\n{help}",
            color(
                Role::Error,
                format!("{} {message}", emoji("reject", style)).trim_start(),
                style
            )
        ),
    }
}

/* ---- ANSI ---- */

pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(ch);
    }
    Cow::Owned(out)
}

fn display_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}
