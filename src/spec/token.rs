//! Lexical helpers shared by the compiler, matcher, validator and accessors.
//!
//! Every component that needs to decide "is this a flag?" or "is this an
//! integer?" goes through this module so the rules stay identical between
//! validation time and accessor time.

/// `-` followed by a non-digit character. `-1` is data, `-x` is a flag.
pub fn is_flag_like(token: &str) -> bool {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some('-'), Some(c)) => !c.is_ascii_digit(),
        _ => false,
    }
}

/// Optional leading `-`, then one or more ASCII digits.
pub fn is_int(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Optional leading `-`, then digits with at most one `.`.
///
/// A lone `.` (or `-.`) is rejected because it cannot be coerced to a number.
pub fn is_double(token: &str) -> bool {
    let body = token.strip_prefix('-').unwrap_or(token);
    if body.is_empty() {
        return false;
    }
    let mut dots = 0;
    let mut digits = 0;
    for b in body.bytes() {
        match b {
            b'.' => dots += 1,
            b'0'..=b'9' => digits += 1,
            _ => return false,
        }
    }
    dots <= 1 && digits > 0
}

/// Lower-case `true` / `false`, compared case-insensitively.
pub fn parse_bool(token: &str) -> Option<bool> {
    if token.eq_ignore_ascii_case("true") {
        Some(true)
    } else if token.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Strip any run of leading `{` and trailing `}` then trim whitespace.
pub fn strip_braces(text: &str) -> &str {
    text.trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .trim()
}

/// Split a raw spec on whitespace, keeping each `{...}` group as one token.
///
/// Braces nest: `{a {b c} d}` is a single token. An unterminated group runs to
/// the end of the input; the caller is told via the returned flag so it can
/// warn without rejecting the command.
pub fn split_spec(raw: &str) -> (Vec<String>, bool) {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in raw.chars() {
        match ch {
            '{' => {
                depth += 1;
                current.push(ch);
            }
            '}' if depth > 0 => {
                depth -= 1;
                current.push(ch);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    (tokens, depth > 0)
}

/// Rejoin an invocation for diagnostics; tokens containing spaces get braces.
pub fn full_name(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|t| {
            if t.contains(' ') {
                format!("{{{t}}}")
            } else {
                t.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
