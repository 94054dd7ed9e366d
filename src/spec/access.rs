//! Typed option accessors used from inside command handlers.
//!
//! Each accessor re-scans the invocation on its own: results never depend on
//! an earlier `validate` call or on the order accessors are called in.

use thiserror::Error;

use super::registry::CommandRegistry;
use super::token::{is_double, is_flag_like, is_int, parse_bool};

/// Why an accessor produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("option {flag} not supplied")]
    Absent { flag: String },
    #[error("{expected} value is expected for option {flag}")]
    MissingValue { flag: String, expected: &'static str },
    #[error("{expected} value is expected for option {flag}, got '{found}'")]
    Invalid {
        flag: String,
        expected: &'static str,
        found: String,
    },
}

impl AccessError {
    /// The option was simply not given (as opposed to given badly).
    pub fn is_absent(&self) -> bool {
        matches!(self, AccessError::Absent { .. })
    }
}

pub type AccessResult<T> = Result<T, AccessError>;

fn locate(tokens: &[String], flag: &str) -> AccessResult<usize> {
    CommandRegistry::<()>::locate(tokens, flag).ok_or_else(|| AccessError::Absent {
        flag: flag.to_string(),
    })
}

/// Token right after `flag`, checked with `accept`.
fn single_value<'a>(
    tokens: &'a [String],
    flag: &str,
    expected: &'static str,
    accept: impl Fn(&str) -> bool,
) -> AccessResult<&'a str> {
    let index = locate(tokens, flag)?;
    let Some(value) = tokens.get(index + 1) else {
        return Err(AccessError::MissingValue {
            flag: flag.to_string(),
            expected,
        });
    };
    if !accept(value) {
        return Err(AccessError::Invalid {
            flag: flag.to_string(),
            expected,
            found: value.clone(),
        });
    }
    Ok(value.as_str())
}

fn invalid(flag: &str, expected: &'static str, found: &str) -> AccessError {
    AccessError::Invalid {
        flag: flag.to_string(),
        expected,
        found: found.to_string(),
    }
}

pub fn is_option_used(tokens: &[String], flag: &str) -> bool {
    locate(tokens, flag).is_ok()
}

pub fn get_bool(tokens: &[String], flag: &str) -> AccessResult<bool> {
    let raw = single_value(tokens, flag, "A boolean", |v| parse_bool(v).is_some())?;
    parse_bool(raw).ok_or_else(|| invalid(flag, "A boolean", raw))
}

pub fn get_int(tokens: &[String], flag: &str) -> AccessResult<i64> {
    let raw = single_value(tokens, flag, "An integer", is_int)?;
    raw.parse().map_err(|_| invalid(flag, "An integer", raw))
}

pub fn get_double(tokens: &[String], flag: &str) -> AccessResult<f64> {
    let raw = single_value(tokens, flag, "A double", is_double)?;
    raw.parse().map_err(|_| invalid(flag, "A double", raw))
}

pub fn get_float(tokens: &[String], flag: &str) -> AccessResult<f32> {
    let raw = single_value(tokens, flag, "A float", is_double)?;
    raw.parse().map_err(|_| invalid(flag, "A float", raw))
}

/// Words after `flag` joined by single spaces, up to the next flag or an
/// unexpanded `$variable`. Empty when something follows the flag but none
/// of it is a word; only a trailing flag is missing its value.
pub fn get_string(tokens: &[String], flag: &str) -> AccessResult<String> {
    let index = locate(tokens, flag)?;
    if index + 1 >= tokens.len() {
        return Err(AccessError::MissingValue {
            flag: flag.to_string(),
            expected: "A string",
        });
    }
    let words: Vec<&str> = tokens[index + 1..]
        .iter()
        .map(String::as_str)
        .take_while(|t| !is_flag_like(t) && !t.starts_with('$'))
        .collect();
    Ok(words.join(" "))
}
