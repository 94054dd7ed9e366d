/*!
grammar.rs - option specification compiler.

A command declares its interface as one line of text:

    <width> <height> -color <string> -id <int> -mode fast|slow -!debug

  - leading non-flag words form the positional argument pattern
  - every flag-looking word (`-` + non-digit) opens an option
  - the words after a flag, up to the next flag, are its constraint
  - `{...}` keeps a multi-word literal together (braces may nest)
  - a lone `-` promotes the next word to a flag name (`- -3d`)
  - a `!` as second character hides the flag from default help

Constraints are compiled once into a small AST (`Constraint`) so the matcher
never re-derives meaning from raw text per invocation.
*/

use serde::Serialize;
use tracing::warn;

use super::token::{is_flag_like, split_spec, strip_braces};

/* ---- Constraint AST ---- */

/// Lexical type named by a `<...>` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Double,
    /// Same lexical rule as `Double`; read back as `f32`.
    Float,
    String,
    /// Unrecognized placeholder name; matches anything.
    Unknown(String),
}

impl ValueType {
    fn from_placeholder(word: &str) -> Option<Self> {
        let name = word.strip_prefix('<')?.strip_suffix('>')?;
        Some(match name {
            "int" => ValueType::Int,
            "double" => ValueType::Double,
            "float" => ValueType::Float,
            "string" => ValueType::String,
            other => ValueType::Unknown(other.to_string()),
        })
    }
}

/// One position of a multi-word constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Typed(ValueType),
    /// Literal word; `|` separates accepted spellings.
    Literal(Vec<String>),
}

/// Compiled form of an option's constraint text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Constraint {
    /// No value expected.
    Empty,
    /// `{...}`: the joined parameters must equal this text exactly.
    Literal(String),
    /// A lone `<string>`: any non-empty run of words.
    AnyString,
    /// A lone `a|b|c`: every supplied word must be one of these.
    Enumeration(Vec<String>),
    /// Fixed arity, one slot per word.
    Sequence(Vec<Slot>),
    /// Starts with `{` but never closes; nothing matches it.
    Malformed,
}

impl Constraint {
    /// Compile raw constraint text. Unknown placeholders are reported here,
    /// once, rather than on every match.
    pub fn compile(raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() {
            return Constraint::Empty;
        }
        if text.starts_with('{') {
            if !text.ends_with('}') {
                warn!(constraint = text, "unterminated brace group in constraint");
                return Constraint::Malformed;
            }
            return Constraint::Literal(strip_braces(text).to_string());
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        if let [only] = words.as_slice() {
            if *only == "<string>" {
                return Constraint::AnyString;
            }
            if !is_placeholder(only) {
                return Constraint::Enumeration(alternatives(only));
            }
        }

        let slots = words
            .iter()
            .map(|word| match ValueType::from_placeholder(word) {
                Some(ValueType::Unknown(name)) => {
                    warn!(placeholder = %name, constraint = text, "unsupported data type; slot accepts any value");
                    Slot::Typed(ValueType::Unknown(name))
                }
                Some(ty) => Slot::Typed(ty),
                None => Slot::Literal(alternatives(word)),
            })
            .collect();
        Constraint::Sequence(slots)
    }
}

fn is_placeholder(word: &str) -> bool {
    word.starts_with('<') && word.ends_with('>') && word.len() > 2
}

fn alternatives(word: &str) -> Vec<String> {
    word.split('|')
        .filter(|alt| !alt.is_empty())
        .map(str::to_string)
        .collect()
}

/* ---- Specs ---- */

/// One named option of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSpec {
    pub flag: String,
    /// Raw constraint text, words joined with single spaces.
    pub constraint: String,
    #[serde(skip)]
    pub compiled: Constraint,
}

impl OptionSpec {
    pub fn new(flag: impl Into<String>, constraint: impl Into<String>) -> Self {
        let constraint = constraint.into();
        let compiled = Constraint::compile(&constraint);
        Self {
            flag: flag.into(),
            constraint,
            compiled,
        }
    }

    /// `-!name` options are left out of the default help listing.
    pub fn is_hidden(&self) -> bool {
        self.flag.chars().nth(1) == Some('!')
    }
}

/// The compiled interface of one command. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub name: String,
    pub raw: String,
    pub argument_pattern: String,
    pub options: Vec<OptionSpec>,
}

impl CommandSpec {
    pub fn compile(name: impl Into<String>, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let (argument_pattern, options) = compile(&raw);
        Self {
            name: name.into(),
            raw,
            argument_pattern,
            options,
        }
    }

    /// Placeholder words of the positional pattern.
    pub fn arguments(&self) -> impl Iterator<Item = &str> {
        self.argument_pattern.split_whitespace()
    }

    pub fn required_arguments(&self) -> usize {
        self.arguments().count()
    }

    /// First option declared with exactly this flag.
    pub fn option(&self, flag: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.flag == flag)
    }
}

/// Split raw spec text into the positional pattern and ordered options.
pub fn compile(raw: &str) -> (String, Vec<OptionSpec>) {
    let (tokens, unterminated) = split_spec(raw);
    if unterminated {
        warn!(spec = raw, "unterminated brace group in spec");
    }

    let opens_option = |t: &str| t == "-" || is_flag_like(t);

    let split_at = tokens
        .iter()
        .position(|t| opens_option(t.as_str()))
        .unwrap_or(tokens.len());
    let argument_pattern = tokens[..split_at].join(" ");

    let mut options = Vec::new();
    let mut rest = tokens[split_at..].iter().peekable();
    while let Some(token) = rest.next() {
        let flag = if token == "-" {
            match rest.next() {
                Some(name) if name.starts_with('-') && name.len() > 1 => name.clone(),
                Some(name) => format!("-{name}"),
                None => {
                    warn!(spec = raw, "dangling '-' at end of spec ignored");
                    break;
                }
            }
        } else {
            token.clone()
        };

        let mut words = Vec::new();
        while let Some(next) = rest.next_if(|t| !opens_option(t.as_str())) {
            words.push(next.as_str());
        }
        options.push(OptionSpec::new(flag, words.join(" ")));
    }

    (argument_pattern, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(options: &[OptionSpec]) -> Vec<(&str, &str)> {
        options
            .iter()
            .map(|o| (o.flag.as_str(), o.constraint.as_str()))
            .collect()
    }

    #[test]
    fn splits_arguments_and_options() {
        let (args, options) = compile("<width> <height> -color <string> -id <int>");
        assert_eq!(args, "<width> <height>");
        assert_eq!(
            flags(&options),
            vec![("-color", "<string>"), ("-id", "<int>")]
        );
    }

    #[test]
    fn negative_number_is_not_a_flag() {
        let (args, options) = compile("-offset <int> -1");
        assert_eq!(args, "");
        assert_eq!(flags(&options), vec![("-offset", "<int> -1")]);
    }

    #[test]
    fn brace_group_stays_one_constraint_word() {
        let (_, options) = compile("-title {hello big world} -x");
        assert_eq!(
            flags(&options),
            vec![("-title", "{hello big world}"), ("-x", "")]
        );
        assert_eq!(
            options[0].compiled,
            Constraint::Literal("hello big world".into())
        );
        assert_eq!(options[1].compiled, Constraint::Empty);
    }

    #[test]
    fn lone_dash_promotes_next_word() {
        let (_, options) = compile("- -3d <int> - verbose");
        assert_eq!(flags(&options), vec![("-3d", "<int>"), ("-verbose", "")]);
    }

    #[test]
    fn dangling_dash_is_dropped() {
        let (args, options) = compile("<a> -");
        assert_eq!(args, "<a>");
        assert!(options.is_empty());
    }

    #[test]
    fn constraint_kinds() {
        assert_eq!(Constraint::compile("<string>"), Constraint::AnyString);
        assert_eq!(
            Constraint::compile("a|b|c"),
            Constraint::Enumeration(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(
            Constraint::compile("<int>"),
            Constraint::Sequence(vec![Slot::Typed(ValueType::Int)])
        );
        assert_eq!(
            Constraint::compile("<float> <double>"),
            Constraint::Sequence(vec![
                Slot::Typed(ValueType::Float),
                Slot::Typed(ValueType::Double)
            ])
        );
        assert_eq!(
            Constraint::compile("<point> x|y"),
            Constraint::Sequence(vec![
                Slot::Typed(ValueType::Unknown("point".into())),
                Slot::Literal(vec!["x".into(), "y".into()])
            ])
        );
        assert_eq!(Constraint::compile("{open"), Constraint::Malformed);
    }

    #[test]
    fn hidden_flags() {
        let spec = CommandSpec::compile("dbg", "-!trace -level <int>");
        assert!(spec.options[0].is_hidden());
        assert!(!spec.options[1].is_hidden());
    }

    #[test]
    fn first_declared_option_wins() {
        let spec = CommandSpec::compile("dup", "-a <int> -a <string>");
        assert_eq!(spec.option("-a").map(|o| o.constraint.as_str()), Some("<int>"));
        assert_eq!(spec.required_arguments(), 0);
    }
}
