//! Command registry: compiled specs plus their handlers, in registration order.
//!
//! Built once at start-up and only read afterwards, so it is shared by plain
//! `&` reference. Entries are never removed.

use tracing::{debug, warn};

use super::grammar::CommandSpec;

/// One registered command.
#[derive(Debug)]
pub struct Entry<H> {
    pub spec: CommandSpec,
    pub handler: H,
}

/// Append-only store of commands. `H` is the handler type bound by the
/// dispatch layer.
#[derive(Debug)]
pub struct CommandRegistry<H> {
    entries: Vec<Entry<H>>,
}

impl<H> Default for CommandRegistry<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H> CommandRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `raw_spec` and append the command.
    ///
    /// Duplicate names are kept, but only the first one is reachable through
    /// [`lookup`](Self::lookup); a warning names the shadowed entry.
    ///
    /// # Panics
    /// On an empty command name, which only a broken start-up sequence can
    /// produce.
    pub fn register(&mut self, name: &str, raw_spec: &str, handler: H) -> &CommandSpec {
        assert!(!name.trim().is_empty(), "command registered without a name");

        if let Some(first) = self.lookup(name) {
            warn!(
                command = name,
                kept = %first.spec.raw,
                shadowed = raw_spec,
                "duplicate command registration; the later entry is unreachable by name"
            );
        }

        let spec = CommandSpec::compile(name, raw_spec);
        debug!(
            command = name,
            arguments = spec.required_arguments(),
            options = spec.options.len(),
            "registered command"
        );
        self.entries.push(Entry { spec, handler });
        &self.entries[self.entries.len() - 1].spec
    }

    /// First entry registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<&Entry<H>> {
        self.entries.iter().find(|e| e.spec.name == name)
    }

    /// Index of the first token after the command name equal to `flag`.
    pub fn locate(tokens: &[String], flag: &str) -> Option<usize> {
        tokens
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, t)| t.as_str() == flag)
            .map(|(i, _)| i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<H>> {
        self.entries.iter()
    }
}

/// Positional token bound to `placeholder` in the command's argument pattern.
///
/// `place_cell <cell> <x> <y>` invoked as `place_cell u1 10 20` gives `"10"`
/// for `<x>`. Positions are counted over the raw invocation, so this is only
/// meaningful when positionals precede the options.
pub fn get_object<'a>(spec: &CommandSpec, tokens: &'a [String], placeholder: &str) -> Option<&'a str> {
    let index = spec.arguments().position(|word| word == placeholder)?;
    tokens.get(index + 1).map(String::as_str)
}
