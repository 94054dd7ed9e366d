//! Command option specification language.
//!
//! compile (grammar) -> register (registry) -> validate -> access / help.
//!
//!   token    - lexical rules shared by every stage
//!   grammar  - spec text -> `CommandSpec` with compiled `Constraint`s
//!   matcher  - parameters vs one constraint
//!   registry - append-only command store, first registration wins
//!   validate - whole invocation vs a spec -> `ValidationOutcome`
//!   access   - typed option extraction for handlers
//!   help     - human-readable rendering of a spec

pub mod access;
pub mod grammar;
pub mod help;
pub mod matcher;
pub mod registry;
pub mod token;
pub mod validate;

pub use grammar::CommandSpec;
pub use validate::{ValidationOutcome, validate};
