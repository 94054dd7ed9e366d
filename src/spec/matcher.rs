//! Constraint matching: does a run of option parameters satisfy an option's
//! compiled constraint?
//!
//! Rules are applied in a fixed order (see `Constraint` for the shapes):
//!   empty  -> no parameters allowed
//!   {..}   -> exact text after stripping braces on both sides
//!   <string> alone -> anything non-empty, any number of words
//!   a|b|c alone    -> every word is an alternative (zero words passes)
//!   otherwise      -> same arity, each word checked against its slot

use super::grammar::{Constraint, Slot, ValueType};
use super::token::{is_double, is_int, strip_braces};

/// Match parameters against an already compiled constraint.
pub fn matches_compiled(params: &[String], constraint: &Constraint) -> bool {
    match constraint {
        Constraint::Empty => params.is_empty(),
        Constraint::Malformed => false,
        Constraint::Literal(expected) => strip_braces(&params.join(" ")) == expected,
        Constraint::AnyString => !params.join(" ").trim().is_empty(),
        // Zero parameters pass: an enumeration only restricts what is given.
        Constraint::Enumeration(alternatives) => params
            .iter()
            .all(|p| alternatives.iter().any(|alt| alt == p)),
        Constraint::Sequence(slots) => {
            params.len() == slots.len()
                && params
                    .iter()
                    .zip(slots)
                    .all(|(param, slot)| slot_accepts(slot, param))
        }
    }
}

fn slot_accepts(slot: &Slot, param: &str) -> bool {
    match slot {
        Slot::Typed(ValueType::Int) => is_int(param),
        Slot::Typed(ValueType::Double | ValueType::Float) => is_double(param),
        Slot::Typed(ValueType::String) => !param.is_empty(),
        Slot::Typed(ValueType::Unknown(_)) => true,
        Slot::Literal(alternatives) => alternatives.iter().any(|alt| alt == param),
    }
}
