//! Remix suggestion catalog and bulk text parsing.
//!
//! A "remix" is a style-transfer edit applied to a slide image: a short label
//! plus the full edit prompt. This crate carries the built-in catalog of
//! suggestions, random slot filling, and the heuristic parser that splits
//! freeform pasted text (usually assistant output) into (label, prompt) pairs.

pub mod catalog;
pub mod parser;

pub use catalog::{
    CATALOG, assistant_instructions, pad_to_slots, random_slots, random_suggestion,
};
pub use parser::parse_pasted;
