//! Recipe-graph primitives shared by every strategy.
//!
//! - [`name`]: case-insensitive element keys and display spelling.
//! - [`element`]: interned element ids, recipes, steps and tiers.
//! - [`tree`]: the serializable derivation tree returned to callers.

pub mod element;
pub mod name;
pub mod tree;
