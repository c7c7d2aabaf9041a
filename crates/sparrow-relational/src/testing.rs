//! Utilities for testing passes over expression trees.
mod arb_exprs;

pub use arb_exprs::*;
