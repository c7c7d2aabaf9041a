#![warn(
    rust_2018_idioms,
    nonstandard_style,
    future_incompatible,
    clippy::mod_module_files,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::undocumented_unsafe_blocks
)]

//! Null-semantics normalization of relational expressions.
//!
//! Comparisons in a query follow the host language, where `NULL` is a value
//! equal only to itself. Relational engines compare under three-valued logic,
//! where any comparison with `NULL` is unknown. [`rewrite_null_semantics`]
//! makes every comparison with a nullable operand explicit about `NULL` using
//! `IS NULL` and `IS NOT NULL` guards, so the rewritten tree never depends on
//! three-valued comparisons. [`simplify`] then removes the redundancy this
//! introduces.
//!
//! [`optimize`] runs both passes as configured by [`NullSemanticsOptions`].

mod error;
mod optimize;
mod options;
mod rewrite;
mod simplify;

pub use error::*;
pub use optimize::*;
pub use options::*;
pub use rewrite::*;
pub use simplify::*;
