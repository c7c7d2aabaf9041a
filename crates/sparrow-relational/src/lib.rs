#![warn(
    rust_2018_idioms,
    nonstandard_style,
    future_incompatible,
    clippy::mod_module_files,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::undocumented_unsafe_blocks
)]

//! Relational expression trees produced by query translation.
//!
//! Expressions are immutable trees of [`Expr`] nodes shared via [`ExprRef`].
//! New nodes are created through an [`ExprBuilder`], which validates operand
//! types and decides the result type of each node. Passes that rewrite a
//! tree produce new nodes with the `update` methods on each node kind, so
//! untouched subtrees are shared with the input.

mod builder;
mod display;
mod error;
pub mod eval;
mod expr;
mod literal;
mod translate;
mod typecheck;

#[cfg(feature = "testing")]
pub mod testing;

pub use builder::*;
pub use error::*;
pub use expr::*;
pub use literal::*;
pub use translate::*;
