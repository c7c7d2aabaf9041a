use std::borrow::Cow;

use arrow_schema::DataType;

#[derive(derive_more::Display, Debug)]
pub enum Error {
    #[display(fmt = "internal error: {_0}")]
    Internal(Cow<'static, str>),
    #[display(fmt = "invalid operand types for '{op}': {types:?}")]
    InvalidOperandTypes {
        op: &'static str,
        types: Vec<DataType>,
    },
    #[display(fmt = "literal {literal} is not a valid {data_type:?}")]
    InvalidLiteral { literal: String, data_type: DataType },
    #[display(fmt = "unexpected join predicate shape: {_0}")]
    InvalidJoinPredicate(String),
    #[display(fmt = "expected {expected} children for {kind}, but got {actual}")]
    InvalidChildren {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[display(fmt = "no value bound for '{_0}'")]
    UnboundValue(String),
    #[display(fmt = "unable to evaluate {_0}")]
    Unsupported(&'static str),
    #[display(fmt = "arithmetic overflow in '{_0}'")]
    ArithmeticOverflow(&'static str),
    #[display(fmt = "division by zero")]
    DivisionByZero,
}

impl Error {
    pub(crate) fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal(message.into())
    }

    pub(crate) fn invalid_operands<'a>(
        op: &'static str,
        types: impl IntoIterator<Item = &'a DataType>,
    ) -> Self {
        Self::InvalidOperandTypes {
            op,
            types: types.into_iter().cloned().collect(),
        }
    }
}

impl error_stack::Context for Error {}
