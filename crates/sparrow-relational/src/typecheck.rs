use arrow_schema::DataType;

use crate::{BinaryOp, Error, UnaryOp};

pub(crate) fn is_integer(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

pub(crate) fn is_floating(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Float16 | DataType::Float32 | DataType::Float64
    )
}

fn is_numeric(data_type: &DataType) -> bool {
    is_integer(data_type) || is_floating(data_type)
}

fn is_boolean(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Boolean | DataType::Null)
}

pub(crate) fn is_string(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Null
    )
}

/// Return the type both arguments may be compared or combined as.
///
/// An untyped `NULL` adopts the type of the other side. Mixing integer and
/// floating point types yields `Float64`; mixing integer widths yields `Int64`.
pub(crate) fn common_type(a: &DataType, b: &DataType) -> Option<DataType> {
    match (a, b) {
        (a, b) if a == b => Some(a.clone()),
        (DataType::Null, other) | (other, DataType::Null) => Some(other.clone()),
        (a, b) if is_integer(a) && is_integer(b) => Some(DataType::Int64),
        (a, b) if is_numeric(a) && is_numeric(b) => Some(DataType::Float64),
        (DataType::Utf8, DataType::LargeUtf8) | (DataType::LargeUtf8, DataType::Utf8) => {
            Some(DataType::LargeUtf8)
        }
        _ => None,
    }
}

/// Type-check a unary operator, returning the result type.
pub(crate) fn typecheck_unary(
    op: UnaryOp,
    operand: &DataType,
) -> error_stack::Result<DataType, Error> {
    match op {
        UnaryOp::Not => {
            error_stack::ensure!(
                is_boolean(operand),
                Error::invalid_operands(op.name(), [operand])
            );
            Ok(DataType::Boolean)
        }
        UnaryOp::IsNull | UnaryOp::IsNotNull => Ok(DataType::Boolean),
        UnaryOp::Negate => {
            error_stack::ensure!(
                is_numeric(operand) || operand == &DataType::Null,
                Error::invalid_operands(op.name(), [operand])
            );
            Ok(operand.clone())
        }
    }
}

/// Type-check a binary operator, returning the result type.
pub(crate) fn typecheck_binary(
    op: BinaryOp,
    left: &DataType,
    right: &DataType,
) -> error_stack::Result<DataType, Error> {
    let invalid = || Error::invalid_operands(op.name(), [left, right]);
    match op {
        BinaryOp::AndAlso | BinaryOp::OrElse => {
            error_stack::ensure!(is_boolean(left) && is_boolean(right), invalid());
            Ok(DataType::Boolean)
        }
        _ if op.is_comparison() => {
            error_stack::ensure!(common_type(left, right).is_some(), invalid());
            Ok(DataType::Boolean)
        }
        BinaryOp::Coalesce => Ok(common_type(left, right).ok_or_else(invalid)?),
        _ => {
            debug_assert!(op.is_arithmetic());
            let result = common_type(left, right).ok_or_else(invalid)?;
            error_stack::ensure!(
                is_numeric(&result) || result == DataType::Null,
                invalid()
            );
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_type() {
        assert_eq!(
            common_type(&DataType::Int32, &DataType::Int32),
            Some(DataType::Int32)
        );
        assert_eq!(
            common_type(&DataType::Null, &DataType::Utf8),
            Some(DataType::Utf8)
        );
        assert_eq!(
            common_type(&DataType::Int32, &DataType::Int64),
            Some(DataType::Int64)
        );
        assert_eq!(
            common_type(&DataType::Int32, &DataType::Float32),
            Some(DataType::Float64)
        );
        assert_eq!(common_type(&DataType::Int32, &DataType::Utf8), None);
    }

    #[test]
    fn test_typecheck_binary() {
        assert_eq!(
            typecheck_binary(BinaryOp::Equal, &DataType::Int64, &DataType::Null).unwrap(),
            DataType::Boolean
        );
        assert_eq!(
            typecheck_binary(BinaryOp::Add, &DataType::Int64, &DataType::Float64).unwrap(),
            DataType::Float64
        );
        assert!(typecheck_binary(BinaryOp::AndAlso, &DataType::Int64, &DataType::Boolean).is_err());
        assert!(typecheck_binary(BinaryOp::Add, &DataType::Utf8, &DataType::Utf8).is_err());
        assert!(typecheck_binary(BinaryOp::LessThan, &DataType::Utf8, &DataType::Int64).is_err());
    }

    #[test]
    fn test_typecheck_unary() {
        assert_eq!(
            typecheck_unary(UnaryOp::IsNull, &DataType::Utf8).unwrap(),
            DataType::Boolean
        );
        assert!(typecheck_unary(UnaryOp::Not, &DataType::Int64).is_err());
        assert_eq!(
            typecheck_unary(UnaryOp::Negate, &DataType::Float32).unwrap(),
            DataType::Float32
        );
    }
}
