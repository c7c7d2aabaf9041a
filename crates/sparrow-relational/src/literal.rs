use arrow_schema::DataType;

/// A literal value held by a constant expression.
///
/// This is also the value produced by [`crate::eval::evaluate`].
#[derive(Debug, Hash, PartialEq, Eq, Ord, PartialOrd, Clone, enum_as_inner::EnumAsInner)]
pub enum Literal {
    Null,
    Bool(bool),
    Int64(i64),
    // Decorum is needed to provide a total ordering on `f64` so we can
    // derive `Ord`, `Eq` and `Hash`.
    Float64(decorum::Total<f64>),
    String(String),
}

impl Literal {
    pub fn new_str(str: impl Into<String>) -> Self {
        Self::String(str.into())
    }

    pub fn new_f64(value: f64) -> Self {
        Self::Float64(value.into())
    }

    /// The type a constant holding this literal has when no other type is given.
    pub fn data_type(&self) -> DataType {
        match self {
            Literal::Null => DataType::Null,
            Literal::Bool(_) => DataType::Boolean,
            Literal::Int64(_) => DataType::Int64,
            Literal::Float64(_) => DataType::Float64,
            Literal::String(_) => DataType::Utf8,
        }
    }

    /// Return true if this literal may be stored in a constant of `data_type`.
    ///
    /// `NULL` is valid for every type.
    pub fn is_valid_for(&self, data_type: &DataType) -> bool {
        match self {
            Literal::Null => true,
            Literal::Bool(_) => data_type == &DataType::Boolean,
            Literal::Int64(_) => crate::typecheck::is_integer(data_type),
            Literal::Float64(_) => crate::typecheck::is_floating(data_type),
            Literal::String(_) => matches!(data_type, DataType::Utf8 | DataType::LargeUtf8),
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Null => write!(f, "NULL"),
            Literal::Bool(true) => write!(f, "TRUE"),
            Literal::Bool(false) => write!(f, "FALSE"),
            Literal::Int64(n) => write!(f, "{n}"),
            Literal::Float64(n) => write!(f, "{:?}", n.into_inner()),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Literal::Null.to_string(), "NULL");
        assert_eq!(Literal::Bool(false).to_string(), "FALSE");
        assert_eq!(Literal::Int64(-3).to_string(), "-3");
        assert_eq!(Literal::new_f64(1.0).to_string(), "1.0");
        assert_eq!(Literal::new_str("it's").to_string(), "'it''s'");
    }

    #[test]
    fn test_valid_for() {
        assert!(Literal::Null.is_valid_for(&DataType::Int32));
        assert!(Literal::Int64(5).is_valid_for(&DataType::Int32));
        assert!(!Literal::Int64(5).is_valid_for(&DataType::Utf8));
        assert!(!Literal::Bool(true).is_valid_for(&DataType::Int64));
    }

    #[test]
    fn test_is_null() {
        assert!(Literal::Null.is_null());
        assert!(!Literal::Bool(false).is_null());
        assert!(!Literal::new_str("").is_null());
        assert!([Literal::Int64(0), Literal::Null]
            .iter()
            .any(Literal::is_null));
    }
}
