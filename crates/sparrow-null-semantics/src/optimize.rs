use sparrow_relational::{ExprBuilder, ExprRef};
use tracing::info_span;

use crate::simplify::Simplifier;
use crate::{rewrite_null_semantics, Error, NullSemanticsOptions};

/// Rewrite the null semantics of `expr` and simplify the result.
pub fn optimize(
    builder: &dyn ExprBuilder,
    expr: &ExprRef,
    options: &NullSemanticsOptions,
) -> error_stack::Result<ExprRef, Error> {
    let span = info_span!(
        "Optimizing null semantics",
        use_relational_nulls = options.use_relational_nulls,
        skip_simplification = options.skip_simplification,
    );
    let _enter = span.enter();

    let expr = if options.use_relational_nulls {
        expr.clone()
    } else {
        rewrite_null_semantics(builder, expr)?
    };

    if options.skip_simplification {
        return Ok(expr);
    }
    Simplifier::new(builder)
        .with_comparison_negation(!options.use_relational_nulls)
        .simplify(&expr)
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;
    use sparrow_relational::{BinaryOp, Literal, SqlExprBuilder};

    use super::*;

    fn not_equals_five() -> ExprRef {
        let b = SqlExprBuilder;
        let a = b.column("t", "a", DataType::Int64, true).unwrap();
        let five = b.constant(Literal::Int64(5), DataType::Int64).unwrap();
        b.not(b.equal(a, five).unwrap()).unwrap()
    }

    #[test]
    fn test_negated_nullable_comparison() {
        let result = optimize(&SqlExprBuilder, &not_equals_five(), &Default::default()).unwrap();
        insta::assert_snapshot!(result, @"(t.a <> 5) OR (t.a IS NULL)");
    }

    #[test]
    fn test_skip_simplification() {
        let options = NullSemanticsOptions {
            skip_simplification: true,
            ..Default::default()
        };
        let result = optimize(&SqlExprBuilder, &not_equals_five(), &options).unwrap();
        insta::assert_snapshot!(result, @"NOT ((t.a = 5) AND (t.a IS NOT NULL))");
    }

    #[test]
    fn test_relational_nulls() {
        let options = NullSemanticsOptions {
            use_relational_nulls: true,
            ..Default::default()
        };
        let result = optimize(&SqlExprBuilder, &not_equals_five(), &options).unwrap();
        insta::assert_snapshot!(result, @"NOT (t.a = 5)");

        let b = SqlExprBuilder;
        let a = b.column("t", "a", DataType::Int64, true).unwrap();
        let null = b.constant(Literal::Null, DataType::Int64).unwrap();
        let expr = b
            .not(b.binary(BinaryOp::LessThan, a, null.clone()).unwrap())
            .unwrap();
        let expr = b.or_else(expr, b.is_null(null).unwrap()).unwrap();
        let result = optimize(&SqlExprBuilder, &expr, &options).unwrap();
        insta::assert_snapshot!(result, @"TRUE");
    }

    #[test]
    fn test_comparison_with_null_folds() {
        let b = SqlExprBuilder;
        let y = b.column("t", "y", DataType::Int64, false).unwrap();
        let null = b.constant(Literal::Null, DataType::Int64).unwrap();
        let expr = b.equal(y, null).unwrap();
        let result = optimize(&SqlExprBuilder, &expr, &Default::default()).unwrap();
        insta::assert_snapshot!(result, @"FALSE");
    }
}
