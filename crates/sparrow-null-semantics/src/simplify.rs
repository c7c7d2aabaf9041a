use error_stack::ResultExt;
use itertools::Itertools;
use sparrow_relational::{BinaryExpr, BinaryOp, Expr, ExprBuilder, ExprRef, UnaryOp};
use tracing::{debug, warn};

use crate::Error;

/// Simplify boolean structure of `expr`.
///
/// This removes double negation, pushes negation through `AND`, `OR`,
/// `IS [NOT] NULL` and comparisons, and folds boolean constants in `AND` and
/// `OR`. Replacing a negated comparison with its complement is only valid for
/// two-valued comparisons, so this should run on the output of
/// [`crate::rewrite_null_semantics`].
///
/// Simplification is idempotent: simplifying the result again returns it
/// unchanged.
pub fn simplify(builder: &dyn ExprBuilder, expr: &ExprRef) -> error_stack::Result<ExprRef, Error> {
    Simplifier::new(builder).simplify(expr)
}

pub(crate) struct Simplifier<'a> {
    builder: &'a dyn ExprBuilder,
    /// Whether `NOT (a op b)` may be replaced by the complement of `op`.
    comparison_negation: bool,
}

impl<'a> Simplifier<'a> {
    pub(crate) fn new(builder: &'a dyn ExprBuilder) -> Self {
        Self {
            builder,
            comparison_negation: true,
        }
    }

    pub(crate) fn with_comparison_negation(self, comparison_negation: bool) -> Self {
        Self {
            comparison_negation,
            ..self
        }
    }

    pub(crate) fn simplify(&self, expr: &ExprRef) -> error_stack::Result<ExprRef, Error> {
        debug!(
            comparison_negation = self.comparison_negation,
            "Simplifying '{expr}'"
        );
        self.simplify_tree(expr)
            .change_context(Error::Simplify)
            .attach_printable_lazy(|| format!("expression: {expr}"))
    }

    /// Simplify the children of `expr`, then `expr` itself.
    fn simplify_tree(
        &self,
        expr: &ExprRef,
    ) -> error_stack::Result<ExprRef, sparrow_relational::Error> {
        let children = expr
            .children()
            .into_iter()
            .map(|child| self.simplify_tree(child))
            .try_collect()?;
        let expr = expr.with_children(children)?;
        self.simplify_node(&expr)
    }

    /// Apply the local rules to a node whose children are already simplified.
    ///
    /// Nodes created by a rule are passed back through the local rules, so the
    /// result is fully simplified.
    fn simplify_node(
        &self,
        expr: &ExprRef,
    ) -> error_stack::Result<ExprRef, sparrow_relational::Error> {
        match expr.as_ref() {
            Expr::Unary(unary) => match unary.op {
                UnaryOp::Not => self.simplify_not(expr, &unary.operand),
                UnaryOp::IsNull | UnaryOp::IsNotNull => {
                    self.simplify_null_test(expr, unary.op, &unary.operand)
                }
                UnaryOp::Negate => Ok(expr.clone()),
            },
            Expr::Binary(binary) if binary.op.is_logical() => {
                Ok(self.absorb_constant(binary).unwrap_or_else(|| expr.clone()))
            }
            _ => Ok(expr.clone()),
        }
    }

    fn simplify_not(
        &self,
        expr: &ExprRef,
        operand: &ExprRef,
    ) -> error_stack::Result<ExprRef, sparrow_relational::Error> {
        let b = self.builder;
        if let Some(value) = operand.literal_bool_opt() {
            return b.bool_constant(!value);
        }

        match operand.as_ref() {
            Expr::Unary(unary) => match unary.op {
                UnaryOp::Not => Ok(unary.operand.clone()),
                UnaryOp::IsNull => self.simplify_node(&b.is_not_null(unary.operand.clone())?),
                UnaryOp::IsNotNull => self.simplify_node(&b.is_null(unary.operand.clone())?),
                UnaryOp::Negate => Ok(expr.clone()),
            },
            Expr::Binary(binary) if binary.op.is_logical() => self.de_morgan(binary),
            Expr::Binary(binary) if self.comparison_negation => {
                match binary.op.complement() {
                    Some(complement) => self.simplify_node(&b.make_binary(
                        complement,
                        binary.left.clone(),
                        binary.right.clone(),
                        binary.data_type.clone(),
                    )?),
                    None => Ok(expr.clone()),
                }
            }
            _ => Ok(expr.clone()),
        }
    }

    /// `NOT (a AND b)` to `(NOT a) OR (NOT b)` and `NOT (a OR b)` to
    /// `(NOT a) AND (NOT b)`.
    fn de_morgan(
        &self,
        binary: &BinaryExpr,
    ) -> error_stack::Result<ExprRef, sparrow_relational::Error> {
        let b = self.builder;
        let left = self.simplify_node(&b.not(binary.left.clone())?)?;
        let right = self.simplify_node(&b.not(binary.right.clone())?)?;
        let expr = match binary.op {
            BinaryOp::AndAlso => b.or_else(left, right)?,
            _ => b.and_also(left, right)?,
        };
        self.simplify_node(&expr)
    }

    fn simplify_null_test(
        &self,
        expr: &ExprRef,
        op: UnaryOp,
        operand: &ExprRef,
    ) -> error_stack::Result<ExprRef, sparrow_relational::Error> {
        if operand.is_null_literal() {
            warn!("Folding degenerate '{expr}'");
            return self.builder.bool_constant(op == UnaryOp::IsNull);
        }
        match operand.unary_operand(UnaryOp::Not) {
            Some(inner) => self.simplify_node(&self.builder.unary(op, inner.clone())?),
            None => Ok(expr.clone()),
        }
    }

    /// Fold a boolean constant operand of `AND` or `OR`.
    ///
    /// Returns `None` if neither operand is a boolean constant.
    fn absorb_constant(&self, binary: &BinaryExpr) -> Option<ExprRef> {
        let absorbing = binary.op == BinaryOp::OrElse;
        let fold = |constant: &ExprRef, other: &ExprRef| {
            constant.literal_bool_opt().map(|value| {
                if value == absorbing {
                    constant.clone()
                } else {
                    other.clone()
                }
            })
        };
        fold(&binary.left, &binary.right).or_else(|| fold(&binary.right, &binary.left))
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;
    use sparrow_relational::{Literal, SqlExprBuilder};

    use super::*;

    fn column(name: &str, data_type: DataType) -> ExprRef {
        SqlExprBuilder.column("t", name, data_type, true).unwrap()
    }

    fn flag(name: &str) -> ExprRef {
        column(name, DataType::Boolean)
    }

    fn simplified(expr: ExprRef) -> ExprRef {
        simplify(&SqlExprBuilder, &expr).unwrap()
    }

    #[test]
    fn test_negated_constants() {
        let b = SqlExprBuilder;
        let not_true = b.not(b.bool_constant(true).unwrap()).unwrap();
        insta::assert_snapshot!(simplified(not_true), @"FALSE");
        let not_false = b.not(b.bool_constant(false).unwrap()).unwrap();
        insta::assert_snapshot!(simplified(not_false), @"TRUE");
    }

    #[test]
    fn test_double_negation() {
        let b = SqlExprBuilder;
        let expr = b.not(b.not(flag("a")).unwrap()).unwrap();
        insta::assert_snapshot!(simplified(expr), @"t.a");
    }

    #[test]
    fn test_negated_null_tests() {
        let b = SqlExprBuilder;
        let expr = b.not(b.is_null(flag("a")).unwrap()).unwrap();
        insta::assert_snapshot!(simplified(expr), @"t.a IS NOT NULL");
        let expr = b.not(b.is_not_null(flag("a")).unwrap()).unwrap();
        insta::assert_snapshot!(simplified(expr), @"t.a IS NULL");
    }

    #[test]
    fn test_null_test_of_negation() {
        let b = SqlExprBuilder;
        let expr = b.is_null(b.not(flag("a")).unwrap()).unwrap();
        insta::assert_snapshot!(simplified(expr), @"t.a IS NULL");
        let expr = b.is_not_null(b.not(b.not(flag("a")).unwrap()).unwrap()).unwrap();
        insta::assert_snapshot!(simplified(expr), @"t.a IS NOT NULL");
    }

    #[test]
    fn test_null_test_of_null() {
        let b = SqlExprBuilder;
        let null = b.constant(Literal::Null, DataType::Int64).unwrap();
        insta::assert_snapshot!(simplified(b.is_null(null.clone()).unwrap()), @"TRUE");
        insta::assert_snapshot!(simplified(b.is_not_null(null).unwrap()), @"FALSE");
    }

    #[test]
    fn test_de_morgan() {
        let b = SqlExprBuilder;
        let and = b.and_also(flag("a"), b.is_null(flag("b")).unwrap()).unwrap();
        insta::assert_snapshot!(simplified(b.not(and).unwrap()), @"(NOT t.a) OR (t.b IS NOT NULL)");

        let or = b.or_else(b.not(flag("a")).unwrap(), flag("b")).unwrap();
        insta::assert_snapshot!(simplified(b.not(or).unwrap()), @"t.a AND (NOT t.b)");
    }

    #[test]
    fn test_comparison_negation() {
        let b = SqlExprBuilder;
        let a = column("a", DataType::Int64);
        let five = b.constant(Literal::Int64(5), DataType::Int64).unwrap();
        let gt = b
            .binary(BinaryOp::GreaterThan, a.clone(), five.clone())
            .unwrap();
        insta::assert_snapshot!(simplified(b.not(gt.clone()).unwrap()), @"t.a <= 5");
        let eq = b.equal(a, five).unwrap();
        insta::assert_snapshot!(simplified(b.not(eq).unwrap()), @"t.a <> 5");

        let kept = Simplifier::new(&b)
            .with_comparison_negation(false)
            .simplify(&b.not(gt).unwrap())
            .unwrap();
        insta::assert_snapshot!(kept, @"NOT (t.a > 5)");
    }

    #[test]
    fn test_constant_absorption() {
        let b = SqlExprBuilder;
        let t = || b.bool_constant(true).unwrap();
        let f = || b.bool_constant(false).unwrap();
        insta::assert_snapshot!(simplified(b.and_also(t(), flag("a")).unwrap()), @"t.a");
        insta::assert_snapshot!(simplified(b.and_also(flag("a"), f()).unwrap()), @"FALSE");
        insta::assert_snapshot!(simplified(b.or_else(flag("a"), t()).unwrap()), @"TRUE");
        insta::assert_snapshot!(simplified(b.or_else(f(), flag("a")).unwrap()), @"t.a");

        // The left operand is checked first.
        insta::assert_snapshot!(simplified(b.and_also(f(), t()).unwrap()), @"FALSE");
        insta::assert_snapshot!(simplified(b.or_else(f(), t()).unwrap()), @"TRUE");
        insta::assert_snapshot!(simplified(b.and_also(t(), f()).unwrap()), @"FALSE");
    }

    #[test]
    fn test_absorption_after_rewriting_children() {
        let b = SqlExprBuilder;
        let expr = b
            .and_also(b.not(b.bool_constant(false).unwrap()).unwrap(), flag("a"))
            .unwrap();
        insta::assert_snapshot!(simplified(expr), @"t.a");
    }

    #[test]
    fn test_unchanged_tree_is_shared() {
        let b = SqlExprBuilder;
        let expr = b
            .or_else(flag("a"), b.is_null(flag("b")).unwrap())
            .unwrap();
        let result = simplified(expr.clone());
        assert!(ExprRef::ptr_eq(&expr, &result));
    }

    #[test]
    fn test_other_nodes_simplify_children() {
        let b = SqlExprBuilder;
        let not_not = b.not(b.not(flag("a")).unwrap()).unwrap();
        let coalesce = b.coalesce(not_not, flag("b")).unwrap();
        insta::assert_snapshot!(simplified(coalesce), @"COALESCE(t.a, t.b)");
    }
}
