use arrow_schema::DataType;
use error_stack::ResultExt;
use sparrow_relational::{
    BinaryExpr, BinaryOp, CaseExpr, Expr, ExprBuilder, ExprRef, JoinExpr, UnaryOp,
};
use tracing::{debug, trace};

use crate::Error;

/// A rewritten subtree and whether it may evaluate to `NULL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub expr: ExprRef,
    pub nullable: bool,
}

impl Rewritten {
    fn new(expr: ExprRef, nullable: bool) -> Self {
        Self { expr, nullable }
    }
}

/// Rewrite every `=` and `<>` in `expr` so it no longer depends on
/// three-valued comparisons.
///
/// For every assignment of values, the result evaluated under three-valued
/// logic equals `expr` evaluated with `NULL` treated as a value (equal to
/// itself and to nothing else).
///
/// Subtrees which do not change are shared with `expr`.
pub fn rewrite_null_semantics(
    builder: &dyn ExprBuilder,
    expr: &ExprRef,
) -> error_stack::Result<ExprRef, Error> {
    Ok(rewrite_with_nullability(builder, expr)?.expr)
}

/// Rewrite `expr` as [`rewrite_null_semantics`], also reporting whether the
/// rewritten expression may evaluate to `NULL`.
pub fn rewrite_with_nullability(
    builder: &dyn ExprBuilder,
    expr: &ExprRef,
) -> error_stack::Result<Rewritten, Error> {
    debug!("Rewriting null semantics of '{expr}'");
    NullSemanticsRewriter { builder }.rewrite(expr)
}

struct NullSemanticsRewriter<'a> {
    builder: &'a dyn ExprBuilder,
}

/// An operand of a comparison with any leading `NOT` removed.
struct ComparisonOperand {
    expr: ExprRef,
    nullable: bool,
    negated: bool,
}

impl From<Rewritten> for ComparisonOperand {
    fn from(rewritten: Rewritten) -> Self {
        match rewritten.expr.unary_operand(UnaryOp::Not) {
            Some(operand) => Self {
                expr: operand.clone(),
                nullable: rewritten.nullable,
                negated: true,
            },
            None => Self {
                expr: rewritten.expr,
                nullable: rewritten.nullable,
                negated: false,
            },
        }
    }
}

impl<'a> NullSemanticsRewriter<'a> {
    fn rewrite(&self, expr: &ExprRef) -> error_stack::Result<Rewritten, Error> {
        match expr.as_ref() {
            Expr::Constant(constant) => Ok(Rewritten::new(expr.clone(), constant.value.is_null())),
            Expr::Column(column) => Ok(Rewritten::new(expr.clone(), column.nullable)),
            // Parameters are bound after rewriting, so may always be null.
            Expr::Parameter(_) => Ok(Rewritten::new(expr.clone(), true)),
            Expr::Table(_) => Ok(Rewritten::new(expr.clone(), false)),
            Expr::Unary(unary) => {
                let operand = self.rewrite(&unary.operand)?;
                let nullable = match unary.op {
                    UnaryOp::IsNull | UnaryOp::IsNotNull => false,
                    UnaryOp::Not | UnaryOp::Negate => operand.nullable,
                };
                let expr = self.update(expr, vec![operand.expr])?;
                Ok(Rewritten::new(expr, nullable))
            }
            Expr::Binary(binary) => match binary.op {
                BinaryOp::Equal | BinaryOp::NotEqual => self.rewrite_comparison(expr, binary),
                op => {
                    let left = self.rewrite(&binary.left)?;
                    let right = self.rewrite(&binary.right)?;
                    let nullable = if op == BinaryOp::Coalesce {
                        left.nullable && right.nullable
                    } else {
                        left.nullable || right.nullable
                    };
                    let expr = self.update(expr, vec![left.expr, right.expr])?;
                    Ok(Rewritten::new(expr, nullable))
                }
            },
            // The match, pattern and escape of a like, or the instance and
            // arguments of a function.
            Expr::Like(_) | Expr::Function(_) => {
                let mut nullable = false;
                let mut children = Vec::new();
                for child in expr.children() {
                    let child = self.rewrite(child)?;
                    nullable |= child.nullable;
                    children.push(child.expr);
                }
                Ok(Rewritten::new(self.update(expr, children)?, nullable))
            }
            Expr::Case(case) => self.rewrite_case(expr, case),
            Expr::Join(join) => {
                // Joins may be built without the builder, so check the whole
                // chain of equalities here as well.
                error_stack::ensure!(
                    JoinExpr::is_equi_predicate(&join.predicate),
                    Error::InvalidJoinPredicate(join.predicate.to_string())
                );
                let table = self.rewrite(&join.table)?;
                let predicate = match join.predicate.as_ref() {
                    Expr::Binary(binary) if binary.op == BinaryOp::Equal => {
                        self.rewrite_comparison(&join.predicate, binary)?
                    }
                    _ => self.rewrite(&join.predicate)?,
                };
                let expr = self.update(expr, vec![table.expr, predicate.expr])?;
                Ok(Rewritten::new(expr, false))
            }
        }
    }

    /// Rewrite a case.
    ///
    /// Only the results of the clauses and the else branch decide whether
    /// the case is nullable. The operand and the tests are rewritten but
    /// do not contribute.
    fn rewrite_case(
        &self,
        expr: &ExprRef,
        case: &CaseExpr,
    ) -> error_stack::Result<Rewritten, Error> {
        let mut children = Vec::with_capacity(expr.children().len());
        if let Some(operand) = &case.operand {
            children.push(self.rewrite(operand)?.expr);
        }

        let mut nullable = case.else_result.is_none();
        for clause in &case.when_clauses {
            children.push(self.rewrite(&clause.test)?.expr);
            let result = self.rewrite(&clause.result)?;
            nullable |= result.nullable;
            children.push(result.expr);
        }
        if let Some(else_result) = &case.else_result {
            let else_result = self.rewrite(else_result)?;
            nullable |= else_result.nullable;
            children.push(else_result.expr);
        }

        Ok(Rewritten::new(self.update(expr, children)?, nullable))
    }

    /// Rewrite an `=` or `<>`. The result is never nullable.
    fn rewrite_comparison(
        &self,
        expr: &ExprRef,
        comparison: &BinaryExpr,
    ) -> error_stack::Result<Rewritten, Error> {
        let left = ComparisonOperand::from(self.rewrite(&comparison.left)?);
        let right = ComparisonOperand::from(self.rewrite(&comparison.right)?);

        let negations_agree = left.negated == right.negated;
        let value_op = match (comparison.op, negations_agree) {
            (BinaryOp::Equal, true) | (BinaryOp::NotEqual, false) => BinaryOp::Equal,
            _ => BinaryOp::NotEqual,
        };
        trace!(
            op = comparison.op.name(),
            left_nullable = left.nullable,
            right_nullable = right.nullable,
            negations_agree,
            "Rewriting comparison '{expr}'"
        );

        let unchanged = value_op == comparison.op
            && !left.negated
            && !right.negated
            && ExprRef::ptr_eq(&left.expr, &comparison.left)
            && ExprRef::ptr_eq(&right.expr, &comparison.right);
        let rewritten = if unchanged && !left.nullable && !right.nullable {
            expr.clone()
        } else {
            self.expand_comparison(comparison.op, value_op, &comparison.data_type, left, right)
                .change_context(Error::Rewrite)
                .attach_printable_lazy(|| format!("comparison: {expr}"))?
        };
        Ok(Rewritten::new(rewritten, false))
    }

    /// Build the two-valued form of `left op right`.
    ///
    /// `value_op` compares the values once any negation of the operands has
    /// been folded into the operator.
    fn expand_comparison(
        &self,
        op: BinaryOp,
        value_op: BinaryOp,
        data_type: &DataType,
        left: ComparisonOperand,
        right: ComparisonOperand,
    ) -> error_stack::Result<ExprRef, sparrow_relational::Error> {
        let b = self.builder;
        let (l, r) = (left.expr, right.expr);
        let values = b.make_binary(value_op, l.clone(), r.clone(), data_type.clone())?;

        match (op, left.nullable, right.nullable) {
            (_, false, false) => Ok(values),
            (BinaryOp::Equal, true, false) => b.and_also(values, b.is_not_null(l)?),
            (BinaryOp::Equal, false, true) => b.and_also(values, b.is_not_null(r)?),
            (BinaryOp::Equal, true, true) => {
                let both_valid = b.and_also(b.is_not_null(l.clone())?, b.is_not_null(r.clone())?)?;
                let both_null = b.and_also(b.is_null(l)?, b.is_null(r)?)?;
                b.or_else(b.and_also(values, both_valid)?, both_null)
            }
            (BinaryOp::NotEqual, true, false) => b.or_else(values, b.is_null(l)?),
            (BinaryOp::NotEqual, false, true) => b.or_else(values, b.is_null(r)?),
            (BinaryOp::NotEqual, true, true) => {
                let either_null = b.or_else(b.is_null(l.clone())?, b.is_null(r.clone())?)?;
                let either_valid = b.or_else(b.is_not_null(l)?, b.is_not_null(r)?)?;
                b.and_also(b.or_else(values, either_null)?, either_valid)
            }
            (op, _, _) => error_stack::bail!(sparrow_relational::Error::InvalidOperandTypes {
                op: op.name(),
                types: vec![data_type.clone()],
            }),
        }
    }

    fn update(
        &self,
        expr: &ExprRef,
        children: Vec<ExprRef>,
    ) -> error_stack::Result<ExprRef, Error> {
        expr.with_children(children).change_context(Error::Rewrite)
    }
}
