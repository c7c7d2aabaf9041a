//! Renders expressions as SQL-like text.
//!
//! Operands which are themselves operators are parenthesized, so the output
//! is unambiguous without tracking precedence.

use std::fmt::{Display, Formatter, Result};

use itertools::Itertools;

use crate::{BinaryOp, Expr, JoinKind, UnaryOp};

struct Operand<'a>(&'a Expr);

impl<'a> Display for Operand<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.0 {
            // Rendered as a call, so already delimited.
            Expr::Binary(binary) if binary.op == BinaryOp::Coalesce => self.0.fmt(f),
            Expr::Unary(_) | Expr::Binary(_) | Expr::Like(_) | Expr::Join(_) => {
                write!(f, "({})", self.0)
            }
            _ => self.0.fmt(f),
        }
    }
}

fn binary_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Equal => "=",
        BinaryOp::NotEqual => "<>",
        BinaryOp::LessThan => "<",
        BinaryOp::LessThanOrEqual => "<=",
        BinaryOp::GreaterThan => ">",
        BinaryOp::GreaterThanOrEqual => ">=",
        BinaryOp::AndAlso => "AND",
        BinaryOp::OrElse => "OR",
        BinaryOp::Coalesce => "COALESCE",
        BinaryOp::Add => "+",
        BinaryOp::Subtract => "-",
        BinaryOp::Multiply => "*",
        BinaryOp::Divide => "/",
        BinaryOp::Modulo => "%",
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Expr::Constant(constant) => constant.value.fmt(f),
            Expr::Column(column) if column.table.is_empty() => write!(f, "{}", column.name),
            Expr::Column(column) => write!(f, "{}.{}", column.table, column.name),
            Expr::Parameter(parameter) => write!(f, "@{}", parameter.name),
            Expr::Unary(unary) => {
                let operand = Operand(&unary.operand);
                match unary.op {
                    UnaryOp::Not => write!(f, "NOT {operand}"),
                    UnaryOp::IsNull => write!(f, "{operand} IS NULL"),
                    UnaryOp::IsNotNull => write!(f, "{operand} IS NOT NULL"),
                    UnaryOp::Negate => write!(f, "-{operand}"),
                }
            }
            Expr::Binary(binary) if binary.op == BinaryOp::Coalesce => {
                write!(f, "COALESCE({}, {})", binary.left, binary.right)
            }
            Expr::Binary(binary) => write!(
                f,
                "{} {} {}",
                Operand(&binary.left),
                binary_symbol(binary.op),
                Operand(&binary.right)
            ),
            Expr::Like(like) => {
                write!(
                    f,
                    "{} LIKE {}",
                    Operand(&like.match_expr),
                    Operand(&like.pattern)
                )?;
                if let Some(escape) = &like.escape {
                    write!(f, " ESCAPE {}", Operand(escape))?;
                }
                Ok(())
            }
            Expr::Function(function) => {
                if let Some(instance) = &function.instance {
                    write!(f, "{}.", Operand(instance))?;
                }
                write!(f, "{}({})", function.name, function.args.iter().format(", "))
            }
            Expr::Case(case) => {
                write!(f, "CASE")?;
                if let Some(operand) = &case.operand {
                    write!(f, " {}", Operand(operand))?;
                }
                for clause in &case.when_clauses {
                    write!(
                        f,
                        " WHEN {} THEN {}",
                        Operand(&clause.test),
                        Operand(&clause.result)
                    )?;
                }
                if let Some(else_result) = &case.else_result {
                    write!(f, " ELSE {}", Operand(else_result))?;
                }
                write!(f, " END")
            }
            Expr::Table(table) => match &table.alias {
                Some(alias) => write!(f, "{} AS {}", table.name, alias),
                None => write!(f, "{}", table.name),
            },
            Expr::Join(join) => {
                let kind = match join.kind {
                    JoinKind::Inner => "INNER",
                    JoinKind::Left => "LEFT",
                };
                write!(f, "{kind} JOIN {} ON {}", join.table, join.predicate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;

    use crate::{CaseWhen, ExprBuilder, JoinKind, Literal, SqlExprBuilder};

    #[test]
    fn test_nested_binary() {
        let builder = SqlExprBuilder;
        let a = builder.column("t", "a", DataType::Int64, true).unwrap();
        let five = builder.constant(Literal::Int64(5), DataType::Int64).unwrap();
        let eq = builder.equal(a.clone(), five).unwrap();
        let not_null = builder.is_not_null(a).unwrap();
        let and = builder.and_also(eq, not_null).unwrap();
        insta::assert_snapshot!(and, @"(t.a = 5) AND (t.a IS NOT NULL)");
    }

    #[test]
    fn test_not_and_coalesce() {
        let builder = SqlExprBuilder;
        let a = builder.column("t", "a", DataType::Boolean, true).unwrap();
        let p = builder.parameter("p", DataType::Boolean).unwrap();
        let coalesce = builder.coalesce(a, p).unwrap();
        let not = builder.not(coalesce).unwrap();
        insta::assert_snapshot!(not, @"NOT COALESCE(t.a, @p)");
    }

    #[test]
    fn test_coalesce_operand_is_not_parenthesized() {
        let builder = SqlExprBuilder;
        let x = builder.column("t", "x", DataType::Int64, true).unwrap();
        let y = builder.column("t", "y", DataType::Int64, false).unwrap();
        let one = builder.constant(Literal::Int64(1), DataType::Int64).unwrap();
        let coalesce = builder.coalesce(x, y).unwrap();
        let eq = builder.equal(coalesce.clone(), one).unwrap();
        insta::assert_snapshot!(eq, @"COALESCE(t.x, t.y) = 1");
        let is_null = builder.is_null(coalesce).unwrap();
        insta::assert_snapshot!(is_null, @"COALESCE(t.x, t.y) IS NULL");
    }

    #[test]
    fn test_like_and_function() {
        let builder = SqlExprBuilder;
        let name = builder.column("c", "name", DataType::Utf8, false).unwrap();
        let pattern = builder
            .constant(Literal::new_str("a\\%%"), DataType::Utf8)
            .unwrap();
        let escape = builder
            .constant(Literal::new_str("\\"), DataType::Utf8)
            .unwrap();
        let like = builder.like(name.clone(), pattern, Some(escape)).unwrap();
        insta::assert_snapshot!(like, @r###"c.name LIKE 'a\%%' ESCAPE '\'"###);

        let upper = builder
            .function("upper", None, vec![name.clone()], DataType::Utf8)
            .unwrap();
        insta::assert_snapshot!(upper, @"upper(c.name)");
        let trim = builder
            .function("trim", Some(name), vec![], DataType::Utf8)
            .unwrap();
        insta::assert_snapshot!(trim, @"c.name.trim()");
    }

    #[test]
    fn test_case_and_join() {
        let builder = SqlExprBuilder;
        let a = builder.column("t", "a", DataType::Int64, false).unwrap();
        let b = builder.column("u", "b", DataType::Int64, true).unwrap();
        let one = builder.constant(Literal::Int64(1), DataType::Int64).unwrap();
        let case = builder
            .case(
                Some(a.clone()),
                vec![CaseWhen {
                    test: one.clone(),
                    result: b.clone(),
                }],
                None,
            )
            .unwrap();
        insta::assert_snapshot!(case, @"CASE t.a WHEN 1 THEN u.b END");

        let table = builder.table("users", Some("u")).unwrap();
        let predicate = builder.equal(a, b).unwrap();
        let join = builder.join(JoinKind::Left, table, predicate).unwrap();
        insta::assert_snapshot!(join, @"LEFT JOIN users AS u ON t.a = u.b");
    }
}
