//! Exhaustive checks of the comparison rewrites.
//!
//! Each comparison of two boolean columns, for every combination of operand
//! nullability and negation, is evaluated over every assignment of values.

use arrow_schema::DataType;
use itertools::Itertools;
use sparrow_null_semantics::rewrite_null_semantics;
use sparrow_relational::eval::{evaluate, Bindings, NullSemantics};
use sparrow_relational::{BinaryOp, ExprBuilder, ExprRef, Literal, SqlExprBuilder};

/// `[NOT] t.l op [NOT] t.r` over boolean columns with the given nullability.
fn comparison(
    op: BinaryOp,
    left_nullable: bool,
    right_nullable: bool,
    negate_left: bool,
    negate_right: bool,
) -> ExprRef {
    let b = SqlExprBuilder;
    let operand = |name: &str, nullable: bool, negate: bool| {
        let column = b.column("t", name, DataType::Boolean, nullable).unwrap();
        if negate {
            b.not(column).unwrap()
        } else {
            column
        }
    };
    b.binary(
        op,
        operand("l", left_nullable, negate_left),
        operand("r", right_nullable, negate_right),
    )
    .unwrap()
}

fn values(nullable: bool) -> Vec<Literal> {
    let mut values = vec![Literal::Bool(true), Literal::Bool(false)];
    if nullable {
        values.push(Literal::Null);
    }
    values
}

const NULLABILITY: [(bool, bool); 4] = [(false, false), (true, false), (false, true), (true, true)];

#[test]
fn test_rewrite_table() {
    let mut rules = Vec::new();
    for op in [BinaryOp::Equal, BinaryOp::NotEqual] {
        for (left_nullable, right_nullable) in NULLABILITY {
            for negate_left in [false, true] {
                let expr = comparison(op, left_nullable, right_nullable, negate_left, false);
                let rewritten = rewrite_null_semantics(&SqlExprBuilder, &expr).unwrap();
                let nullability = |nullable| if nullable { "n" } else { "c" };
                rules.push(format!(
                    "{} {}: {expr} => {rewritten}",
                    nullability(left_nullable),
                    nullability(right_nullable),
                ));
            }
        }
    }

    insta::assert_snapshot!(rules.join("\n"), @r###"
    c c: t.l = t.r => t.l = t.r
    c c: (NOT t.l) = t.r => t.l <> t.r
    n c: t.l = t.r => (t.l = t.r) AND (t.l IS NOT NULL)
    n c: (NOT t.l) = t.r => (t.l <> t.r) AND (t.l IS NOT NULL)
    c n: t.l = t.r => (t.l = t.r) AND (t.r IS NOT NULL)
    c n: (NOT t.l) = t.r => (t.l <> t.r) AND (t.r IS NOT NULL)
    n n: t.l = t.r => ((t.l = t.r) AND ((t.l IS NOT NULL) AND (t.r IS NOT NULL))) OR ((t.l IS NULL) AND (t.r IS NULL))
    n n: (NOT t.l) = t.r => ((t.l <> t.r) AND ((t.l IS NOT NULL) AND (t.r IS NOT NULL))) OR ((t.l IS NULL) AND (t.r IS NULL))
    c c: t.l <> t.r => t.l <> t.r
    c c: (NOT t.l) <> t.r => t.l = t.r
    n c: t.l <> t.r => (t.l <> t.r) OR (t.l IS NULL)
    n c: (NOT t.l) <> t.r => (t.l = t.r) OR (t.l IS NULL)
    c n: t.l <> t.r => (t.l <> t.r) OR (t.r IS NULL)
    c n: (NOT t.l) <> t.r => (t.l = t.r) OR (t.r IS NULL)
    n n: t.l <> t.r => ((t.l <> t.r) OR ((t.l IS NULL) OR (t.r IS NULL))) AND ((t.l IS NOT NULL) OR (t.r IS NOT NULL))
    n n: (NOT t.l) <> t.r => ((t.l = t.r) OR ((t.l IS NULL) OR (t.r IS NULL))) AND ((t.l IS NOT NULL) OR (t.r IS NOT NULL))
    "###);
}

#[test]
fn test_rewrite_preserves_truth_table() {
    for op in [BinaryOp::Equal, BinaryOp::NotEqual] {
        for (left_nullable, right_nullable) in NULLABILITY {
            for (negate_left, negate_right) in [(false, false), (true, false), (false, true), (true, true)] {
                let expr = comparison(op, left_nullable, right_nullable, negate_left, negate_right);
                let rewritten = rewrite_null_semantics(&SqlExprBuilder, &expr).unwrap();

                for (l, r) in values(left_nullable)
                    .into_iter()
                    .cartesian_product(values(right_nullable))
                {
                    let bindings = Bindings::default()
                        .with_column("t", "l", l.clone())
                        .with_column("t", "r", r.clone());
                    let expected = evaluate(&expr, &bindings, NullSemantics::NullAsValue).unwrap();
                    let actual =
                        evaluate(&rewritten, &bindings, NullSemantics::ThreeValued).unwrap();
                    assert_eq!(
                        actual, expected,
                        "{expr} => {rewritten} with l = {l}, r = {r}"
                    );
                    assert!(!actual.is_null(), "{rewritten} is null with l = {l}, r = {r}");
                }
            }
        }
    }
}

#[test]
fn test_parameters_are_nullable() {
    let b = SqlExprBuilder;
    let p = b.parameter("p", DataType::Boolean).unwrap();
    let q = b.parameter("q", DataType::Boolean).unwrap();
    let expr = b.equal(p, q).unwrap();
    let rewritten = rewrite_null_semantics(&b, &expr).unwrap();
    insta::assert_snapshot!(rewritten, @"((@p = @q) AND ((@p IS NOT NULL) AND (@q IS NOT NULL))) OR ((@p IS NULL) AND (@q IS NULL))");

    for (p, q) in values(true).into_iter().cartesian_product(values(true)) {
        let bindings = Bindings::default()
            .with_parameter("p", p)
            .with_parameter("q", q);
        assert_eq!(
            evaluate(&rewritten, &bindings, NullSemantics::ThreeValued).unwrap(),
            evaluate(&expr, &bindings, NullSemantics::NullAsValue).unwrap()
        );
    }
}
