use arrow_schema::DataType;
use itertools::Itertools;
use proptest::prelude::*;

use crate::eval::Bindings;
use crate::{CaseWhen, ExprBuilder, ExprRef, Literal, SqlExprBuilder};

/// The table containing the columns used by generated expressions.
pub const TABLE: &str = "t";

/// Nullable boolean column.
pub fn column_a() -> ExprRef {
    column("a", DataType::Boolean, true)
}

/// Non-nullable boolean column.
pub fn column_b() -> ExprRef {
    column("b", DataType::Boolean, false)
}

/// Nullable integer column.
pub fn column_x() -> ExprRef {
    column("x", DataType::Int64, true)
}

/// Non-nullable integer column.
pub fn column_y() -> ExprRef {
    column("y", DataType::Int64, false)
}

fn column(name: &str, data_type: DataType, nullable: bool) -> ExprRef {
    SqlExprBuilder
        .column(TABLE, name, data_type, nullable)
        .expect("column")
}

fn constant(value: Literal, data_type: DataType) -> ExprRef {
    SqlExprBuilder.constant(value, data_type).expect("constant")
}

fn bool_leaves() -> Vec<ExprRef> {
    vec![
        column_a(),
        column_b(),
        SqlExprBuilder
            .parameter("q", DataType::Boolean)
            .expect("parameter"),
        constant(Literal::Bool(true), DataType::Boolean),
        constant(Literal::Bool(false), DataType::Boolean),
        constant(Literal::Null, DataType::Boolean),
    ]
}

fn int_leaves() -> Vec<ExprRef> {
    vec![
        column_x(),
        column_y(),
        SqlExprBuilder
            .parameter("p", DataType::Int64)
            .expect("parameter"),
        constant(Literal::Int64(1), DataType::Int64),
        constant(Literal::Null, DataType::Int64),
    ]
}

/// Every assignment of values to the columns and parameters generated
/// expressions reference.
///
/// Non-nullable columns are never assigned `NULL`.
pub fn all_bindings() -> Vec<Bindings> {
    let nullable_bool = [Literal::Bool(true), Literal::Bool(false), Literal::Null];
    let non_null_bool = [Literal::Bool(true), Literal::Bool(false)];
    let nullable_int = [Literal::Int64(0), Literal::Int64(1), Literal::Null];
    let non_null_int = [Literal::Int64(0), Literal::Int64(1)];

    itertools::iproduct!(
        nullable_bool.iter(),
        non_null_bool.iter(),
        nullable_bool.iter(),
        nullable_int.iter(),
        non_null_int.iter(),
        nullable_int.iter()
    )
    .map(|(a, b, q, x, y, p)| {
        Bindings::default()
            .with_column(TABLE, "a", a.clone())
            .with_column(TABLE, "b", b.clone())
            .with_parameter("q", q.clone())
            .with_column(TABLE, "x", x.clone())
            .with_column(TABLE, "y", y.clone())
            .with_parameter("p", p.clone())
    })
    .collect_vec()
}

/// Integer expressions: a leaf, a `COALESCE` of two leaves, or a searched
/// `CASE` choosing between leaves with an optional `ELSE`.
fn arb_int() -> impl Strategy<Value = ExprRef> {
    let int_leaf = || prop::sample::select(int_leaves());
    prop_oneof![
        int_leaf(),
        (int_leaf(), int_leaf())
            .prop_map(|(left, right)| SqlExprBuilder.coalesce(left, right).expect("coalesce")),
        (
            prop::sample::select(bool_leaves()),
            int_leaf(),
            proptest::option::of(int_leaf())
        )
            .prop_map(|(test, result, else_result)| {
                SqlExprBuilder
                    .case(None, vec![CaseWhen { test, result }], else_result)
                    .expect("case")
            }),
    ]
}

fn arb_leaf() -> impl Strategy<Value = ExprRef> {
    prop_oneof![
        prop::sample::select(bool_leaves()),
        (arb_int(), arb_int(), any::<bool>()).prop_map(|(left, right, equal)| {
            if equal {
                SqlExprBuilder.equal(left, right).expect("equal")
            } else {
                SqlExprBuilder.not_equal(left, right).expect("not_equal")
            }
        }),
        arb_int().prop_map(|operand| SqlExprBuilder.is_null(operand).expect("is_null")),
    ]
}

/// Generate boolean expressions built from `NOT`, `AND`, `OR`, `IS NULL`,
/// `IS NOT NULL`, `=` and `<>` over nullable and non-nullable columns,
/// parameters and constants. Integer operands may also be a `COALESCE` or a
/// searched `CASE`.
pub fn arb_predicate() -> impl Strategy<Value = ExprRef> {
    arb_leaf().prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            inner
                .clone()
                .prop_map(|operand| SqlExprBuilder.not(operand).expect("not")),
            inner
                .clone()
                .prop_map(|operand| SqlExprBuilder.is_not_null(operand).expect("is_not_null")),
            (inner.clone(), inner.clone())
                .prop_map(|(left, right)| SqlExprBuilder.and_also(left, right).expect("and")),
            (inner.clone(), inner.clone())
                .prop_map(|(left, right)| SqlExprBuilder.or_else(left, right).expect("or")),
            (inner.clone(), inner, any::<bool>()).prop_map(|(left, right, equal)| {
                if equal {
                    SqlExprBuilder.equal(left, right).expect("equal")
                } else {
                    SqlExprBuilder.not_equal(left, right).expect("not_equal")
                }
            }),
        ]
    })
}
