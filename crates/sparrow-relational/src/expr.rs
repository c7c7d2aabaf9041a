use std::sync::Arc;

use arrow_schema::DataType;
use smallvec::SmallVec;

use crate::{Error, Literal};

/// Reference counted expression.
pub type ExprRef = Arc<Expr>;

/// A node in a relational expression tree.
///
/// Nodes are never mutated. Rewriting a tree produces new nodes via the
/// `update` methods on each node kind (or [`Expr::with_children`]), sharing
/// any subtree that did not change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, enum_as_inner::EnumAsInner)]
pub enum Expr {
    Constant(ConstantExpr),
    Column(ColumnExpr),
    Parameter(ParameterExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Like(LikeExpr),
    Function(FunctionExpr),
    Case(CaseExpr),
    Table(TableExpr),
    Join(JoinExpr),
}

/// A literal value.
///
/// The constant is nullable if and only if the value is [`Literal::Null`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstantExpr {
    pub value: Literal,
    pub data_type: DataType,
}

/// A reference to a column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnExpr {
    /// Alias of the table containing the column.
    pub table: String,
    pub name: String,
    pub data_type: DataType,
    /// Whether the column was declared as nullable.
    pub nullable: bool,
}

/// A reference to a query parameter bound at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterExpr {
    pub name: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnaryOp {
    Not,
    IsNull,
    IsNotNull,
    Negate,
}

impl UnaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::IsNull => "is_null",
            UnaryOp::IsNotNull => "is_not_null",
            UnaryOp::Negate => "negate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: ExprRef,
    pub data_type: DataType,
}

impl UnaryExpr {
    /// Return a copy of this node applied to a different operand.
    pub fn update(&self, operand: ExprRef) -> Self {
        Self {
            op: self.op,
            operand,
            data_type: self.data_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    AndAlso,
    OrElse,
    Coalesce,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOp::Equal => "eq",
            BinaryOp::NotEqual => "neq",
            BinaryOp::LessThan => "lt",
            BinaryOp::LessThanOrEqual => "lte",
            BinaryOp::GreaterThan => "gt",
            BinaryOp::GreaterThanOrEqual => "gte",
            BinaryOp::AndAlso => "logical_and",
            BinaryOp::OrElse => "logical_or",
            BinaryOp::Coalesce => "coalesce",
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "sub",
            BinaryOp::Multiply => "mul",
            BinaryOp::Divide => "div",
            BinaryOp::Modulo => "mod",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::AndAlso | BinaryOp::OrElse)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Modulo
        )
    }

    /// The comparison whose result is the negation of this comparison.
    ///
    /// Replacing `NOT (a op b)` with `a op' b` is only done once the tree has
    /// been rewritten to two-valued logic.
    pub fn complement(&self) -> Option<BinaryOp> {
        match self {
            BinaryOp::Equal => Some(BinaryOp::NotEqual),
            BinaryOp::NotEqual => Some(BinaryOp::Equal),
            BinaryOp::LessThan => Some(BinaryOp::GreaterThanOrEqual),
            BinaryOp::LessThanOrEqual => Some(BinaryOp::GreaterThan),
            BinaryOp::GreaterThan => Some(BinaryOp::LessThanOrEqual),
            BinaryOp::GreaterThanOrEqual => Some(BinaryOp::LessThan),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: ExprRef,
    pub right: ExprRef,
    pub data_type: DataType,
}

impl BinaryExpr {
    /// Return a copy of this node applied to different operands.
    pub fn update(&self, left: ExprRef, right: ExprRef) -> Self {
        Self {
            op: self.op,
            left,
            right,
            data_type: self.data_type.clone(),
        }
    }
}

/// `match LIKE pattern [ESCAPE escape]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LikeExpr {
    pub match_expr: ExprRef,
    pub pattern: ExprRef,
    pub escape: Option<ExprRef>,
}

impl LikeExpr {
    pub fn update(&self, match_expr: ExprRef, pattern: ExprRef, escape: Option<ExprRef>) -> Self {
        Self {
            match_expr,
            pattern,
            escape,
        }
    }
}

/// A call to a function, optionally on an instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionExpr {
    pub name: String,
    pub instance: Option<ExprRef>,
    pub args: Vec<ExprRef>,
    pub data_type: DataType,
}

impl FunctionExpr {
    pub fn update(&self, instance: Option<ExprRef>, args: Vec<ExprRef>) -> Self {
        Self {
            name: self.name.clone(),
            instance,
            args,
            data_type: self.data_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaseWhen {
    pub test: ExprRef,
    pub result: ExprRef,
}

/// `CASE [operand] WHEN test THEN result ... [ELSE else_result] END`.
///
/// Without an operand each test is a boolean predicate. With an operand each
/// test is a value compared to the operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaseExpr {
    pub operand: Option<ExprRef>,
    pub when_clauses: Vec<CaseWhen>,
    pub else_result: Option<ExprRef>,
    pub data_type: DataType,
}

impl CaseExpr {
    pub fn update(
        &self,
        operand: Option<ExprRef>,
        when_clauses: Vec<CaseWhen>,
        else_result: Option<ExprRef>,
    ) -> Self {
        Self {
            operand,
            when_clauses,
            else_result,
            data_type: self.data_type.clone(),
        }
    }
}

/// A table being joined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableExpr {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
}

/// A joined table and the predicate linking it to the rest of the query.
///
/// The predicate is an `Equal` or an `AndAlso` chain of `Equal`s.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinExpr {
    pub kind: JoinKind,
    pub table: ExprRef,
    pub predicate: ExprRef,
}

impl JoinExpr {
    pub fn update(&self, table: ExprRef, predicate: ExprRef) -> Self {
        Self {
            kind: self.kind,
            table,
            predicate,
        }
    }

    /// Return true if `predicate` is an equality or a conjunction of equalities.
    pub fn is_equi_predicate(predicate: &Expr) -> bool {
        match predicate {
            Expr::Binary(binary) if binary.op == BinaryOp::Equal => true,
            Expr::Binary(binary) if binary.op == BinaryOp::AndAlso => {
                Self::is_equi_predicate(&binary.left) && Self::is_equi_predicate(&binary.right)
            }
            _ => false,
        }
    }
}

static BOOLEAN_TYPE: DataType = DataType::Boolean;
static RELATIONAL_TYPE: DataType = DataType::Null;

impl Expr {
    /// Short name of the node kind, used in errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Constant(_) => "constant",
            Expr::Column(_) => "column",
            Expr::Parameter(_) => "parameter",
            Expr::Unary(unary) => unary.op.name(),
            Expr::Binary(binary) => binary.op.name(),
            Expr::Like(_) => "like",
            Expr::Function(_) => "function",
            Expr::Case(_) => "case",
            Expr::Table(_) => "table",
            Expr::Join(_) => "join",
        }
    }

    /// The type produced by the expression.
    ///
    /// Tables and joins do not produce a scalar and report `DataType::Null`.
    pub fn data_type(&self) -> &DataType {
        match self {
            Expr::Constant(constant) => &constant.data_type,
            Expr::Column(column) => &column.data_type,
            Expr::Parameter(parameter) => &parameter.data_type,
            Expr::Unary(unary) => &unary.data_type,
            Expr::Binary(binary) => &binary.data_type,
            Expr::Like(_) => &BOOLEAN_TYPE,
            Expr::Function(function) => &function.data_type,
            Expr::Case(case) => &case.data_type,
            Expr::Table(_) | Expr::Join(_) => &RELATIONAL_TYPE,
        }
    }

    /// If this expression is a constant, return the corresponding value.
    pub fn literal_opt(&self) -> Option<&Literal> {
        match self {
            Expr::Constant(constant) => Some(&constant.value),
            _ => None,
        }
    }

    /// If this expression is a boolean constant, return it.
    ///
    /// This returns `None` for the `NULL` constant, even if it is typed as boolean.
    pub fn literal_bool_opt(&self) -> Option<bool> {
        self.literal_opt().and_then(|literal| literal.as_bool().copied())
    }

    /// Return true if this expression is the `NULL` constant.
    pub fn is_null_literal(&self) -> bool {
        self.literal_opt().is_some_and(Literal::is_null)
    }

    /// If this is a unary node applying `op`, return the operand.
    pub fn unary_operand(&self, op: UnaryOp) -> Option<&ExprRef> {
        match self {
            Expr::Unary(unary) if unary.op == op => Some(&unary.operand),
            _ => None,
        }
    }

    /// The children of this node, in evaluation order.
    ///
    /// Optional children are omitted when absent.
    pub fn children(&self) -> SmallVec<[&ExprRef; 2]> {
        let mut children = SmallVec::new();
        match self {
            Expr::Constant(_) | Expr::Column(_) | Expr::Parameter(_) | Expr::Table(_) => {}
            Expr::Unary(unary) => children.push(&unary.operand),
            Expr::Binary(binary) => {
                children.push(&binary.left);
                children.push(&binary.right);
            }
            Expr::Like(like) => {
                children.push(&like.match_expr);
                children.push(&like.pattern);
                children.extend(like.escape.as_ref());
            }
            Expr::Function(function) => {
                children.extend(function.instance.as_ref());
                children.extend(function.args.iter());
            }
            Expr::Case(case) => {
                children.extend(case.operand.as_ref());
                for clause in &case.when_clauses {
                    children.push(&clause.test);
                    children.push(&clause.result);
                }
                children.extend(case.else_result.as_ref());
            }
            Expr::Join(join) => {
                children.push(&join.table);
                children.push(&join.predicate);
            }
        }
        children
    }

    /// Rebuild this node with the given children.
    ///
    /// The children must have the same shape as [`Expr::children`]. If every
    /// child is the same `Arc` as the existing child, the original node is
    /// returned.
    pub fn with_children(
        self: &Arc<Self>,
        children: Vec<ExprRef>,
    ) -> error_stack::Result<ExprRef, Error> {
        let existing = self.children();
        error_stack::ensure!(
            existing.len() == children.len(),
            Error::InvalidChildren {
                kind: self.kind_name(),
                expected: existing.len(),
                actual: children.len(),
            }
        );
        if existing
            .iter()
            .zip(&children)
            .all(|(old, new)| Arc::ptr_eq(*old, new))
        {
            return Ok(self.clone());
        }

        let mut children = children.into_iter();
        let mut next = || {
            children
                .next()
                .ok_or_else(|| Error::internal("child count verified above"))
        };

        let updated = match self.as_ref() {
            Expr::Constant(_) | Expr::Column(_) | Expr::Parameter(_) | Expr::Table(_) => {
                error_stack::bail!(Error::internal("leaf nodes have no children"))
            }
            Expr::Unary(unary) => Expr::Unary(unary.update(next()?)),
            Expr::Binary(binary) => Expr::Binary(binary.update(next()?, next()?)),
            Expr::Like(like) => {
                let match_expr = next()?;
                let pattern = next()?;
                let escape = like.escape.as_ref().map(|_| next()).transpose()?;
                Expr::Like(like.update(match_expr, pattern, escape))
            }
            Expr::Function(function) => {
                let instance = function.instance.as_ref().map(|_| next()).transpose()?;
                let args = function
                    .args
                    .iter()
                    .map(|_| next())
                    .collect::<Result<Vec<_>, _>>()?;
                Expr::Function(function.update(instance, args))
            }
            Expr::Case(case) => {
                let operand = case.operand.as_ref().map(|_| next()).transpose()?;
                let when_clauses = case
                    .when_clauses
                    .iter()
                    .map(|_| -> Result<CaseWhen, Error> {
                        Ok(CaseWhen {
                            test: next()?,
                            result: next()?,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let else_result = case.else_result.as_ref().map(|_| next()).transpose()?;
                Expr::Case(case.update(operand, when_clauses, else_result))
            }
            Expr::Join(join) => Expr::Join(join.update(next()?, next()?)),
        };
        Ok(Arc::new(updated))
    }
}
