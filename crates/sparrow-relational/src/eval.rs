//! Reference evaluation of scalar expressions over a single row.
//!
//! This is not used to execute queries. It defines what an expression means
//! for a given assignment of column and parameter values, which lets rewrites
//! of the expression tree be checked against the original.

use std::cmp::Ordering;

use hashbrown::HashMap;

use crate::{BinaryExpr, BinaryOp, CaseExpr, Error, Expr, LikeExpr, Literal, UnaryOp};

/// How comparisons treat `NULL` operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullSemantics {
    /// SQL semantics: a comparison with a `NULL` operand is `NULL`.
    ThreeValued,
    /// `NULL` is a value equal only to itself. Ordering comparisons with a
    /// `NULL` operand are false.
    ///
    /// This is the meaning of comparisons in the language queries are written
    /// in, which null-semantics rewriting preserves.
    NullAsValue,
}

/// Values bound to the columns and parameters of an expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    columns: HashMap<(String, String), Literal>,
    parameters: HashMap<String, Literal>,
}

impl Bindings {
    pub fn with_column(mut self, table: &str, name: &str, value: Literal) -> Self {
        self.set_column(table, name, value);
        self
    }

    pub fn with_parameter(mut self, name: &str, value: Literal) -> Self {
        self.set_parameter(name, value);
        self
    }

    pub fn set_column(&mut self, table: &str, name: &str, value: Literal) {
        self.columns
            .insert((table.to_owned(), name.to_owned()), value);
    }

    pub fn set_parameter(&mut self, name: &str, value: Literal) {
        self.parameters.insert(name.to_owned(), value);
    }
}

/// Evaluate `expr` against the given bindings.
pub fn evaluate(
    expr: &Expr,
    bindings: &Bindings,
    semantics: NullSemantics,
) -> error_stack::Result<Literal, Error> {
    Evaluator {
        bindings,
        semantics,
    }
    .evaluate(expr)
}

struct Evaluator<'a> {
    bindings: &'a Bindings,
    semantics: NullSemantics,
}

impl<'a> Evaluator<'a> {
    fn evaluate(&self, expr: &Expr) -> error_stack::Result<Literal, Error> {
        match expr {
            Expr::Constant(constant) => Ok(constant.value.clone()),
            Expr::Column(column) => self
                .bindings
                .columns
                .get(&(column.table.clone(), column.name.clone()))
                .cloned()
                .ok_or_else(|| Error::UnboundValue(format!("{}.{}", column.table, column.name)))
                .map_err(Into::into),
            Expr::Parameter(parameter) => self
                .bindings
                .parameters
                .get(&parameter.name)
                .cloned()
                .ok_or_else(|| Error::UnboundValue(format!("@{}", parameter.name)))
                .map_err(Into::into),
            Expr::Unary(unary) => {
                let operand = self.evaluate(&unary.operand)?;
                match (unary.op, operand) {
                    (UnaryOp::IsNull, operand) => Ok(Literal::Bool(operand.is_null())),
                    (UnaryOp::IsNotNull, operand) => Ok(Literal::Bool(!operand.is_null())),
                    (_, Literal::Null) => Ok(Literal::Null),
                    (UnaryOp::Not, Literal::Bool(value)) => Ok(Literal::Bool(!value)),
                    (UnaryOp::Negate, Literal::Int64(value)) => value
                        .checked_neg()
                        .map(Literal::Int64)
                        .ok_or_else(|| Error::ArithmeticOverflow("negate").into()),
                    (UnaryOp::Negate, Literal::Float64(value)) => {
                        Ok(Literal::new_f64(-value.into_inner()))
                    }
                    (op, operand) => error_stack::bail!(Error::InvalidOperandTypes {
                        op: op.name(),
                        types: vec![operand.data_type()],
                    }),
                }
            }
            Expr::Binary(binary) => self.evaluate_binary(binary),
            Expr::Like(like) => self.evaluate_like(like),
            Expr::Case(case) => self.evaluate_case(case),
            Expr::Function(_) => error_stack::bail!(Error::Unsupported("functions")),
            Expr::Table(_) | Expr::Join(_) => {
                error_stack::bail!(Error::Unsupported("relational expressions"))
            }
        }
    }

    fn evaluate_binary(&self, binary: &BinaryExpr) -> error_stack::Result<Literal, Error> {
        let left = self.evaluate(&binary.left)?;
        let right = self.evaluate(&binary.right)?;
        let op = binary.op;
        match op {
            BinaryOp::AndAlso => {
                let (left, right) = (as_truth(op, &left)?, as_truth(op, &right)?);
                Ok(match (left, right) {
                    (Some(false), _) | (_, Some(false)) => Literal::Bool(false),
                    (Some(true), Some(true)) => Literal::Bool(true),
                    _ => Literal::Null,
                })
            }
            BinaryOp::OrElse => {
                let (left, right) = (as_truth(op, &left)?, as_truth(op, &right)?);
                Ok(match (left, right) {
                    (Some(true), _) | (_, Some(true)) => Literal::Bool(true),
                    (Some(false), Some(false)) => Literal::Bool(false),
                    _ => Literal::Null,
                })
            }
            BinaryOp::Coalesce => Ok(if left.is_null() { right } else { left }),
            _ if op.is_comparison() => self.compare(op, &left, &right),
            _ => arithmetic(op, left, right),
        }
    }

    fn compare(
        &self,
        op: BinaryOp,
        left: &Literal,
        right: &Literal,
    ) -> error_stack::Result<Literal, Error> {
        if left.is_null() || right.is_null() {
            return Ok(match self.semantics {
                NullSemantics::ThreeValued => Literal::Null,
                NullSemantics::NullAsValue => {
                    let both = left.is_null() && right.is_null();
                    match op {
                        BinaryOp::Equal => Literal::Bool(both),
                        BinaryOp::NotEqual => Literal::Bool(!both),
                        _ => Literal::Bool(false),
                    }
                }
            });
        }

        let ordering = compare_values(op, left, right)?;
        let result = match op {
            BinaryOp::Equal => ordering == Ordering::Equal,
            BinaryOp::NotEqual => ordering != Ordering::Equal,
            BinaryOp::LessThan => ordering == Ordering::Less,
            BinaryOp::LessThanOrEqual => ordering != Ordering::Greater,
            BinaryOp::GreaterThan => ordering == Ordering::Greater,
            BinaryOp::GreaterThanOrEqual => ordering != Ordering::Less,
            _ => error_stack::bail!(Error::internal(format!("not a comparison: {op:?}"))),
        };
        Ok(Literal::Bool(result))
    }

    fn evaluate_like(&self, like: &LikeExpr) -> error_stack::Result<Literal, Error> {
        let value = self.evaluate(&like.match_expr)?;
        let pattern = self.evaluate(&like.pattern)?;
        let escape = like
            .escape
            .as_ref()
            .map(|escape| self.evaluate(escape))
            .transpose()?;

        if value.is_null() || pattern.is_null() || escape.as_ref().is_some_and(Literal::is_null) {
            return Ok(Literal::Null);
        }

        let invalid = || {
            let types = [Some(&value), Some(&pattern), escape.as_ref()]
                .into_iter()
                .flatten()
                .map(Literal::data_type)
                .collect();
            Error::InvalidOperandTypes {
                op: "like",
                types,
            }
        };
        let (Literal::String(value), Literal::String(pattern)) = (&value, &pattern) else {
            error_stack::bail!(invalid())
        };
        let escape = match &escape {
            None => None,
            Some(Literal::String(escape)) => {
                let mut chars = escape.chars();
                match (chars.next(), chars.next()) {
                    (Some(escape), None) => Some(escape),
                    _ => error_stack::bail!(invalid()),
                }
            }
            Some(_) => error_stack::bail!(invalid()),
        };
        Ok(Literal::Bool(like_match(value, pattern, escape)))
    }

    fn evaluate_case(&self, case: &CaseExpr) -> error_stack::Result<Literal, Error> {
        let operand = case
            .operand
            .as_ref()
            .map(|operand| self.evaluate(operand))
            .transpose()?;
        for clause in &case.when_clauses {
            let test = self.evaluate(&clause.test)?;
            let matched = match &operand {
                Some(operand) => self.compare(BinaryOp::Equal, operand, &test)?,
                None => test,
            };
            if matched == Literal::Bool(true) {
                return self.evaluate(&clause.result);
            }
        }
        match &case.else_result {
            Some(else_result) => self.evaluate(else_result),
            None => Ok(Literal::Null),
        }
    }
}

fn as_truth(op: BinaryOp, value: &Literal) -> error_stack::Result<Option<bool>, Error> {
    match value {
        Literal::Null => Ok(None),
        Literal::Bool(value) => Ok(Some(*value)),
        other => error_stack::bail!(Error::InvalidOperandTypes {
            op: op.name(),
            types: vec![other.data_type()],
        }),
    }
}

fn compare_values(
    op: BinaryOp,
    left: &Literal,
    right: &Literal,
) -> error_stack::Result<Ordering, Error> {
    let ordering = match (left, right) {
        (Literal::Bool(a), Literal::Bool(b)) => a.cmp(b),
        (Literal::Int64(a), Literal::Int64(b)) => a.cmp(b),
        (Literal::Float64(a), Literal::Float64(b)) => a.cmp(b),
        (Literal::Int64(a), Literal::Float64(b)) => decorum::Total::from(*a as f64).cmp(b),
        (Literal::Float64(a), Literal::Int64(b)) => a.cmp(&decorum::Total::from(*b as f64)),
        (Literal::String(a), Literal::String(b)) => a.cmp(b),
        _ => error_stack::bail!(Error::InvalidOperandTypes {
            op: op.name(),
            types: vec![left.data_type(), right.data_type()],
        }),
    };
    Ok(ordering)
}

fn arithmetic(op: BinaryOp, left: Literal, right: Literal) -> error_stack::Result<Literal, Error> {
    let overflow = || Error::ArithmeticOverflow(op.name());
    match (left, right) {
        (Literal::Null, _) | (_, Literal::Null) => Ok(Literal::Null),
        (Literal::Int64(a), Literal::Int64(b)) => {
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Subtract => a.checked_sub(b),
                BinaryOp::Multiply => a.checked_mul(b),
                BinaryOp::Divide | BinaryOp::Modulo if b == 0 => {
                    error_stack::bail!(Error::DivisionByZero)
                }
                BinaryOp::Divide => a.checked_div(b),
                BinaryOp::Modulo => a.checked_rem(b),
                _ => error_stack::bail!(Error::internal(format!("not arithmetic: {op:?}"))),
            };
            Ok(Literal::Int64(result.ok_or_else(overflow)?))
        }
        (left, right) => {
            let (Some(a), Some(b)) = (as_f64(&left), as_f64(&right)) else {
                error_stack::bail!(Error::InvalidOperandTypes {
                    op: op.name(),
                    types: vec![left.data_type(), right.data_type()],
                })
            };
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Subtract => a - b,
                BinaryOp::Multiply => a * b,
                BinaryOp::Divide => a / b,
                BinaryOp::Modulo => a % b,
                _ => error_stack::bail!(Error::internal(format!("not arithmetic: {op:?}"))),
            };
            Ok(Literal::new_f64(result))
        }
    }
}

fn as_f64(value: &Literal) -> Option<f64> {
    match value {
        Literal::Int64(n) => Some(*n as f64),
        Literal::Float64(n) => Some(n.into_inner()),
        _ => None,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LikeToken {
    /// `%`: zero or more characters.
    Any,
    /// `_`: exactly one character.
    One,
    Char(char),
}

/// Match `value` against a SQL `LIKE` pattern.
fn like_match(value: &str, pattern: &str, escape: Option<char>) -> bool {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            c if Some(c) == escape => match chars.next() {
                Some(escaped) => LikeToken::Char(escaped),
                // A trailing escape matches itself.
                None => LikeToken::Char(c),
            },
            '%' => LikeToken::Any,
            '_' => LikeToken::One,
            c => LikeToken::Char(c),
        };
        tokens.push(token);
    }

    // matches[j] is true if the characters consumed so far match tokens[..j].
    let value: Vec<char> = value.chars().collect();
    let mut matches = vec![false; tokens.len() + 1];
    matches[0] = true;
    for (j, token) in tokens.iter().enumerate() {
        matches[j + 1] = matches[j] && *token == LikeToken::Any;
    }
    for c in value {
        let mut next = vec![false; tokens.len() + 1];
        for (j, token) in tokens.iter().enumerate() {
            next[j + 1] = match token {
                LikeToken::Any => next[j] || matches[j + 1],
                LikeToken::One => matches[j],
                LikeToken::Char(expected) => matches[j] && *expected == c,
            };
        }
        matches = next;
    }
    matches[tokens.len()]
}
