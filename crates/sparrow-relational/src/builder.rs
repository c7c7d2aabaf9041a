use std::sync::Arc;

use arrow_schema::DataType;

use crate::typecheck::{common_type, is_string, typecheck_binary, typecheck_unary};
use crate::{
    BinaryExpr, BinaryOp, CaseExpr, CaseWhen, ColumnExpr, ConstantExpr, Error, Expr, ExprRef,
    FunctionExpr, JoinExpr, JoinKind, LikeExpr, Literal, ParameterExpr, TableExpr, UnaryExpr,
    UnaryOp,
};

/// Creates validated expression nodes.
///
/// Passes over expression trees never construct nodes directly. New nodes are
/// created through a builder, which checks operand types and decides the type
/// metadata of the result.
pub trait ExprBuilder: Send + Sync {
    fn constant(&self, value: Literal, data_type: DataType) -> error_stack::Result<ExprRef, Error>;

    fn column(
        &self,
        table: &str,
        name: &str,
        data_type: DataType,
        nullable: bool,
    ) -> error_stack::Result<ExprRef, Error>;

    fn parameter(&self, name: &str, data_type: DataType) -> error_stack::Result<ExprRef, Error>;

    fn unary(&self, op: UnaryOp, operand: ExprRef) -> error_stack::Result<ExprRef, Error>;

    /// Create a binary node with the result type determined by the operator.
    fn binary(
        &self,
        op: BinaryOp,
        left: ExprRef,
        right: ExprRef,
    ) -> error_stack::Result<ExprRef, Error>;

    /// Create a binary node with an explicit result type.
    fn make_binary(
        &self,
        op: BinaryOp,
        left: ExprRef,
        right: ExprRef,
        data_type: DataType,
    ) -> error_stack::Result<ExprRef, Error>;

    fn like(
        &self,
        match_expr: ExprRef,
        pattern: ExprRef,
        escape: Option<ExprRef>,
    ) -> error_stack::Result<ExprRef, Error>;

    fn function(
        &self,
        name: &str,
        instance: Option<ExprRef>,
        args: Vec<ExprRef>,
        data_type: DataType,
    ) -> error_stack::Result<ExprRef, Error>;

    fn case(
        &self,
        operand: Option<ExprRef>,
        when_clauses: Vec<CaseWhen>,
        else_result: Option<ExprRef>,
    ) -> error_stack::Result<ExprRef, Error>;

    fn table(&self, name: &str, alias: Option<&str>) -> error_stack::Result<ExprRef, Error>;

    fn join(
        &self,
        kind: JoinKind,
        table: ExprRef,
        predicate: ExprRef,
    ) -> error_stack::Result<ExprRef, Error>;

    fn bool_constant(&self, value: bool) -> error_stack::Result<ExprRef, Error> {
        self.constant(Literal::Bool(value), DataType::Boolean)
    }

    fn not(&self, operand: ExprRef) -> error_stack::Result<ExprRef, Error> {
        self.unary(UnaryOp::Not, operand)
    }

    fn is_null(&self, operand: ExprRef) -> error_stack::Result<ExprRef, Error> {
        self.unary(UnaryOp::IsNull, operand)
    }

    fn is_not_null(&self, operand: ExprRef) -> error_stack::Result<ExprRef, Error> {
        self.unary(UnaryOp::IsNotNull, operand)
    }

    fn negate(&self, operand: ExprRef) -> error_stack::Result<ExprRef, Error> {
        self.unary(UnaryOp::Negate, operand)
    }

    fn equal(&self, left: ExprRef, right: ExprRef) -> error_stack::Result<ExprRef, Error> {
        self.binary(BinaryOp::Equal, left, right)
    }

    fn not_equal(&self, left: ExprRef, right: ExprRef) -> error_stack::Result<ExprRef, Error> {
        self.binary(BinaryOp::NotEqual, left, right)
    }

    fn and_also(&self, left: ExprRef, right: ExprRef) -> error_stack::Result<ExprRef, Error> {
        self.binary(BinaryOp::AndAlso, left, right)
    }

    fn or_else(&self, left: ExprRef, right: ExprRef) -> error_stack::Result<ExprRef, Error> {
        self.binary(BinaryOp::OrElse, left, right)
    }

    fn coalesce(&self, left: ExprRef, right: ExprRef) -> error_stack::Result<ExprRef, Error> {
        self.binary(BinaryOp::Coalesce, left, right)
    }
}

/// The default [`ExprBuilder`], validating operand types.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlExprBuilder;

impl ExprBuilder for SqlExprBuilder {
    fn constant(&self, value: Literal, data_type: DataType) -> error_stack::Result<ExprRef, Error> {
        error_stack::ensure!(
            value.is_valid_for(&data_type),
            Error::InvalidLiteral {
                literal: value.to_string(),
                data_type,
            }
        );
        Ok(Arc::new(Expr::Constant(ConstantExpr { value, data_type })))
    }

    fn column(
        &self,
        table: &str,
        name: &str,
        data_type: DataType,
        nullable: bool,
    ) -> error_stack::Result<ExprRef, Error> {
        Ok(Arc::new(Expr::Column(ColumnExpr {
            table: table.to_owned(),
            name: name.to_owned(),
            data_type,
            nullable,
        })))
    }

    fn parameter(&self, name: &str, data_type: DataType) -> error_stack::Result<ExprRef, Error> {
        Ok(Arc::new(Expr::Parameter(ParameterExpr {
            name: name.to_owned(),
            data_type,
        })))
    }

    fn unary(&self, op: UnaryOp, operand: ExprRef) -> error_stack::Result<ExprRef, Error> {
        let data_type = typecheck_unary(op, operand.data_type())?;
        Ok(Arc::new(Expr::Unary(UnaryExpr {
            op,
            operand,
            data_type,
        })))
    }

    fn binary(
        &self,
        op: BinaryOp,
        left: ExprRef,
        right: ExprRef,
    ) -> error_stack::Result<ExprRef, Error> {
        let data_type = typecheck_binary(op, left.data_type(), right.data_type())?;
        Ok(Arc::new(Expr::Binary(BinaryExpr {
            op,
            left,
            right,
            data_type,
        })))
    }

    fn make_binary(
        &self,
        op: BinaryOp,
        left: ExprRef,
        right: ExprRef,
        data_type: DataType,
    ) -> error_stack::Result<ExprRef, Error> {
        // Validate the operands, but keep the type the caller asked for.
        typecheck_binary(op, left.data_type(), right.data_type())?;
        Ok(Arc::new(Expr::Binary(BinaryExpr {
            op,
            left,
            right,
            data_type,
        })))
    }

    fn like(
        &self,
        match_expr: ExprRef,
        pattern: ExprRef,
        escape: Option<ExprRef>,
    ) -> error_stack::Result<ExprRef, Error> {
        let operands = std::iter::once(&match_expr)
            .chain(std::iter::once(&pattern))
            .chain(escape.as_ref());
        error_stack::ensure!(
            operands.clone().all(|operand| is_string(operand.data_type())),
            Error::invalid_operands("like", operands.map(|operand| operand.data_type()))
        );
        Ok(Arc::new(Expr::Like(LikeExpr {
            match_expr,
            pattern,
            escape,
        })))
    }

    fn function(
        &self,
        name: &str,
        instance: Option<ExprRef>,
        args: Vec<ExprRef>,
        data_type: DataType,
    ) -> error_stack::Result<ExprRef, Error> {
        Ok(Arc::new(Expr::Function(FunctionExpr {
            name: name.to_owned(),
            instance,
            args,
            data_type,
        })))
    }

    fn case(
        &self,
        operand: Option<ExprRef>,
        when_clauses: Vec<CaseWhen>,
        else_result: Option<ExprRef>,
    ) -> error_stack::Result<ExprRef, Error> {
        error_stack::ensure!(
            !when_clauses.is_empty(),
            Error::invalid_operands("case", std::iter::empty())
        );

        let test_type = match &operand {
            Some(operand) => operand.data_type().clone(),
            None => DataType::Boolean,
        };
        for clause in &when_clauses {
            let test = clause.test.data_type();
            error_stack::ensure!(
                common_type(&test_type, test).is_some(),
                Error::invalid_operands("case", [&test_type, test])
            );
        }

        let results = when_clauses
            .iter()
            .map(|clause| &clause.result)
            .chain(else_result.as_ref())
            .map(|result| result.data_type());
        let data_type = results
            .clone()
            .try_fold(DataType::Null, |acc, result| common_type(&acc, result))
            .ok_or_else(|| Error::invalid_operands("case", results.clone()))?;

        Ok(Arc::new(Expr::Case(CaseExpr {
            operand,
            when_clauses,
            else_result,
            data_type,
        })))
    }

    fn table(&self, name: &str, alias: Option<&str>) -> error_stack::Result<ExprRef, Error> {
        Ok(Arc::new(Expr::Table(TableExpr {
            name: name.to_owned(),
            alias: alias.map(str::to_owned),
        })))
    }

    fn join(
        &self,
        kind: JoinKind,
        table: ExprRef,
        predicate: ExprRef,
    ) -> error_stack::Result<ExprRef, Error> {
        error_stack::ensure!(
            matches!(table.as_ref(), Expr::Table(_)),
            Error::internal(format!("join of non-table {}", table.kind_name()))
        );
        error_stack::ensure!(
            JoinExpr::is_equi_predicate(&predicate),
            Error::InvalidJoinPredicate(predicate.to_string())
        );
        Ok(Arc::new(Expr::Join(JoinExpr {
            kind,
            table,
            predicate,
        })))
    }
}
