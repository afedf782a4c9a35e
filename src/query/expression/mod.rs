// Scalar Expressions
//
// The expression tree operands of a membership predicate are built from.
// Columns are bound to a table filter and a query level by `map_columns`,
// evaluated against the current rows of an `ExecutionContext`, and can be
// inspected by `ExpressionVisitor` queries.

pub mod comparison;
pub mod in_subquery;

use std::fmt;

use crate::catalog::schema::DataType;
use crate::common::types::{Cost, FilterId, QueryLevel};
use crate::query::executor::context::ExecutionContext;
use crate::query::executor::result::{DataValue, QueryError, QueryResult};

pub use self::comparison::{compare_not_null, CompareOp};
pub use self::in_subquery::InSubqueryCondition;

/// Resolves column names for one table occurrence during binding
pub trait ColumnResolver {
    /// Filter that columns resolved here are bound to
    fn filter_id(&self) -> FilterId;

    /// Alias (or table name) used to qualify columns of this filter
    fn table_alias(&self) -> &str;

    /// Position and declared type of the named column, if it exists
    fn find_column(&self, name: &str) -> Option<(usize, DataType)>;
}

/// Questions asked of a whole expression tree through `is_everything`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionVisitor {
    /// No column is read from the given filter
    NotFromResolver(FilterId),
    /// Every column is either bound at an outer level or already marked
    /// evaluatable by the filter machinery
    Evaluatable { level: QueryLevel },
}

impl ExpressionVisitor {
    /// The same question asked one query level deeper
    pub fn descend(&self) -> Self {
        match *self {
            ExpressionVisitor::NotFromResolver(filter) => ExpressionVisitor::NotFromResolver(filter),
            ExpressionVisitor::Evaluatable { level } => ExpressionVisitor::Evaluatable { level: level + 1 },
        }
    }
}

/// Where a bound column reads its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnBinding {
    pub filter: FilterId,
    pub index: usize,
    pub data_type: DataType,
    pub level: QueryLevel,
}

/// Column reference (could be qualified with a table alias)
#[derive(Debug, Clone)]
pub struct ColumnExpr {
    table: Option<String>,
    name: String,
    binding: Option<ColumnBinding>,
    evaluatable: bool,
}

impl ColumnExpr {
    pub fn new(table: Option<&str>, name: &str) -> Self {
        ColumnExpr {
            table: table.map(str::to_string),
            name: name.to_string(),
            binding: None,
            evaluatable: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binding(&self) -> Option<&ColumnBinding> {
        self.binding.as_ref()
    }

    fn map_columns(&mut self, resolver: &dyn ColumnResolver, level: QueryLevel) -> QueryResult<()> {
        if let Some(table) = &self.table {
            if !table.eq_ignore_ascii_case(resolver.table_alias()) {
                return Ok(());
            }
        }
        let Some((index, data_type)) = resolver.find_column(&self.name) else {
            return Ok(());
        };
        match self.binding {
            None => {
                self.binding = Some(ColumnBinding {
                    filter: resolver.filter_id(),
                    index,
                    data_type,
                    level,
                });
                Ok(())
            }
            Some(existing) if existing.level == level && existing.filter != resolver.filter_id() => {
                Err(QueryError::PlanningError(format!("Ambiguous column name: {}", self)))
            }
            // Already bound by an inner scope, which shadows this one
            Some(_) => Ok(()),
        }
    }

    fn evaluate(&self, ctx: &ExecutionContext) -> QueryResult<DataValue> {
        match &self.binding {
            Some(binding) => ctx.current_value(binding.filter, binding.index),
            None => Err(QueryError::ColumnNotFound(self.to_string())),
        }
    }

    fn is_everything(&self, visitor: &ExpressionVisitor) -> bool {
        match visitor {
            ExpressionVisitor::NotFromResolver(filter) => {
                self.binding.is_none_or(|b| b.filter != *filter)
            }
            ExpressionVisitor::Evaluatable { level } => match &self.binding {
                Some(binding) => binding.level < *level || self.evaluatable,
                None => false,
            },
        }
    }
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ArithmeticOp::Plus => "+",
            ArithmeticOp::Minus => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
        };
        write!(f, "{}", symbol)
    }
}

/// Scalar expression
#[derive(Debug, Clone)]
pub enum ScalarExpr {
    /// Literal value
    Literal(DataValue),
    /// Column reference
    Column(ColumnExpr),
    /// Arithmetic on two operands
    BinaryOp {
        left: Box<ScalarExpr>,
        op: ArithmeticOp,
        right: Box<ScalarExpr>,
    },
}

impl ScalarExpr {
    pub fn literal(value: DataValue) -> Self {
        ScalarExpr::Literal(value)
    }

    pub fn column(table: Option<&str>, name: &str) -> Self {
        ScalarExpr::Column(ColumnExpr::new(table, name))
    }

    pub fn binary(left: ScalarExpr, op: ArithmeticOp, right: ScalarExpr) -> Self {
        ScalarExpr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Bind unbound column references that `resolver` knows about
    pub fn map_columns(&mut self, resolver: &dyn ColumnResolver, level: QueryLevel) -> QueryResult<()> {
        match self {
            ScalarExpr::Literal(_) => Ok(()),
            ScalarExpr::Column(column) => column.map_columns(resolver, level),
            ScalarExpr::BinaryOp { left, right, .. } => {
                left.map_columns(resolver, level)?;
                right.map_columns(resolver, level)
            }
        }
    }

    /// Fold arithmetic over literals into a single literal
    pub fn optimize(&mut self) -> QueryResult<()> {
        if let ScalarExpr::BinaryOp { left, op, right } = self {
            left.optimize()?;
            right.optimize()?;
            if let (ScalarExpr::Literal(l), ScalarExpr::Literal(r)) = (left.as_ref(), right.as_ref()) {
                let folded = apply_arithmetic(l.clone(), *op, r.clone())?;
                *self = ScalarExpr::Literal(folded);
            }
        }
        Ok(())
    }

    pub fn evaluate(&self, ctx: &ExecutionContext) -> QueryResult<DataValue> {
        match self {
            ScalarExpr::Literal(value) => Ok(value.clone()),
            ScalarExpr::Column(column) => column.evaluate(ctx),
            ScalarExpr::BinaryOp { left, op, right } => {
                let left_val = left.evaluate(ctx)?;
                let right_val = right.evaluate(ctx)?;
                apply_arithmetic(left_val, *op, right_val)
            }
        }
    }

    pub fn mark_evaluatable(&mut self, filter: FilterId, evaluatable: bool) {
        match self {
            ScalarExpr::Literal(_) => {}
            ScalarExpr::Column(column) => {
                if column.binding.is_some_and(|b| b.filter == filter) {
                    column.evaluatable = evaluatable;
                }
            }
            ScalarExpr::BinaryOp { left, right, .. } => {
                left.mark_evaluatable(filter, evaluatable);
                right.mark_evaluatable(filter, evaluatable);
            }
        }
    }

    /// Estimated cost of evaluating this expression once
    pub fn cost(&self) -> Cost {
        match self {
            ScalarExpr::Literal(_) => 0,
            ScalarExpr::Column(_) => 2,
            ScalarExpr::BinaryOp { left, right, .. } => left.cost() + right.cost() + 1,
        }
    }

    pub fn is_everything(&self, visitor: &ExpressionVisitor) -> bool {
        match self {
            ScalarExpr::Literal(_) => true,
            ScalarExpr::Column(column) => column.is_everything(visitor),
            ScalarExpr::BinaryOp { left, right, .. } => {
                left.is_everything(visitor) && right.is_everything(visitor)
            }
        }
    }
}

impl fmt::Display for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarExpr::Literal(value) => write!(f, "{}", value.to_sql_literal()),
            ScalarExpr::Column(column) => write!(f, "{}", column),
            ScalarExpr::BinaryOp { left, op, right } => write!(f, "({} {} {})", left, op, right),
        }
    }
}

fn apply_arithmetic(left_val: DataValue, op: ArithmeticOp, right_val: DataValue) -> QueryResult<DataValue> {
    // op(NULL, _) -> NULL, op(_, NULL) -> NULL
    if left_val.is_null() || right_val.is_null() {
        return Ok(DataValue::Null);
    }
    match op {
        ArithmeticOp::Plus => match (left_val, right_val) {
            (DataValue::Integer(l), DataValue::Integer(r)) => Ok(DataValue::Integer(l.checked_add(r).ok_or(QueryError::NumericOverflow)?)),
            (DataValue::Float(l), DataValue::Float(r)) => Ok(DataValue::Float(l + r)),
            (DataValue::Integer(l), DataValue::Float(r)) => Ok(DataValue::Float(l as f64 + r)),
            (DataValue::Float(l), DataValue::Integer(r)) => Ok(DataValue::Float(l + r as f64)),
            _ => Err(QueryError::TypeMismatch("Unsupported types for + operator".to_string())),
        },
        ArithmeticOp::Minus => match (left_val, right_val) {
            (DataValue::Integer(l), DataValue::Integer(r)) => Ok(DataValue::Integer(l.checked_sub(r).ok_or(QueryError::NumericOverflow)?)),
            (DataValue::Float(l), DataValue::Float(r)) => Ok(DataValue::Float(l - r)),
            (DataValue::Integer(l), DataValue::Float(r)) => Ok(DataValue::Float(l as f64 - r)),
            (DataValue::Float(l), DataValue::Integer(r)) => Ok(DataValue::Float(l - r as f64)),
            _ => Err(QueryError::TypeMismatch("Unsupported types for - operator".to_string())),
        },
        ArithmeticOp::Multiply => match (left_val, right_val) {
            (DataValue::Integer(l), DataValue::Integer(r)) => Ok(DataValue::Integer(l.checked_mul(r).ok_or(QueryError::NumericOverflow)?)),
            (DataValue::Float(l), DataValue::Float(r)) => Ok(DataValue::Float(l * r)),
            (DataValue::Integer(l), DataValue::Float(r)) => Ok(DataValue::Float(l as f64 * r)),
            (DataValue::Float(l), DataValue::Integer(r)) => Ok(DataValue::Float(l * r as f64)),
            _ => Err(QueryError::TypeMismatch("Unsupported types for * operator".to_string())),
        },
        ArithmeticOp::Divide => match (left_val, right_val) {
            (DataValue::Integer(_), DataValue::Integer(0)) => Err(QueryError::DivisionByZero),
            (DataValue::Integer(l), DataValue::Integer(r)) => Ok(DataValue::Integer(l.checked_div(r).ok_or(QueryError::NumericOverflow)?)),
            (DataValue::Float(_) | DataValue::Integer(_), DataValue::Float(r)) if r == 0.0 => Err(QueryError::DivisionByZero),
            (DataValue::Float(_), DataValue::Integer(0)) => Err(QueryError::DivisionByZero),
            (DataValue::Float(l), DataValue::Float(r)) => Ok(DataValue::Float(l / r)),
            (DataValue::Integer(l), DataValue::Float(r)) => Ok(DataValue::Float(l as f64 / r)),
            (DataValue::Float(l), DataValue::Integer(r)) => Ok(DataValue::Float(l / r as f64)),
            _ => Err(QueryError::TypeMismatch("Unsupported types for / operator".to_string())),
        },
    }
}
