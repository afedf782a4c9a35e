// Subquery Plans
//
// The interface the membership predicate needs from a nested query plan,
// and an in-memory `VALUES` plan implementing it. Row expressions of a
// `ValuesSubquery` may reference columns of enclosing queries, which makes
// the subquery correlated.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::catalog::convert::convert_to_type;
use crate::catalog::schema::DataType;
use crate::common::types::{Cost, FilterId, QueryLevel};
use crate::query::executor::context::ExecutionContext;
use crate::query::executor::probe::{MaterializedProbe, Probe};
use crate::query::executor::result::{DataValue, QueryError, QueryResult};
use crate::query::expression::{ColumnResolver, ExpressionVisitor, ScalarExpr};

/// A nested query plan that can be bound, prepared and run
pub trait SubqueryPlan: fmt::Debug + Send + Sync {
    /// Bind free column references to an enclosing scope
    fn map_columns(&mut self, resolver: &dyn ColumnResolver, level: QueryLevel) -> QueryResult<()>;

    /// Request a result that also supports distinct-value lookups
    fn set_random_access_result(&mut self, random_access: bool);

    /// Finish planning. Fixes the output shape.
    fn prepare(&mut self) -> QueryResult<()>;

    /// Number of projected columns
    fn column_count(&self) -> usize;

    fn mark_evaluatable(&mut self, filter: FilterId, evaluatable: bool);

    /// Amortized cost of one execution, as seen by an enclosing expression
    fn cost_as_expression(&self) -> Cost;

    fn is_everything(&self, visitor: &ExpressionVisitor) -> bool;

    /// SQL text of the plan
    fn plan_sql(&self) -> String;

    /// Execute the plan once against the current rows of `ctx`
    fn run(&self, ctx: &ExecutionContext) -> QueryResult<Box<dyn Probe>>;
}

/// Subquery plan shared between a predicate and the index conditions
/// derived from it
pub type SharedSubquery = Arc<RwLock<dyn SubqueryPlan>>;

pub fn share<P: SubqueryPlan + 'static>(plan: P) -> SharedSubquery {
    Arc::new(RwLock::new(plan))
}

/// Fixed cost of setting up any subquery execution
const SUBQUERY_SETUP_COST: Cost = 10;

/// Upper bound of a subquery cost estimate
const MAX_SUBQUERY_COST: Cost = 1_000_000;

/// `VALUES (...), (...)` with declared output columns
#[derive(Debug, Clone)]
pub struct ValuesSubquery {
    columns: Vec<(String, DataType)>,
    rows: Vec<Vec<ScalarExpr>>,
    random_access: bool,
    prepared: bool,
}

impl ValuesSubquery {
    pub fn new(columns: Vec<(String, DataType)>) -> Self {
        ValuesSubquery {
            columns,
            rows: Vec::new(),
            random_access: false,
            prepared: false,
        }
    }

    /// Single-column subquery over literal values
    pub fn from_values(name: &str, data_type: DataType, values: Vec<DataValue>) -> Self {
        let mut plan = ValuesSubquery::new(vec![(name.to_string(), data_type)]);
        for value in values {
            plan.add_row(vec![ScalarExpr::literal(value)]);
        }
        plan
    }

    pub fn add_row(&mut self, row: Vec<ScalarExpr>) {
        self.rows.push(row);
        self.prepared = false;
    }

    pub fn with_row(mut self, row: Vec<ScalarExpr>) -> Self {
        self.add_row(row);
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn expressions(&self) -> impl Iterator<Item = &ScalarExpr> {
        self.rows.iter().flatten()
    }
}

impl SubqueryPlan for ValuesSubquery {
    fn map_columns(&mut self, resolver: &dyn ColumnResolver, level: QueryLevel) -> QueryResult<()> {
        for expr in self.rows.iter_mut().flatten() {
            expr.map_columns(resolver, level)?;
        }
        Ok(())
    }

    fn set_random_access_result(&mut self, random_access: bool) {
        self.random_access = random_access;
    }

    fn prepare(&mut self) -> QueryResult<()> {
        let width = self.columns.len();
        for (i, row) in self.rows.iter_mut().enumerate() {
            if row.len() != width {
                return Err(QueryError::PlanningError(format!(
                    "VALUES row {} has {} values, expected {}",
                    i + 1, row.len(), width
                )));
            }
            for expr in row.iter_mut() {
                expr.optimize()?;
            }
        }
        self.prepared = true;
        Ok(())
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn mark_evaluatable(&mut self, filter: FilterId, evaluatable: bool) {
        for expr in self.rows.iter_mut().flatten() {
            expr.mark_evaluatable(filter, evaluatable);
        }
    }

    fn cost_as_expression(&self) -> Cost {
        let cells = self.rows.len() as u64 * self.columns.len() as u64;
        let expressions: u64 = self.expressions().map(|e| u64::from(e.cost())).sum();
        let cost = u64::from(SUBQUERY_SETUP_COST) + 10 * (cells + expressions);
        cost.min(u64::from(MAX_SUBQUERY_COST)) as Cost
    }

    fn is_everything(&self, visitor: &ExpressionVisitor) -> bool {
        let inner = visitor.descend();
        self.expressions().all(|e| e.is_everything(&inner))
    }

    fn plan_sql(&self) -> String {
        let rows: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row.iter().map(|e| e.to_string()).collect();
                format!("({})", values.join(", "))
            })
            .collect();
        let names: Vec<&str> = self.columns.iter().map(|(name, _)| name.as_str()).collect();
        format!("SELECT * FROM (VALUES {}) AS V({})", rows.join(", "), names.join(", "))
    }

    fn run(&self, ctx: &ExecutionContext) -> QueryResult<Box<dyn Probe>> {
        if !self.prepared {
            return Err(QueryError::ExecutionError("Subquery has not been prepared".to_string()));
        }
        let mut result = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut values = Vec::with_capacity(row.len());
            for (expr, (_, data_type)) in row.iter().zip(&self.columns) {
                values.push(convert_to_type(expr.evaluate(ctx)?, data_type)?);
            }
            result.push(values);
        }
        let column_types = self.columns.iter().map(|(_, data_type)| *data_type).collect();
        Ok(Box::new(MaterializedProbe::new(column_types, result, self.random_access)))
    }
}
