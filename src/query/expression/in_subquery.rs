// Quantified Subquery Predicate
//
// `left IN (subquery)`, `left <op> ANY (subquery)` and
// `left <op> ALL (subquery)` under SQL three-valued logic.
//
// Evaluation runs the subquery once per call and picks one of two
// strategies:
// - a correlated scan over the rows, comparing each one with the left value;
// - for IN / = ANY, a lookup in the distinct-value index of the result.
// Both give the same answer for every non-empty typed result.

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};

use crate::catalog::convert::convert_to_type;
use crate::catalog::schema::DataType;
use crate::common::settings::{NullRowPolicy, Settings};
use crate::common::types::{Cost, FilterId, QueryLevel};
use crate::query::executor::context::ExecutionContext;
use crate::query::executor::probe::Probe;
use crate::query::executor::result::{DataValue, QueryError, QueryResult, Truth};
use crate::query::expression::comparison::{compare_not_null, CompareOp};
use crate::query::expression::{ColumnResolver, ExpressionVisitor, ScalarExpr};
use crate::query::planner::subquery::SharedSubquery;
use crate::query::planner::table_filter::{IndexCondition, TableFilter};

/// How a probe is consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Compare the left value with every row until the outcome is decided
    Scan,
    /// Look the left value up in the distinct-value index
    DistinctLookup,
}

/// A comparison between a scalar and the rows of a single-column subquery
#[derive(Debug)]
pub struct InSubqueryCondition {
    left: ScalarExpr,
    query: SharedSubquery,
    all: bool,
    compare: CompareOp,
    query_level: QueryLevel,
}

impl InSubqueryCondition {
    pub fn new(left: ScalarExpr, query: SharedSubquery, all: bool, compare: CompareOp) -> Self {
        InSubqueryCondition {
            left,
            query,
            all,
            compare,
            query_level: 0,
        }
    }

    /// `left IN (query)`
    pub fn in_query(left: ScalarExpr, query: SharedSubquery) -> Self {
        Self::new(left, query, false, CompareOp::Equal)
    }

    /// `left <compare> ANY (query)`
    pub fn any(left: ScalarExpr, compare: CompareOp, query: SharedSubquery) -> Self {
        Self::new(left, query, false, compare)
    }

    /// `left <compare> ALL (query)`
    pub fn all(left: ScalarExpr, compare: CompareOp, query: SharedSubquery) -> Self {
        Self::new(left, query, true, compare)
    }

    pub fn left(&self) -> &ScalarExpr {
        &self.left
    }

    pub fn is_all(&self) -> bool {
        self.all
    }

    pub fn compare_op(&self) -> CompareOp {
        self.compare
    }

    /// Deepest level this predicate has been bound at
    pub fn query_level(&self) -> QueryLevel {
        self.query_level
    }

    /// Bind the left operand at `level` and the subquery one level deeper
    pub fn bind(&mut self, resolver: &dyn ColumnResolver, level: QueryLevel) -> QueryResult<()> {
        self.left.map_columns(resolver, level)?;
        self.query.write().map_columns(resolver, level + 1)?;
        self.query_level = self.query_level.max(level);
        Ok(())
    }

    /// Optimize the left operand and prepare the subquery for both cursor
    /// and distinct-lookup access. The predicate itself is never folded into
    /// a constant: the subquery may see different data on every execution.
    pub fn optimize(&mut self) -> QueryResult<()> {
        self.left.optimize()?;
        let mut query = self.query.write();
        query.set_random_access_result(true);
        query.prepare()?;
        let columns = query.column_count();
        if columns != 1 {
            return Err(QueryError::SubqueryNotSingleColumn(columns));
        }
        Ok(())
    }

    pub fn mark_evaluatable(&mut self, filter: FilterId, evaluatable: bool) {
        self.left.mark_evaluatable(filter, evaluatable);
        self.query.write().mark_evaluatable(filter, evaluatable);
    }

    pub fn estimate_cost(&self) -> Cost {
        self.left.cost().saturating_add(self.query.read().cost_as_expression())
    }

    pub fn is_everything(&self, visitor: &ExpressionVisitor) -> bool {
        self.left.is_everything(visitor) && self.query.read().is_everything(visitor)
    }

    /// Turn `column IN (query)` into an index condition on `filter` when the
    /// column belongs to `filter` and the subquery reads nothing from it.
    /// Returns whether a condition was added.
    pub fn try_push_index_condition(&self, settings: &Settings, filter: &mut TableFilter) -> bool {
        if !settings.optimize_in_list {
            return false;
        }
        // Only plain IN is a set lookup; ALL, ANY and <=> keep row semantics
        if self.all || self.compare != CompareOp::Equal {
            return false;
        }
        let ScalarExpr::Column(column) = &self.left else {
            return false;
        };
        let Some(binding) = column.binding().filter(|b| b.filter == filter.id()) else {
            return false;
        };
        if !self.query.read().is_everything(&ExpressionVisitor::NotFromResolver(filter.id())) {
            debug!("Not pushing {} to filter {}: subquery depends on it", column, filter.id());
            return false;
        }
        debug!("Pushing {} IN (subquery) to filter {} as an index condition", column, filter.id());
        filter.add_index_condition(IndexCondition::in_query(
            binding.index,
            column.name(),
            Arc::clone(&self.query),
        ));
        true
    }

    /// Strategy `evaluate` uses for a non-empty result and a non-null left value
    pub fn strategy(&self, settings: &Settings) -> Strategy {
        if !settings.optimize_in_select || self.all || !self.compare.is_equality() {
            Strategy::Scan
        } else {
            Strategy::DistinctLookup
        }
    }

    /// Evaluate the predicate. Returns `Boolean` or `Null` (UNKNOWN).
    pub fn evaluate(&self, ctx: &ExecutionContext) -> QueryResult<DataValue> {
        let probe = self.query.read().run(ctx)?;
        let mut rows = ctx.registry().register_probe(probe, "quantified subquery");

        let left = self.left.evaluate(ctx)?;
        if rows.row_count() == 0 {
            // ALL over nothing is vacuously true, ANY/IN vacuously false
            return Ok(DataValue::Boolean(self.all));
        }
        if left.is_null() {
            return Ok(DataValue::Null);
        }

        let strategy = self.strategy(ctx.settings());
        let truth = match strategy {
            Strategy::Scan => self.scan(&mut *rows, left, ctx.settings().null_row_policy)?,
            Strategy::DistinctLookup => self.lookup(&mut *rows, left)?,
        };
        trace!("{:?} over {} rows: {}", strategy, rows.row_count(), truth);
        Ok(truth.into())
    }

    fn scan(&self, rows: &mut dyn Probe, left: DataValue, policy: NullRowPolicy) -> QueryResult<Truth> {
        let data_type = rows.column_type(0);
        // Integer and Float are compared by promotion, not by conversion
        let left = if data_type == DataType::Null || (data_type.is_numeric() && left.get_type().is_numeric()) {
            left
        } else {
            convert_to_type(left, &data_type)?
        };
        let mut saw_null = false;
        let mut result = self.all;
        while let Some(row) = rows.next()? {
            let matched = match row.first() {
                Some(value) if !value.is_null() => compare_not_null(&left, value, self.compare)?,
                _ => {
                    saw_null = true;
                    false
                }
            };
            if !matched && self.all {
                result = false;
                break;
            }
            if matched && !self.all {
                result = true;
                break;
            }
        }
        Ok(policy.resolve(self.all, result, saw_null))
    }

    fn lookup(&self, rows: &mut dyn Probe, left: DataValue) -> QueryResult<Truth> {
        let data_type = rows.column_type(0);
        if data_type == DataType::Null {
            return Ok(Truth::False);
        }
        // A fractional Float cannot equal any Integer row
        let key = if matches!(left, DataValue::Float(_)) && data_type == DataType::Integer {
            convert_to_type(left, &data_type).ok()
        } else {
            Some(convert_to_type(left, &data_type)?)
        };
        if let Some(key) = key {
            if rows.contains_distinct(&[key])? {
                return Ok(Truth::True);
            }
        }
        if rows.contains_distinct(&[DataValue::Null])? {
            return Ok(Truth::Unknown);
        }
        Ok(Truth::False)
    }
}

impl fmt::Display for InSubqueryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} ", self.left)?;
        if self.all {
            write!(f, "{} ALL", self.compare)?;
        } else if self.compare == CompareOp::Equal {
            write!(f, "IN")?;
        } else {
            write!(f, "{} ANY", self.compare)?;
        }
        let sql = self.query.read().plan_sql();
        let indented: Vec<String> = sql.lines().map(|line| format!("    {}", line)).collect();
        write!(f, "(\n{}))", indented.join("\n"))
    }
}
