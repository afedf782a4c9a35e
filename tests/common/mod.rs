#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use insubquery::common::types::{Cost, FilterId, QueryLevel};
use insubquery::query::executor::{ExecutionContext, Probe};
use insubquery::query::expression::{ColumnResolver, ExpressionVisitor};
use insubquery::query::planner::{SharedSubquery, SubqueryPlan};
use insubquery::query::executor::result::Row;
use insubquery::{share, DataType, DataValue, QueryError, QueryResult, ValuesSubquery};

// Build single-column integer values; None is NULL
pub fn int_values(values: &[Option<i64>]) -> Vec<DataValue> {
    values
        .iter()
        .map(|v| v.map_or(DataValue::Null, DataValue::Integer))
        .collect()
}

// Shared single-column INTEGER subquery over literal rows
pub fn int_subquery(values: &[Option<i64>]) -> SharedSubquery {
    share(ValuesSubquery::from_values("v", DataType::Integer, int_values(values)))
}

/// Counters shared between a `CountingSubquery` and the test inspecting it
#[derive(Debug, Default)]
pub struct ProbeStats {
    pub runs: AtomicUsize,
    pub rows_read: AtomicUsize,
    pub closes: AtomicUsize,
}

impl ProbeStats {
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Wraps another plan and counts runs, cursor reads and closes
#[derive(Debug)]
pub struct CountingSubquery {
    inner: ValuesSubquery,
    stats: Arc<ProbeStats>,
}

impl CountingSubquery {
    pub fn new(inner: ValuesSubquery) -> (Self, Arc<ProbeStats>) {
        let stats = Arc::new(ProbeStats::default());
        (CountingSubquery { inner, stats: Arc::clone(&stats) }, stats)
    }
}

struct CountingProbe {
    inner: Box<dyn Probe>,
    stats: Arc<ProbeStats>,
}

impl Probe for CountingProbe {
    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn column_type(&self, index: usize) -> DataType {
        self.inner.column_type(index)
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        let row = self.inner.next()?;
        if row.is_some() {
            self.stats.rows_read.fetch_add(1, Ordering::SeqCst);
        }
        Ok(row)
    }

    fn contains_distinct(&mut self, values: &[DataValue]) -> QueryResult<bool> {
        self.inner.contains_distinct(values)
    }

    fn close(&mut self) -> QueryResult<()> {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close()
    }
}

impl SubqueryPlan for CountingSubquery {
    fn map_columns(&mut self, resolver: &dyn ColumnResolver, level: QueryLevel) -> QueryResult<()> {
        self.inner.map_columns(resolver, level)
    }

    fn set_random_access_result(&mut self, random_access: bool) {
        self.inner.set_random_access_result(random_access);
    }

    fn prepare(&mut self) -> QueryResult<()> {
        self.inner.prepare()
    }

    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn mark_evaluatable(&mut self, filter: FilterId, evaluatable: bool) {
        self.inner.mark_evaluatable(filter, evaluatable);
    }

    fn cost_as_expression(&self) -> Cost {
        self.inner.cost_as_expression()
    }

    fn is_everything(&self, visitor: &ExpressionVisitor) -> bool {
        self.inner.is_everything(visitor)
    }

    fn plan_sql(&self) -> String {
        self.inner.plan_sql()
    }

    fn run(&self, ctx: &ExecutionContext) -> QueryResult<Box<dyn Probe>> {
        self.stats.runs.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.run(ctx)?;
        Ok(Box::new(CountingProbe { inner, stats: Arc::clone(&self.stats) }))
    }
}

/// Subquery whose execution always fails
#[derive(Debug)]
pub struct FailingSubquery;

impl SubqueryPlan for FailingSubquery {
    fn map_columns(&mut self, _resolver: &dyn ColumnResolver, _level: QueryLevel) -> QueryResult<()> {
        Ok(())
    }

    fn set_random_access_result(&mut self, _random_access: bool) {}

    fn prepare(&mut self) -> QueryResult<()> {
        Ok(())
    }

    fn column_count(&self) -> usize {
        1
    }

    fn mark_evaluatable(&mut self, _filter: FilterId, _evaluatable: bool) {}

    fn cost_as_expression(&self) -> Cost {
        10
    }

    fn is_everything(&self, _visitor: &ExpressionVisitor) -> bool {
        true
    }

    fn plan_sql(&self) -> String {
        "SELECT broken()".to_string()
    }

    fn run(&self, _ctx: &ExecutionContext) -> QueryResult<Box<dyn Probe>> {
        Err(QueryError::ExecutionError("subquery storage unavailable".to_string()))
    }
}
