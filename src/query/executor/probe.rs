// Subquery Probe
//
// The result of running a subquery once: a forward-only cursor over
// single-column rows plus, when the plan was prepared for random access, an
// on-demand distinct-value index answering exact membership questions.

use std::collections::HashSet;

use crate::catalog::schema::DataType;
use crate::query::executor::result::{DataValue, QueryError, QueryResult, Row};

/// One execution of a subquery
pub trait Probe: Send {
    /// Number of rows the subquery produced
    fn row_count(&self) -> usize;

    /// Declared type of the output column at `index`
    fn column_type(&self, index: usize) -> DataType;

    /// Next row of the forward cursor
    fn next(&mut self) -> QueryResult<Option<Row>>;

    /// Whether a row equal to `values` exists. NULL matches NULL here.
    fn contains_distinct(&mut self, values: &[DataValue]) -> QueryResult<bool>;

    /// Release the result. Further calls fail.
    fn close(&mut self) -> QueryResult<()>;
}

/// Fully materialized subquery result
#[derive(Debug)]
pub struct MaterializedProbe {
    column_types: Vec<DataType>,
    rows: Vec<Row>,
    position: usize,
    random_access: bool,
    distinct: Option<HashSet<Row>>,
    closed: bool,
}

impl MaterializedProbe {
    pub fn new(column_types: Vec<DataType>, rows: Vec<Row>, random_access: bool) -> Self {
        MaterializedProbe {
            column_types,
            rows,
            position: 0,
            random_access,
            distinct: None,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_open(&self) -> QueryResult<()> {
        if self.closed {
            return Err(QueryError::ExecutionError("Subquery result is already closed".to_string()));
        }
        Ok(())
    }
}

impl Probe for MaterializedProbe {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_type(&self, index: usize) -> DataType {
        self.column_types.get(index).copied().unwrap_or(DataType::Null)
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        self.check_open()?;
        let row = self.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }

    fn contains_distinct(&mut self, values: &[DataValue]) -> QueryResult<bool> {
        self.check_open()?;
        if !self.random_access {
            return Err(QueryError::ExecutionError(
                "Distinct lookup requires a random access subquery result".to_string(),
            ));
        }
        let rows = &self.rows;
        let distinct = self.distinct.get_or_insert_with(|| rows.iter().cloned().collect());
        Ok(distinct.contains(values))
    }

    fn close(&mut self) -> QueryResult<()> {
        self.closed = true;
        self.distinct = None;
        Ok(())
    }
}
