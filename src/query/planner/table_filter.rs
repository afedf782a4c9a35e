// Table Filter
//
// One table occurrence in a FROM list. It resolves column names during
// binding and collects index conditions pushed down by predicates, which the
// access layer uses to restrict the rows it reads.

use std::collections::HashSet;
use std::fmt;

use crate::catalog::convert::convert_to_type;
use crate::catalog::schema::DataType;
use crate::common::types::FilterId;
use crate::query::executor::context::ExecutionContext;
use crate::query::executor::result::{DataValue, QueryResult, Row};
use crate::query::expression::ColumnResolver;
use crate::query::planner::subquery::SharedSubquery;

/// A restriction the access layer can evaluate instead of a full scan
#[derive(Debug, Clone)]
pub enum IndexCondition {
    /// `column IN (subquery)`: the subquery result is a multi-point probe set
    InQuery {
        column_index: usize,
        column_name: String,
        query: SharedSubquery,
    },
}

impl IndexCondition {
    pub fn in_query(column_index: usize, column_name: &str, query: SharedSubquery) -> Self {
        IndexCondition::InQuery {
            column_index,
            column_name: column_name.to_string(),
            query,
        }
    }

    pub fn column_index(&self) -> usize {
        match self {
            IndexCondition::InQuery { column_index, .. } => *column_index,
        }
    }

    /// Run the subquery and return its distinct non-null values in first-seen
    /// order. NULL never matches an index lookup, so it is left out.
    pub fn probe_values(&self, ctx: &ExecutionContext) -> QueryResult<Vec<DataValue>> {
        let IndexCondition::InQuery { query, .. } = self;
        let probe = query.read().run(ctx)?;
        let mut rows = ctx.registry().register_probe(probe, "IN index condition");

        let mut seen = HashSet::new();
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            let Some(value) = row.into_iter().next() else {
                continue;
            };
            if !value.is_null() && seen.insert(value.clone()) {
                values.push(value);
            }
        }
        Ok(values)
    }
}

impl fmt::Display for IndexCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexCondition::InQuery { column_name, query, .. } => {
                write!(f, "{} IN({})", column_name, query.read().plan_sql())
            }
        }
    }
}

/// A table in the FROM list, identified by `id`
#[derive(Debug)]
pub struct TableFilter {
    id: FilterId,
    alias: String,
    columns: Vec<(String, DataType)>,
    index_conditions: Vec<IndexCondition>,
}

impl TableFilter {
    pub fn new(id: FilterId, alias: &str, columns: Vec<(String, DataType)>) -> Self {
        TableFilter {
            id,
            alias: alias.to_string(),
            columns,
            index_conditions: Vec::new(),
        }
    }

    pub fn id(&self) -> FilterId {
        self.id
    }

    pub fn add_index_condition(&mut self, condition: IndexCondition) {
        self.index_conditions.push(condition);
    }

    pub fn index_conditions(&self) -> &[IndexCondition] {
        &self.index_conditions
    }

    /// Keep the rows that satisfy every index condition. Probe values are
    /// converted to the indexed column's type before lookup.
    pub fn restrict(&self, rows: Vec<Row>, ctx: &ExecutionContext) -> QueryResult<Vec<Row>> {
        let mut rows = rows;
        for condition in &self.index_conditions {
            let column_index = condition.column_index();
            let data_type = self
                .columns
                .get(column_index)
                .map(|(_, data_type)| *data_type)
                .unwrap_or(DataType::Null);
            let mut keys = HashSet::new();
            for value in condition.probe_values(ctx)? {
                keys.insert(convert_to_type(value, &data_type)?);
            }
            rows.retain(|row| row.get(column_index).is_some_and(|v| !v.is_null() && keys.contains(v)));
        }
        Ok(rows)
    }
}

impl ColumnResolver for TableFilter {
    fn filter_id(&self) -> FilterId {
        self.id
    }

    fn table_alias(&self) -> &str {
        &self.alias
    }

    fn find_column(&self, name: &str) -> Option<(usize, DataType)> {
        self.columns
            .iter()
            .position(|(column, _)| column.eq_ignore_ascii_case(name))
            .map(|index| (index, self.columns[index].1))
    }
}
