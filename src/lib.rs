// insubquery: quantified subquery predicates for a SQL engine
//
// Evaluates `x IN (subquery)`, `x <op> ANY (subquery)` and
// `x <op> ALL (subquery)` with SQL three-valued logic, and pushes
// `column IN (subquery)` down to table filters as an index condition.

pub mod catalog;
pub mod common;
pub mod query;

// Re-export key items for convenient access
pub use catalog::DataType;
pub use common::{NullRowPolicy, Settings};
pub use query::executor::{ExecutionContext, ResourceRegistry};
pub use query::expression::{CompareOp, ScalarExpr};
pub use query::planner::{share, SubqueryPlan, TableFilter, ValuesSubquery};
pub use query::{DataValue, InSubqueryCondition, QueryError, QueryResult, Truth};
