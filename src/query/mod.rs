// Query Processing Module
//
// Expressions, the execution-time support they need, and the planner-side
// pieces (subquery plans, table filters) they cooperate with.

pub mod executor;
pub mod expression;
pub mod planner;

pub use executor::result::{DataValue, QueryError, QueryResult, Truth};
pub use expression::InSubqueryCondition;
