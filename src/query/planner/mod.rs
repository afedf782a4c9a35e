// Query Planner Module
//
// Planner-side collaborators of expressions: nested subquery plans and the
// table filters that receive pushed-down index conditions.

pub mod subquery;
pub mod table_filter;

pub use self::subquery::{share, SharedSubquery, SubqueryPlan, ValuesSubquery};
pub use self::table_filter::{IndexCondition, TableFilter};
