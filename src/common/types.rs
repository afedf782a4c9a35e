/// Identifier of a table filter (one table occurrence in a FROM list)
pub type FilterId = u32;

/// Nesting level of a query block. The outermost query is level 0, and a
/// subquery is bound one level deeper than the expression that contains it.
pub type QueryLevel = usize;

/// Identifier handed out by the execution-scoped resource registry
pub type ResourceId = u64;

/// Relative cost unit used by expression cost estimates
pub type Cost = u32;
