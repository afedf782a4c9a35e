// Query Executor Module
//
// Execution-time state: values and errors, the per-statement context with
// its resource registry, and subquery result probes.

pub mod context;
pub mod probe;
pub mod result;

pub use self::context::{ExecutionContext, ResourceRegistry, ScopedProbe};
pub use self::probe::{MaterializedProbe, Probe};
pub use self::result::{DataValue, QueryError, QueryResult, Row, Truth};
