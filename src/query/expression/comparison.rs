// Comparison Operators
//
// Comparison of two non-null values. Callers bring both operands to a
// common type before calling; NULL handling is the caller's job as well.

use std::cmp::Ordering;
use std::fmt;

use crate::query::executor::result::{DataValue, QueryError, QueryResult};

/// Comparison operators usable in quantified predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equal,
    /// `IS NOT DISTINCT FROM`; identical to `Equal` for non-null operands
    EqualNullSafe,
    NotEqual,
    Smaller,
    SmallerEqual,
    Bigger,
    BiggerEqual,
}

impl CompareOp {
    /// Operators that can be answered by a distinct-value lookup
    pub fn is_equality(&self) -> bool {
        matches!(self, CompareOp::Equal | CompareOp::EqualNullSafe)
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "=" | "==" => Ok(CompareOp::Equal),
            "<=>" => Ok(CompareOp::EqualNullSafe),
            "<>" | "!=" => Ok(CompareOp::NotEqual),
            "<" => Ok(CompareOp::Smaller),
            "<=" => Ok(CompareOp::SmallerEqual),
            ">" => Ok(CompareOp::Bigger),
            ">=" => Ok(CompareOp::BiggerEqual),
            _ => Err(format!("Unknown comparison operator: {}", s)),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Equal => "=",
            CompareOp::EqualNullSafe => "<=>",
            CompareOp::NotEqual => "<>",
            CompareOp::Smaller => "<",
            CompareOp::SmallerEqual => "<=",
            CompareOp::Bigger => ">",
            CompareOp::BiggerEqual => ">=",
        };
        write!(f, "{}", symbol)
    }
}

/// Compare two non-null values with `op`
pub fn compare_not_null(left: &DataValue, right: &DataValue, op: CompareOp) -> QueryResult<bool> {
    debug_assert!(!left.is_null() && !right.is_null(), "compare_not_null called with NULL");

    match op {
        CompareOp::Equal | CompareOp::EqualNullSafe => values_equal(left, right, op),
        CompareOp::NotEqual => values_equal(left, right, op).map(|equal| !equal),
        CompareOp::Smaller => Ok(left.compare(right)? == Ordering::Less),
        CompareOp::SmallerEqual => Ok(left.compare(right)? != Ordering::Greater),
        CompareOp::Bigger => Ok(left.compare(right)? == Ordering::Greater),
        CompareOp::BiggerEqual => Ok(left.compare(right)? != Ordering::Less),
    }
}

fn values_equal(left: &DataValue, right: &DataValue, op: CompareOp) -> QueryResult<bool> {
    match left.partial_cmp(right) {
        Some(ordering) => Ok(ordering == Ordering::Equal),
        // Unordered values of one type (NaN, distinct blobs) are simply unequal
        None if left.get_type() == right.get_type() => Ok(false),
        None => Err(QueryError::TypeMismatch(format!(
            "Cannot compare {} {} {}", left.get_type(), op, right.get_type()
        ))),
    }
}
