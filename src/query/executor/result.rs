// Values, Truth and Errors
//
// This module defines the scalar value model, the three-valued truth type
// predicates produce, and the error type of the query layer.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::catalog::schema::DataType;

/// A single scalar value. `Null` is the SQL null marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Date(String),
    Timestamp(String),
    Blob(Vec<u8>),
}

impl Eq for DataValue {}

impl Hash for DataValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            DataValue::Null => 0.hash(state),
            DataValue::Integer(i) => { 1.hash(state); i.hash(state); }
            DataValue::Float(f) => { 2.hash(state); canonical_float_bits(*f).hash(state); }
            DataValue::Text(s) => { 3.hash(state); s.hash(state); }
            DataValue::Boolean(b) => { 4.hash(state); b.hash(state); }
            DataValue::Date(s) => { 5.hash(state); s.hash(state); }
            DataValue::Timestamp(s) => { 6.hash(state); s.hash(state); }
            DataValue::Blob(b) => { 7.hash(state); b.hash(state); }
        }
    }
}

// 0.0 and -0.0 compare equal and must hash alike; NaNs share one payload
fn canonical_float_bits(f: f64) -> u64 {
    if f == 0.0 {
        0.0f64.to_bits()
    } else if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sql_literal())
    }
}

impl PartialOrd for DataValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (DataValue::Null, DataValue::Null) => Some(Ordering::Equal),
            (DataValue::Null, _) => Some(Ordering::Less),
            (_, DataValue::Null) => Some(Ordering::Greater),

            (DataValue::Integer(a), DataValue::Integer(b)) => a.partial_cmp(b),
            (DataValue::Float(a), DataValue::Float(b)) => a.partial_cmp(b),
            (DataValue::Integer(a), DataValue::Float(b)) => (*a as f64).partial_cmp(b),
            (DataValue::Float(a), DataValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (DataValue::Text(a), DataValue::Text(b)) => Some(a.cmp(b)),
            (DataValue::Boolean(a), DataValue::Boolean(b)) => a.partial_cmp(b),
            (DataValue::Date(a), DataValue::Date(b)) => Some(a.cmp(b)),
            (DataValue::Timestamp(a), DataValue::Timestamp(b)) => Some(a.cmp(b)),
            // Blobs only support equality
            (DataValue::Blob(a), DataValue::Blob(b)) if a == b => Some(Ordering::Equal),

            (DataValue::Date(a), DataValue::Timestamp(b)) => Some(a.as_str().cmp(b.split(' ').next().unwrap_or(""))),
            (DataValue::Timestamp(a), DataValue::Date(b)) => Some(a.split(' ').next().unwrap_or("").cmp(b.as_str())),

            _ => None,
        }
    }
}

impl DataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// The type a value of this variant naturally has
    pub fn get_type(&self) -> DataType {
        match self {
            DataValue::Null => DataType::Null,
            DataValue::Integer(_) => DataType::Integer,
            DataValue::Float(_) => DataType::Float,
            DataValue::Text(_) => DataType::Text,
            DataValue::Boolean(_) => DataType::Boolean,
            DataValue::Date(_) => DataType::Date,
            DataValue::Timestamp(_) => DataType::Timestamp,
            DataValue::Blob(_) => DataType::Blob,
        }
    }

    /// Compare two non-null values. Fails for types without a common ordering.
    pub fn compare(&self, other: &Self) -> QueryResult<Ordering> {
        self.partial_cmp(other).ok_or_else(||
            QueryError::TypeMismatch(format!("Cannot compare incompatible types: {} and {}", self.get_type(), other.get_type()))
        )
    }

    pub fn to_sql_literal(&self) -> String {
        match self {
            DataValue::Null => "NULL".to_string(),
            DataValue::Integer(i) => i.to_string(),
            DataValue::Float(f) => f.to_string(),
            DataValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            DataValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            DataValue::Date(s) => format!("DATE '{}'", s),
            DataValue::Timestamp(s) => format!("TIMESTAMP '{}'", s),
            DataValue::Blob(b) => format!("X'{}'", hex::encode(b)),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// A row of a subquery result. Membership subqueries always produce
/// exactly one value per row.
pub type Row = Vec<DataValue>;

/// SQL three-valued logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl From<bool> for Truth {
    fn from(b: bool) -> Self {
        if b { Truth::True } else { Truth::False }
    }
}

impl From<Truth> for DataValue {
    fn from(truth: Truth) -> Self {
        match truth {
            Truth::True => DataValue::Boolean(true),
            Truth::False => DataValue::Boolean(false),
            Truth::Unknown => DataValue::Null,
        }
    }
}

impl TryFrom<&DataValue> for Truth {
    type Error = QueryError;

    fn try_from(value: &DataValue) -> QueryResult<Self> {
        match value {
            DataValue::Boolean(b) => Ok(Truth::from(*b)),
            DataValue::Null => Ok(Truth::Unknown),
            other => Err(QueryError::TypeMismatch(format!("Expected a boolean, got {}", other.get_type()))),
        }
    }
}

impl fmt::Display for Truth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Truth::True => write!(f, "TRUE"),
            Truth::False => write!(f, "FALSE"),
            Truth::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Represents query errors
#[derive(Error, Debug)]
pub enum QueryError {
    /// A membership subquery projects a column count other than one
    #[error("Subquery must return exactly one column, got {0}")]
    SubqueryNotSingleColumn(usize),
    /// A value could not be converted to a declared column type
    #[error("Cannot convert {value} to {target}")]
    TypeConversion {
        value: String,
        target: DataType,
    },
    /// Two values have no common ordering
    #[error("Type error: {0}")]
    TypeMismatch(String),
    /// Error during query execution
    #[error("Execution error: {0}")]
    ExecutionError(String),
    /// Error during query planning phase
    #[error("Planning error: {0}")]
    PlanningError(String),
    /// Column not found
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    /// Numeric overflow
    #[error("Numeric overflow")]
    NumericOverflow,
    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
