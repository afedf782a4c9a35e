// Column Types
//
// Declared types of subquery output columns and table columns.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Data types supported by the query layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Type of a column that never produces a value (e.g. `SELECT NULL`)
    Null,
    Integer,
    Float,
    Text,
    Boolean,
    Date,
    Timestamp,
    Blob,
}

impl DataType {
    /// Convert a string representation to a DataType
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "NULL" => Ok(DataType::Null),
            "INT" | "INTEGER" | "BIGINT" => Ok(DataType::Integer),
            "FLOAT" | "REAL" | "DOUBLE" => Ok(DataType::Float),
            "TEXT" | "VARCHAR" | "CHAR" | "STRING" => Ok(DataType::Text),
            "BOOL" | "BOOLEAN" => Ok(DataType::Boolean),
            "DATE" => Ok(DataType::Date),
            "TIMESTAMP" | "DATETIME" => Ok(DataType::Timestamp),
            "BLOB" | "BINARY" => Ok(DataType::Blob),
            _ => Err(format!("Unknown data type: {}", s)),
        }
    }

    /// Integer and Float compare with each other without conversion
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Null => "NULL",
            DataType::Integer => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Text => "TEXT",
            DataType::Boolean => "BOOLEAN",
            DataType::Date => "DATE",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Blob => "BLOB",
        };
        write!(f, "{}", name)
    }
}
