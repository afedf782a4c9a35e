// Value Conversion
//
// Declared-type-aware conversion of values. The membership predicate uses it
// to bring the left operand into the subquery column's type before any
// comparison or distinct lookup.

use crate::catalog::schema::DataType;
use crate::query::executor::result::{DataValue, QueryError, QueryResult};

/// Convert `value` to `target_type`. NULL converts to NULL for every target.
pub fn convert_to_type(value: DataValue, target_type: &DataType) -> QueryResult<DataValue> {
    match (value, target_type) {
        (DataValue::Null, _) => Ok(DataValue::Null),

        (v @ DataValue::Integer(_), DataType::Integer) |
        (v @ DataValue::Float(_), DataType::Float) |
        (v @ DataValue::Text(_), DataType::Text) |
        (v @ DataValue::Boolean(_), DataType::Boolean) |
        (v @ DataValue::Date(_), DataType::Date) |
        (v @ DataValue::Timestamp(_), DataType::Timestamp) |
        (v @ DataValue::Blob(_), DataType::Blob) => Ok(v),

        (DataValue::Integer(i), DataType::Float) => Ok(DataValue::Float(i as f64)),
        (DataValue::Integer(i), DataType::Text) => Ok(DataValue::Text(i.to_string())),
        (DataValue::Integer(i), DataType::Boolean) => Ok(DataValue::Boolean(i != 0)),

        (DataValue::Float(f), DataType::Integer) => {
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                Ok(DataValue::Integer(f as i64))
            } else {
                Err(conversion_error(&DataValue::Float(f), target_type))
            }
        }
        (DataValue::Float(f), DataType::Text) => Ok(DataValue::Text(f.to_string())),
        (DataValue::Float(f), DataType::Boolean) => Ok(DataValue::Boolean(f != 0.0)),

        (DataValue::Text(s), DataType::Integer) => match s.trim().parse::<i64>() {
            Ok(i) => Ok(DataValue::Integer(i)),
            Err(_) => Err(conversion_error(&DataValue::Text(s), target_type)),
        },
        (DataValue::Text(s), DataType::Float) => match s.trim().parse::<f64>() {
            Ok(f) => Ok(DataValue::Float(f)),
            Err(_) => Err(conversion_error(&DataValue::Text(s), target_type)),
        },
        (DataValue::Text(s), DataType::Boolean) => match s.to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Ok(DataValue::Boolean(true)),
            "false" | "f" | "no" | "n" | "0" => Ok(DataValue::Boolean(false)),
            _ => Err(conversion_error(&DataValue::Text(s), target_type)),
        },
        (DataValue::Text(s), DataType::Date) => {
            if s.len() == 10 && s.matches('-').count() == 2 {
                Ok(DataValue::Date(s))
            } else {
                Err(conversion_error(&DataValue::Text(s), target_type))
            }
        }
        (DataValue::Text(s), DataType::Timestamp) => {
            if s.contains('-') && s.contains(':') {
                Ok(DataValue::Timestamp(s))
            } else {
                Err(conversion_error(&DataValue::Text(s), target_type))
            }
        }
        (DataValue::Text(s), DataType::Blob) => match hex::decode(&s) {
            Ok(bytes) => Ok(DataValue::Blob(bytes)),
            Err(_) => Err(conversion_error(&DataValue::Text(s), target_type)),
        },

        (DataValue::Boolean(b), DataType::Integer) => Ok(DataValue::Integer(if b { 1 } else { 0 })),
        (DataValue::Boolean(b), DataType::Float) => Ok(DataValue::Float(if b { 1.0 } else { 0.0 })),
        (DataValue::Boolean(b), DataType::Text) => Ok(DataValue::Text(b.to_string())),

        (DataValue::Date(d), DataType::Text) => Ok(DataValue::Text(d)),
        (DataValue::Date(d), DataType::Timestamp) => Ok(DataValue::Timestamp(format!("{} 00:00:00", d))),

        (DataValue::Timestamp(ts), DataType::Text) => Ok(DataValue::Text(ts)),
        (DataValue::Timestamp(ts), DataType::Date) => {
            Ok(DataValue::Date(ts.split(' ').next().unwrap_or_default().to_string()))
        }

        (DataValue::Blob(b), DataType::Text) => Ok(DataValue::Text(hex::encode(b))),

        (actual, expected) => Err(conversion_error(&actual, expected)),
    }
}

fn conversion_error(value: &DataValue, target: &DataType) -> QueryError {
    QueryError::TypeConversion {
        value: value.to_sql_literal(),
        target: *target,
    }
}
