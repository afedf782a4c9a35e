//! Catalog Module
//!
//! Column types and the conversions between them.

pub mod convert;
pub mod schema;

pub use self::convert::convert_to_type;
pub use self::schema::DataType;
