// Shared definitions used across the query layer

pub mod settings;
pub mod types;

pub use self::settings::{NullRowPolicy, Settings};
