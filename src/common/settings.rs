// Optimizer Settings
//
// Flags that switch membership-predicate optimizations on and off. They are
// passed explicitly to `try_push_index_condition` and carried by
// the execution context for `evaluate`.

use serde::{Deserialize, Serialize};

use crate::query::executor::result::{QueryError, QueryResult, Truth};

/// How the correlated-scan strategy reports an unproven result when the
/// subquery produced at least one NULL row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NullRowPolicy {
    /// Any FALSE outcome becomes UNKNOWN once a NULL row has been seen,
    /// including an ALL comparison that found a non-null counterexample.
    #[default]
    DemoteToUnknown,
    /// An ALL comparison that stopped on a non-null counterexample stays
    /// FALSE. An exhausted ANY/IN scan with a NULL row is still UNKNOWN.
    CertifyCounterexample,
}

impl NullRowPolicy {
    /// Final truth value of a scan that ended with `result` after having
    /// seen (or not) a NULL row.
    pub fn resolve(self, all: bool, result: bool, saw_null: bool) -> Truth {
        if result || !saw_null {
            return Truth::from(result);
        }
        match self {
            NullRowPolicy::DemoteToUnknown => Truth::Unknown,
            NullRowPolicy::CertifyCounterexample if all => Truth::False,
            NullRowPolicy::CertifyCounterexample => Truth::Unknown,
        }
    }

    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "DEMOTE" | "DEMOTE_TO_UNKNOWN" => Ok(NullRowPolicy::DemoteToUnknown),
            "CERTIFY" | "CERTIFY_COUNTEREXAMPLE" => Ok(NullRowPolicy::CertifyCounterexample),
            _ => Err(format!("Unknown null row policy: {}", s)),
        }
    }
}

/// Optimizer configuration consumed by the membership predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Use the distinct-index lookup for `IN` / `= ANY` when possible
    pub optimize_in_select: bool,

    /// Allow `column IN (subquery)` to become an index condition
    pub optimize_in_list: bool,

    /// Outcome of a correlated scan that saw NULL rows
    pub null_row_policy: NullRowPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            optimize_in_select: true,
            optimize_in_list: true,
            null_row_policy: NullRowPolicy::default(),
        }
    }
}

impl Settings {
    /// Build settings from `KEY=value` style pairs, starting from the
    /// defaults. Keys are case-insensitive.
    pub fn from_pairs<'a, I>(pairs: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut settings = Settings::default();
        for (key, value) in pairs {
            match key.to_uppercase().as_str() {
                "OPTIMIZE_IN_SELECT" => settings.optimize_in_select = parse_flag(key, value)?,
                "OPTIMIZE_IN_LIST" => settings.optimize_in_list = parse_flag(key, value)?,
                "NULL_ROW_POLICY" => {
                    settings.null_row_policy = NullRowPolicy::from_str(value)
                        .map_err(QueryError::InvalidOperation)?;
                }
                _ => {
                    return Err(QueryError::InvalidOperation(format!(
                        "Unsupported setting: {}",
                        key
                    )))
                }
            }
        }
        Ok(settings)
    }
}

fn parse_flag(key: &str, value: &str) -> QueryResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(QueryError::InvalidOperation(format!(
            "Setting {} expects a boolean, got '{}'",
            key, value
        ))),
    }
}
