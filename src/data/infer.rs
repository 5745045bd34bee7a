use std::fmt;

use serde::Serialize;

use super::model::Value;

// ---------------------------------------------------------------------------
// Column types
// ---------------------------------------------------------------------------

/// Semantic type of a column, fixed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Int,
    Float,
}

impl ColumnType {
    /// Numeric columns get a range-bounded comparison value.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::String => write!(f, "string"),
            ColumnType::Int => write!(f, "int"),
            ColumnType::Float => write!(f, "float"),
        }
    }
}

/// Classify a column from its observed values.
///
/// The all-strings test runs first and wins outright, so text that happens to
/// look numeric (every CSV column) stays `String`. An empty column is also
/// `String`. Only genuine numbers make a column `Int` or `Float`; anything
/// mixed falls back to `String`.
pub fn infer_column_type<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
    let values: Vec<&Value> = values.into_iter().collect();

    if values.iter().all(|v| matches!(v, Value::String(_))) {
        return ColumnType::String;
    }
    if values.iter().all(|v| v.is_numeric()) {
        if values.iter().all(|v| matches!(v, Value::Integer(_))) {
            return ColumnType::Int;
        }
        return ColumnType::Float;
    }
    ColumnType::String
}

// ---------------------------------------------------------------------------
// Numeric range
// ---------------------------------------------------------------------------

/// Closed `[min, max]` interval of a numeric column's observed values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    /// Range over every value that reads as a number. Empty strings and
    /// non-numeric cells are skipped; `None` if nothing is left.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<NumericRange> {
        values
            .into_iter()
            .filter(|v| !matches!(v, Value::String(s) if s.is_empty()))
            .filter_map(Value::as_f64)
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some(NumericRange { min: v, max: v }),
                Some(r) => Some(NumericRange {
                    min: r.min.min(v),
                    max: r.max.max(v),
                }),
            })
    }

    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.min, self.max)
    }
}
