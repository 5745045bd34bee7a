use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;

use super::infer::{infer_column_type, ColumnType};

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
///
/// CSV cells are always `String`. JSON cells keep their native scalar type.
/// An explicit JSON `null` is `Null`, an observed value; a field missing from
/// a row is `Absent`. Neither equals the empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
    Absent,
}

static ABSENT: Value = Value::Absent;

impl Value {
    /// Convert a parsed JSON value. Nested arrays/objects are kept as their
    /// JSON text.
    pub fn from_json(val: &JsonValue) -> Value {
        match val {
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::String(n.to_string())
                }
            }
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Null => Value::Null,
            other => Value::String(other.to_string()),
        }
    }

    /// Whether the value is a JSON number (strings never count, even if they
    /// look numeric).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Numeric coercion used by `less than` / `more than` and numeric sorting.
    /// Strings are parsed after trimming surrounding whitespace.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(v) => Some(*v),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(_) | Value::Null | Value::Absent => None,
        }
    }
}

/// Canonical text form used by every string condition and by CSV export.
/// Floats always carry a fractional part (`3.0`, not `3`) so they never read
/// back as integers.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{v:.1}")
            }
            Value::Float(v) if v.is_finite() && v.abs() >= 1e16 => write_exponent(f, *v),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null | Value::Absent => Ok(()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::Bool(b) => serializer.serialize_bool(*b),
            // JSON has no NaN/inf; they go out as null like missing cells.
            Value::Float(_) | Value::Null | Value::Absent => serializer.serialize_none(),
        }
    }
}

/// `1e+20`, `-2.5e+16`: large whole floats in exponent form, so the text
/// never reads back as an integer.
fn write_exponent(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    let text = format!("{v:e}");
    match text.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(rest) => ('-', rest),
                None => ('+', exp),
            };
            write!(f, "{mantissa}e{sign}{digits:0>2}")
        }
        None => write!(f, "{text}"),
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

// ---------------------------------------------------------------------------
// Record – one row
// ---------------------------------------------------------------------------

/// One row: column name → value, in the order the fields were read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, keeping its position if it already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Look up a field; missing fields read as [`Value::Absent`].
    pub fn get(&self, column: &str) -> &Value {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
            .unwrap_or(&ABSENT)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == column)
    }

    /// Field names in row order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, v)| (name.as_str(), v))
    }

    /// Keep only the fields whose name satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.fields.retain(|(name, _)| keep(name));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The loaded row store plus its fixed schema.
///
/// Column types are inferred once in [`Dataset::new`] and never change.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All rows, in source order.
    pub records: Vec<Record>,
    /// Column names in source order (first object's keys, or the CSV header).
    pub column_names: Vec<String>,
    /// Inferred type per column.
    pub column_types: BTreeMap<String, ColumnType>,
}

impl Dataset {
    /// Build the dataset and infer every column's type.
    pub fn new(records: Vec<Record>, column_names: Vec<String>) -> Self {
        let column_types = column_names
            .iter()
            .map(|col| {
                let ty = infer_column_type(observed_values(&records, col));
                log::debug!("column {col:?} inferred as {ty}");
                (col.clone(), ty)
            })
            .collect();

        Dataset {
            records,
            column_names,
            column_types,
        }
    }

    /// Values actually present in `column` (missing fields skipped, nulls kept).
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        observed_values(&self.records, column)
    }

    /// Inferred type of `column`; unknown columns read as `String`.
    pub fn column_type(&self, column: &str) -> ColumnType {
        self.column_types
            .get(column)
            .copied()
            .unwrap_or(ColumnType::String)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn observed_values<'a>(records: &'a [Record], column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    records
        .iter()
        .map(move |r| r.get(column))
        .filter(|v| !v.is_absent())
}
