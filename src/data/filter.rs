use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use super::infer::{ColumnType, NumericRange};
use super::model::{Dataset, Record, Value};
use crate::error::{Result, SieveError};

// ---------------------------------------------------------------------------
// Condition – the comparison a filter applies
// ---------------------------------------------------------------------------

/// Comparison applied between a row's cell `v` and the filter value `c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    /// No constraint.
    #[default]
    Any,
    /// `text(v) == text(c)`
    Equals,
    /// `text(v) != text(c)`
    NotEqualTo,
    /// `text(c)` occurs in `text(v)`
    Contains,
    /// `number(v) < number(c)`
    LessThan,
    /// `number(v) > number(c)`
    MoreThan,
    /// `text(v)` starts with `text(c)`
    StartsWith,
    /// `text(v)` ends with `text(c)`
    EndsWith,
}

impl Condition {
    pub const ALL: [Condition; 8] = [
        Condition::Any,
        Condition::Equals,
        Condition::NotEqualTo,
        Condition::Contains,
        Condition::LessThan,
        Condition::MoreThan,
        Condition::StartsWith,
        Condition::EndsWith,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Condition::Any => "any",
            Condition::Equals => "equals",
            Condition::NotEqualTo => "not equal to",
            Condition::Contains => "contains",
            Condition::LessThan => "less than",
            Condition::MoreThan => "more than",
            Condition::StartsWith => "starts with",
            Condition::EndsWith => "ends with",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown condition {0:?} (expected one of: any, equals, not equal to, contains, less than, more than, starts with, ends with)")]
pub struct UnknownCondition(pub String);

/// Accepts the labels case-insensitively, with `-` or `_` in place of spaces,
/// plus the operator shorthands `=`, `!=`, `<`, `>`.
impl FromStr for Condition {
    type Err = UnknownCondition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_ascii_lowercase()
            .replace(['-', '_'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "=" | "==" => return Ok(Condition::Equals),
            "!=" => return Ok(Condition::NotEqualTo),
            "<" => return Ok(Condition::LessThan),
            ">" => return Ok(Condition::MoreThan),
            _ => {}
        }

        Condition::ALL
            .into_iter()
            .find(|c| c.label() == normalized)
            .ok_or_else(|| UnknownCondition(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FilterSpec – one column's filter
// ---------------------------------------------------------------------------

/// A new comparison value for a [`FilterSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterInput {
    /// Free-form text, stored as is.
    Text(String),
    /// A slider position; clamped to the column's range when it has one.
    Number(f64),
}

/// Filter state for a single column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSpec {
    pub column: String,
    pub column_type: ColumnType,
    pub condition: Condition,
    pub value: Value,
    /// Observed `[min, max]`, only for numeric columns.
    pub range: Option<NumericRange>,
}

impl FilterSpec {
    /// A no-op spec for `column`, with its type and range taken from the dataset.
    pub fn new(dataset: &Dataset, column: &str) -> Self {
        let column_type = dataset.column_type(column);
        let (value, range) = match column_type {
            ColumnType::String => (Value::String(String::new()), None),
            ColumnType::Int => (
                Value::Integer(0),
                NumericRange::from_values(dataset.column_values(column)),
            ),
            ColumnType::Float => (
                Value::Float(0.0),
                NumericRange::from_values(dataset.column_values(column)),
            ),
        };

        FilterSpec {
            column: column.to_string(),
            column_type,
            condition: Condition::Any,
            value,
            range,
        }
    }

    pub fn set_input(&mut self, input: FilterInput) {
        match input {
            FilterInput::Text(text) => self.value = Value::String(text),
            FilterInput::Number(n) => self.set_number(n),
        }
    }

    /// Store a numeric value, clamped into the column's range. Int columns
    /// round to the nearest integer.
    pub fn set_number(&mut self, n: f64) {
        let n = match &self.range {
            Some(range) => range.clamp(n),
            None => n,
        };
        self.value = match self.column_type {
            ColumnType::Int => Value::Integer(n.round() as i64),
            ColumnType::Float | ColumnType::String => Value::Float(n),
        };
    }

    pub fn is_active(&self) -> bool {
        self.condition != Condition::Any
    }

    /// Test a single cell. `row` is only used to report coercion failures.
    pub fn matches(&self, cell: &Value, row: usize) -> Result<bool> {
        let matched = match self.condition {
            Condition::Any => true,
            Condition::Equals => cell.to_string() == self.value.to_string(),
            Condition::NotEqualTo => cell.to_string() != self.value.to_string(),
            Condition::Contains => cell.to_string().contains(&self.value.to_string()),
            Condition::StartsWith => cell.to_string().starts_with(&self.value.to_string()),
            Condition::EndsWith => cell.to_string().ends_with(&self.value.to_string()),
            Condition::LessThan => self.number(cell, row)? < self.number(&self.value, row)?,
            Condition::MoreThan => self.number(cell, row)? > self.number(&self.value, row)?,
        };
        Ok(matched)
    }

    fn number(&self, v: &Value, row: usize) -> Result<f64> {
        v.as_f64().ok_or_else(|| SieveError::NumericCoercion {
            column: self.column.clone(),
            row,
            value: v.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// FilterSet – one spec per column
// ---------------------------------------------------------------------------

/// Every column's filter, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    specs: Vec<FilterSpec>,
}

impl FilterSet {
    /// One `Any` spec per dataset column.
    pub fn for_dataset(dataset: &Dataset) -> Self {
        FilterSet {
            specs: dataset
                .column_names
                .iter()
                .map(|col| FilterSpec::new(dataset, col))
                .collect(),
        }
    }

    pub fn specs(&self) -> &[FilterSpec] {
        &self.specs
    }

    pub fn get(&self, column: &str) -> Option<&FilterSpec> {
        self.specs.iter().find(|s| s.column == column)
    }

    pub fn get_mut(&mut self, column: &str) -> Option<&mut FilterSpec> {
        self.specs.iter_mut().find(|s| s.column == column)
    }

    /// Set `column`'s condition and value.
    pub fn update(&mut self, column: &str, condition: Condition, input: FilterInput) -> Result<()> {
        let spec = self.get_mut(column).ok_or_else(|| SieveError::UnknownColumn {
            column: column.to_string(),
        })?;
        spec.condition = condition;
        spec.set_input(input);
        Ok(())
    }

    /// Put every spec back to `Any`, keeping the values.
    pub fn clear(&mut self) {
        for spec in &mut self.specs {
            spec.condition = Condition::Any;
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &FilterSpec> {
        self.specs.iter().filter(|s| s.is_active())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Return indices of rows that pass every filter, in row-store order.
///
/// Each call starts over from the full row store. A numeric comparison that
/// cannot read its operands aborts the whole pass.
pub fn filtered_indices(dataset: &Dataset, filters: &FilterSet) -> Result<Vec<usize>> {
    let active: Vec<&FilterSpec> = filters.active().collect();
    let mut visible = Vec::new();

    'rows: for (i, record) in dataset.records.iter().enumerate() {
        for spec in &active {
            if !spec.matches(record.get(&spec.column), i)? {
                continue 'rows;
            }
        }
        visible.push(i);
    }

    log::debug!(
        "filter pass: {} active filters, {}/{} rows visible",
        active.len(),
        visible.len(),
        dataset.len()
    );
    Ok(visible)
}

/// Same as [`filtered_indices`], resolved to the rows themselves.
pub fn evaluate<'a>(dataset: &'a Dataset, filters: &FilterSet) -> Result<Vec<&'a Record>> {
    Ok(filtered_indices(dataset, filters)?
        .into_iter()
        .map(|i| &dataset.records[i])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::format::Format;
    use crate::data::loader::load_bytes;

    fn people() -> Dataset {
        load_bytes(
            br#"[{"age":30,"city":"Oslo"},{"age":17,"city":"Linz"},{"age":25,"city":"Lisbon"}]"#,
            Format::Json,
        )
        .unwrap()
    }

    fn text(s: &str) -> FilterInput {
        FilterInput::Text(s.to_string())
    }

    #[test]
    fn parses_condition_spellings() {
        assert_eq!("more than".parse::<Condition>().unwrap(), Condition::MoreThan);
        assert_eq!("More-Than".parse::<Condition>().unwrap(), Condition::MoreThan);
        assert_eq!("not_equal_to".parse::<Condition>().unwrap(), Condition::NotEqualTo);
        assert_eq!(">".parse::<Condition>().unwrap(), Condition::MoreThan);
        assert!("between".parse::<Condition>().is_err());
    }

    #[test]
    fn every_column_gets_a_noop_spec() {
        let ds = people();
        let filters = FilterSet::for_dataset(&ds);
        assert_eq!(filters.len(), 2);
        assert!(filters.active().next().is_none());

        let age = filters.get("age").unwrap();
        assert_eq!(age.column_type, ColumnType::Int);
        assert_eq!(age.range, Some(NumericRange { min: 17.0, max: 30.0 }));
        assert_eq!(age.value, Value::Integer(0));

        let city = filters.get("city").unwrap();
        assert_eq!(city.range, None);
        assert_eq!(city.value, Value::from(""));
    }

    #[test]
    fn all_any_returns_every_row() {
        let ds = people();
        let filters = FilterSet::for_dataset(&ds);
        assert_eq!(filtered_indices(&ds, &filters).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn more_than_on_int_column() {
        let ds = people();
        let mut filters = FilterSet::for_dataset(&ds);
        filters.update("age", Condition::MoreThan, text("18")).unwrap();
        assert_eq!(filtered_indices(&ds, &filters).unwrap(), vec![0, 2]);
    }

    #[test]
    fn string_conditions() {
        let ds = people();
        let mut filters = FilterSet::for_dataset(&ds);

        filters.update("city", Condition::StartsWith, text("Li")).unwrap();
        assert_eq!(filtered_indices(&ds, &filters).unwrap(), vec![1, 2]);

        filters.update("city", Condition::EndsWith, text("o")).unwrap();
        assert_eq!(filtered_indices(&ds, &filters).unwrap(), vec![0]);

        filters.update("city", Condition::Contains, text("s")).unwrap();
        assert_eq!(filtered_indices(&ds, &filters).unwrap(), vec![0, 2]);

        filters.update("city", Condition::NotEqualTo, text("Linz")).unwrap();
        assert_eq!(filtered_indices(&ds, &filters).unwrap(), vec![0, 2]);
    }

    #[test]
    fn equals_works_on_numeric_columns_through_text() {
        let ds = people();
        let mut filters = FilterSet::for_dataset(&ds);
        filters.update("age", Condition::Equals, text("17")).unwrap();
        assert_eq!(filtered_indices(&ds, &filters).unwrap(), vec![1]);
    }

    #[test]
    fn filters_combine_with_and() {
        let ds = people();
        let mut filters = FilterSet::for_dataset(&ds);
        filters.update("age", Condition::LessThan, text("28")).unwrap();
        filters.update("city", Condition::StartsWith, text("Lis")).unwrap();
        assert_eq!(filtered_indices(&ds, &filters).unwrap(), vec![2]);
    }

    #[test]
    fn slider_value_is_clamped_and_rounded() {
        let ds = people();
        let mut filters = FilterSet::for_dataset(&ds);
        filters
            .update("age", Condition::MoreThan, FilterInput::Number(3.0))
            .unwrap();
        assert_eq!(filters.get("age").unwrap().value, Value::Integer(17));

        filters
            .update("age", Condition::MoreThan, FilterInput::Number(24.6))
            .unwrap();
        assert_eq!(filters.get("age").unwrap().value, Value::Integer(25));
        assert_eq!(filtered_indices(&ds, &filters).unwrap(), vec![0]);
    }

    #[test]
    fn non_numeric_operand_aborts_the_pass() {
        let ds = people();
        let mut filters = FilterSet::for_dataset(&ds);
        filters.update("city", Condition::LessThan, text("5")).unwrap();
        let err = filtered_indices(&ds, &filters).unwrap_err();
        assert!(matches!(
            err,
            SieveError::NumericCoercion { ref column, row: 0, ref value }
                if column == "city" && value == "Oslo"
        ));

        filters.update("city", Condition::Any, text("")).unwrap();
        filters.update("age", Condition::MoreThan, text("")).unwrap();
        assert!(matches!(
            filtered_indices(&ds, &filters),
            Err(SieveError::NumericCoercion { .. })
        ));
    }

    #[test]
    fn missing_cell_fails_numeric_comparison() {
        let ds = load_bytes(br#"[{"n":1},{"m":2}]"#, Format::Json).unwrap();
        let mut filters = FilterSet::for_dataset(&ds);
        filters.update("n", Condition::MoreThan, text("0")).unwrap();
        assert!(matches!(
            filtered_indices(&ds, &filters),
            Err(SieveError::NumericCoercion { row: 1, .. })
        ));
    }

    #[test]
    fn unknown_column_is_rejected() {
        let ds = people();
        let mut filters = FilterSet::for_dataset(&ds);
        let err = filters.update("zip", Condition::Equals, text("1")).unwrap_err();
        assert!(matches!(err, SieveError::UnknownColumn { .. }));
    }

    #[test]
    fn evaluate_returns_references_in_order() {
        let ds = people();
        let mut filters = FilterSet::for_dataset(&ds);
        filters.update("city", Condition::StartsWith, text("L")).unwrap();
        let rows = evaluate(&ds, &filters).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(std::ptr::eq(rows[0], &ds.records[1]));
        assert!(std::ptr::eq(rows[1], &ds.records[2]));
    }
}
