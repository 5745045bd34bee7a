use std::cmp::Ordering;

use serde::Serialize;

use super::model::{Dataset, Record, Value};
use crate::error::{Result, SieveError};

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Which column to sort the result by, and in which direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub column: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        SortOrder {
            column: column.into(),
            direction,
        }
    }
}

/// Sort key of one cell. Numbers order before text.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
}

impl SortKey {
    /// On numeric columns a cell that does not read as a number keeps its raw
    /// text instead of failing the sort.
    fn of(value: &Value, numeric: bool) -> SortKey {
        if numeric {
            if let Some(n) = value.as_f64() {
                return SortKey::Number(n);
            }
        }
        SortKey::Text(value.to_string())
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
        }
    }
}

/// Reorder `rows` in place by `order`. With no order the rows are untouched.
///
/// Int and float columns compare numerically, everything else by canonical
/// text. The sort is stable in both directions.
pub fn sort_rows(dataset: &Dataset, rows: &mut [&Record], order: Option<&SortOrder>) -> Result<()> {
    let Some(order) = order else {
        return Ok(());
    };
    if !dataset.column_names.contains(&order.column) {
        return Err(SieveError::UnknownColumn {
            column: order.column.clone(),
        });
    }

    let numeric = dataset.column_type(&order.column).is_numeric();
    let mut keyed: Vec<(SortKey, &Record)> = rows
        .iter()
        .map(|r| (SortKey::of(r.get(&order.column), numeric), *r))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match order.direction {
        SortDirection::Ascending => a.cmp(b),
        SortDirection::Descending => b.cmp(a),
    });

    for (slot, (_, record)) in rows.iter_mut().zip(keyed) {
        *slot = record;
    }
    log::debug!(
        "sorted {} rows by {:?} ({:?})",
        rows.len(),
        order.column,
        order.direction
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Copy `rows`, keeping only the fields named in `columns`. Each row keeps its
/// own field order; an empty selection yields empty rows.
pub fn project<'a, S: AsRef<str>>(
    rows: impl IntoIterator<Item = &'a Record>,
    columns: &[S],
) -> Vec<Record> {
    rows.into_iter()
        .map(|record| {
            let mut projected = record.clone();
            projected.retain(|name| columns.iter().any(|c| c.as_ref() == name));
            projected
        })
        .collect()
}
