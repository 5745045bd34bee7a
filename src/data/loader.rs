use std::path::Path;

use serde_json::{Map, Value as JsonValue};

use super::format::Format;
use super::model::{Dataset, Record, Value};
use crate::error::{Result, SieveError};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json` – `[{ "col": value, ... }, ...]` or `{ "col": [values...], ... }`
/// * `.csv`  – header row followed by one line per row
///
/// The extension is checked before the file is read, so an unsupported path
/// never touches the filesystem.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let format = Format::from_path(path)?;
    let bytes = std::fs::read(path)?;
    load_bytes(&bytes, format)
}

/// Parse raw bytes of a declared format into a fully built [`Dataset`].
pub fn load_bytes(bytes: &[u8], format: Format) -> Result<Dataset> {
    let (records, column_names) = match format {
        Format::Json => load_json(bytes)?,
        Format::Csv => load_csv(bytes)?,
    };
    Ok(Dataset::new(records, column_names))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Two layouts are accepted.
///
/// Records-oriented (column names are the keys of the first row):
///
/// ```json
/// [ { "age": 30, "city": "Oslo" }, { "age": 17, "city": "Linz" } ]
/// ```
///
/// Columns-oriented (rows rebuilt by index):
///
/// ```json
/// { "age": [30, 17], "city": ["Oslo", "Linz"] }
/// ```
fn load_json(bytes: &[u8]) -> Result<(Vec<Record>, Vec<String>)> {
    let root: JsonValue =
        serde_json::from_slice(bytes).map_err(|e| SieveError::malformed(Format::Json, e))?;

    match root {
        JsonValue::Array(rows) => load_json_records(&rows),
        JsonValue::Object(columns) => load_json_columns(&columns),
        _ => Err(SieveError::malformed(
            Format::Json,
            "expected a top-level array of objects or an object of arrays",
        )),
    }
}

fn load_json_records(rows: &[JsonValue]) -> Result<(Vec<Record>, Vec<String>)> {
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .ok_or_else(|| SieveError::malformed(Format::Json, format!("row {i} is not an object")))?;

        records.push(
            obj.iter()
                .map(|(key, val)| (key.as_str(), Value::from_json(val)))
                .collect::<Record>(),
        );
    }

    let column_names = rows
        .first()
        .and_then(JsonValue::as_object)
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default();

    Ok((records, column_names))
}

/// Zip per-column arrays into rows. Columns shorter than the longest one leave
/// their trailing rows without that field.
fn load_json_columns(columns: &Map<String, JsonValue>) -> Result<(Vec<Record>, Vec<String>)> {
    let mut arrays = Vec::with_capacity(columns.len());
    for (name, val) in columns {
        let arr = val.as_array().ok_or_else(|| {
            SieveError::malformed(Format::Json, format!("column {name:?} is not an array"))
        })?;
        arrays.push((name.as_str(), arr));
    }

    let n_rows = arrays.iter().map(|(_, arr)| arr.len()).max().unwrap_or(0);
    if arrays.iter().any(|(_, arr)| arr.len() != n_rows) {
        log::warn!("JSON columns have unequal lengths; padding short columns with missing values");
    }

    let records = (0..n_rows)
        .map(|i| {
            arrays
                .iter()
                .filter_map(|(name, arr)| arr.get(i).map(|v| (*name, Value::from_json(v))))
                .collect::<Record>()
        })
        .collect();

    let column_names = columns.keys().cloned().collect();
    Ok((records, column_names))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, every later line one row.
/// Cells are kept as strings. Short rows leave their trailing columns
/// missing; cells beyond the header are ignored.
fn load_csv(bytes: &[u8]) -> Result<(Vec<Record>, Vec<String>)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SieveError::malformed(Format::Csv, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result
            .map_err(|e| SieveError::malformed(Format::Csv, format!("row {row_no}: {e}")))?;

        if row.len() != headers.len() {
            log::warn!(
                "CSV row {row_no} has {} fields, header has {}",
                row.len(),
                headers.len()
            );
        }

        records.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.as_str(), Value::from(cell)))
                .collect::<Record>(),
        );
    }

    Ok((records, headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::infer::ColumnType;

    #[test]
    fn json_records_keep_first_row_key_order() {
        let ds = load_bytes(br#"[{"city":"Oslo","age":30},{"age":17,"city":"Linz"}]"#, Format::Json)
            .unwrap();
        assert_eq!(ds.column_names, ["city", "age"]);
        assert_eq!(ds.records[1].get("city"), &Value::from("Linz"));
        assert_eq!(ds.column_type("age"), ColumnType::Int);
    }

    #[test]
    fn json_columns_are_zipped_into_rows() {
        let ds = load_bytes(br#"{"age":[30,17],"city":["Oslo","Linz"]}"#, Format::Json).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column_names, ["age", "city"]);
        assert_eq!(ds.records[0].get("age"), &Value::Integer(30));
        assert_eq!(ds.records[1].get("city"), &Value::from("Linz"));
    }

    #[test]
    fn json_short_column_leaves_field_missing() {
        let ds = load_bytes(br#"{"a":[1,2,3],"b":["x"]}"#, Format::Json).unwrap();
        assert_eq!(ds.len(), 3);
        assert!(ds.records[0].contains("b"));
        assert!(!ds.records[2].contains("b"));
    }

    #[test]
    fn json_empty_array_is_an_empty_dataset() {
        let ds = load_bytes(b"[]", Format::Json).unwrap();
        assert!(ds.is_empty());
        assert!(ds.column_names.is_empty());
    }

    #[test]
    fn json_shape_errors_are_malformed() {
        let inputs: [&[u8]; 4] = [b"42", b"[1, 2]", br#"{"a": 1}"#, b"{not json"];
        for input in inputs {
            let err = load_bytes(input, Format::Json).unwrap_err();
            assert!(
                matches!(err, SieveError::MalformedInput { format: Format::Json, .. }),
                "{err}"
            );
        }
    }

    #[test]
    fn explicit_null_counts_for_inference_in_both_layouts() {
        let inputs: [&[u8]; 2] = [
            br#"[{"age":30},{"age":null},{"age":17}]"#,
            br#"{"age":[30,null,17]}"#,
        ];
        for input in inputs {
            let ds = load_bytes(input, Format::Json).unwrap();
            assert_eq!(ds.records[1].get("age"), &Value::Null);
            assert_eq!(ds.column_type("age"), ColumnType::String);
        }
    }

    #[test]
    fn missing_key_does_not_count_for_inference() {
        let ds = load_bytes(br#"[{"age":30},{},{"age":17}]"#, Format::Json).unwrap();
        assert_eq!(ds.records[1].get("age"), &Value::Absent);
        assert_eq!(ds.column_type("age"), ColumnType::Int);
    }

    #[test]
    fn csv_values_load_as_strings() {
        let ds = load_bytes(b"name,score\nalice,10\nbob,7\n", Format::Csv).unwrap();
        assert_eq!(ds.column_names, ["name", "score"]);
        assert_eq!(ds.records[1].get("score"), &Value::from("7"));
        assert_eq!(ds.column_type("score"), ColumnType::String);
    }

    #[test]
    fn csv_short_row_has_missing_field() {
        let ds = load_bytes(b"a,b,c\n1,2\n4,5,6,7\n", Format::Csv).unwrap();
        assert_eq!(ds.records[0].get("c"), &Value::Absent);
        assert_eq!(ds.records[1].len(), 3);
    }

    #[test]
    fn csv_empty_cell_is_empty_string_not_absent() {
        let ds = load_bytes(b"a,b\n,x\n", Format::Csv).unwrap();
        assert_eq!(ds.records[0].get("a"), &Value::from(""));
    }

    #[test]
    fn unsupported_path_is_rejected_before_reading() {
        let err = load_file(Path::new("/definitely/not/here.xlsx")).unwrap_err();
        assert!(matches!(err, SieveError::UnsupportedFormat { .. }));
    }
}
