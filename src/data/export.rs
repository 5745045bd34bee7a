use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use super::format::Format;
use super::model::Record;
use crate::error::{Result, SieveError};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Write `rows` to `path`, picking the format from the extension. Returns the
/// number of rows written.
///
/// The extension is checked before anything is serialized or created.
pub fn save_file<'a>(path: &Path, rows: impl IntoIterator<Item = &'a Record>) -> Result<usize> {
    let format = Format::from_path(path)?;
    let rows: Vec<&Record> = rows.into_iter().collect();
    let bytes = export(rows.iter().copied(), format)?;
    std::fs::write(path, bytes)?;
    log::info!("wrote {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}

/// Serialize `rows` in the given format.
pub fn export<'a>(rows: impl IntoIterator<Item = &'a Record>, format: Format) -> Result<Vec<u8>> {
    let rows: Vec<&Record> = rows.into_iter().collect();
    match format {
        Format::Json => export_json(&rows),
        Format::Csv => export_csv(&rows),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Array of objects, indented by four spaces, fields in each row's own order.
fn export_json(rows: &[&Record]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    rows.serialize(&mut ser).map_err(|e| SieveError::Export {
        format: Format::Json,
        message: e.to_string(),
    })?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Header is the first row's field names. Later rows are written against that
/// header: missing fields become empty cells, extra fields are dropped.
/// No rows means no output at all, not even a header.
fn export_csv(rows: &[&Record]) -> Result<Vec<u8>> {
    let Some(first) = rows.first() else {
        log::debug!("CSV export of an empty result");
        return Ok(Vec::new());
    };
    let header: Vec<&str> = first.columns().collect();
    if header.is_empty() {
        // A zero-field record would come out as `""`; write bare line breaks.
        return Ok(b"\n".repeat(rows.len() + 1));
    }

    let csv_err = |e: csv::Error| SieveError::Export {
        format: Format::Csv,
        message: e.to_string(),
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header).map_err(csv_err)?;

    for (i, row) in rows.iter().enumerate() {
        if row.columns().any(|c| !header.contains(&c)) {
            log::warn!("CSV export: row {i} has fields outside the header; they are dropped");
        }
        writer
            .write_record(header.iter().map(|col| row.get(col).to_string()))
            .map_err(csv_err)?;
    }

    writer.into_inner().map_err(|e| SieveError::Export {
        format: Format::Csv,
        message: e.to_string(),
    })
}
