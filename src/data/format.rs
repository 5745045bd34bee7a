use std::fmt;
use std::path::Path;

use crate::error::{Result, SieveError};

/// The two on-disk representations the engine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Csv,
}

impl Format {
    /// Pick the format from a path's extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Format> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            other => Err(SieveError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "JSON"),
            Format::Csv => write!(f, "CSV"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(Format::from_path(Path::new("a/b.JSON")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("rows.Csv")).unwrap(), Format::Csv);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = Format::from_path(Path::new("data.parquet")).unwrap_err();
        assert!(matches!(
            err,
            SieveError::UnsupportedFormat { ref extension } if extension == "parquet"
        ));

        let err = Format::from_path(Path::new("no_extension")).unwrap_err();
        assert!(matches!(err, SieveError::UnsupportedFormat { .. }));
    }
}
