use std::io;

use thiserror::Error;

use crate::data::format::Format;

/// Every failure the engine reports back to its caller.
///
/// None of these leave the session in a half-updated state: a failed load keeps
/// the previous dataset, a failed filter pass keeps the previous result.
#[derive(Debug, Error)]
pub enum SieveError {
    /// The file extension is neither `.json` nor `.csv`.
    #[error("unsupported file format: {extension:?} (expected .json or .csv)")]
    UnsupportedFormat { extension: String },

    /// The bytes do not parse, or parse into the wrong shape.
    #[error("malformed {format} input: {message}")]
    MalformedInput { format: Format, message: String },

    /// A `less than` / `more than` operand is not a number.
    #[error("column {column:?}, row {row}: cannot compare {value:?} as a number")]
    NumericCoercion {
        column: String,
        row: usize,
        value: String,
    },

    /// Filtering, sorting or exporting was asked for before anything was loaded.
    #[error("no dataset loaded")]
    NoDataset,

    /// A filter or sort names a column the dataset does not have.
    #[error("no such column: {column:?}")]
    UnknownColumn { column: String },

    #[error("failed to write {format} output: {message}")]
    Export { format: Format, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SieveError {
    pub(crate) fn malformed(format: Format, message: impl ToString) -> Self {
        SieveError::MalformedInput {
            format,
            message: message.to_string(),
        }
    }
}

pub type Result<T, E = SieveError> = std::result::Result<T, E>;
