//! Filter, sort and re-export tabular data loaded from JSON or CSV.
//!
//! The flow is load → infer column types → filter → sort/project → export.
//! [`Session`] owns the active dataset and its filters; the free functions in
//! [`data`] are the pure building blocks it is made of.

pub mod data;
pub mod error;
pub mod state;

pub use data::arrange::{SortDirection, SortOrder};
pub use data::filter::{Condition, FilterInput, FilterSet, FilterSpec};
pub use data::format::Format;
pub use data::infer::{ColumnType, NumericRange};
pub use data::model::{Dataset, Record, Value};
pub use error::{Result, SieveError};
pub use state::Session;
