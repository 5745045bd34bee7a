/// Data layer: core types, loading, inference, filtering, and output.
///
/// Architecture:
/// ```text
///  .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse bytes → records + column names
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, column types (infer)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  per-column conditions → visible row indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  arrange  │  optional sort, optional projection
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  rows → .json / .csv bytes
///   └──────────┘
/// ```

pub mod arrange;
pub mod export;
pub mod filter;
pub mod format;
pub mod infer;
pub mod loader;
pub mod model;
