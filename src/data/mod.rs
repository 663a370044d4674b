/// Data layer: core types, origins, parsing and schema checks.
///
/// Architecture:
/// ```text
///  local path │ upload bytes │ remote URL
///        │
///        ▼
///   ┌──────────┐
///   │  source   │  pick an origin → raw bytes
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  csv / xlsx / parquet → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  schema   │  required columns, drop incomplete rows (filter)
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
pub mod source;
