/// Data layer: core types, loading, filtering and label encoding.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table<String>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  neighbor rank, "unknown" sentinel
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  labels   │  vocabulary → index → Table<usize>
///   └──────────┘
/// ```

pub mod filter;
pub mod labels;
pub mod loader;
pub mod model;
