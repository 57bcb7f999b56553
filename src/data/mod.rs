/// Data layer: core types, loading, and weighting-row selection.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<WeightingRow>, curves, tints
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  bucket rows by illuminant/observer/table
///   └──────────┘
///        │
///        ▼
///   ReferenceData (colorimetry::astm)
/// ```

pub mod filter;
pub mod loader;
pub mod model;
