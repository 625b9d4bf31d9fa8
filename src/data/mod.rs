/// Data layer: core types, generation, loading, filtering and export.
///
/// Architecture:
/// ```text
///  generate (seeded)   .csv / .json / .parquet
///        │                      │
///        └──────────┬───────────┘
///                   ▼
///            ┌────────────┐
///            │  Dataset   │  Vec<SaleRecord>, dropdown options
///            └────────────┘
///                   │
///                   ▼
///            ┌────────────┐
///            │   filter   │  FilterSelection → Subset (row indices)
///            └────────────┘
///                   │
///                   ▼
///            ┌────────────┐
///            │   export   │  Subset → CSV bytes
///            └────────────┘
/// ```

pub mod export;
pub mod filter;
pub mod generate;
pub mod loader;
pub mod model;
