//! File import/export.

pub mod export;
pub mod series;

// Re-export the main types for convenience
pub use export::{export_csv, write_csv};
pub use series::{SeriesError, read_series_csv};
