//! Clustering metric construction from hourly resource and price data.

/// Daily division-average tables with global normalization.
pub mod daily;
/// Multi-day group feature vectors and boundary handling.
pub mod groups;
pub mod ingest;
pub mod types;

// Re-export the main types for convenience
pub use daily::{DailyTables, build_daily_tables};
pub use groups::{BoundaryVector, GroupFeatures, NoFeaturesError, assemble_groups};
pub use ingest::{HourlySet, ShapeError};
pub use types::{
    AveragingBounds, DayPlacement, Metric, MetricConfig, MetricSpec, SourceSeries, Technology,
};
