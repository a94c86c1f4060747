//! Representative-day selection for annual energy system simulation.

pub mod annual;
/// Affinity-propagation clustering and cluster-count search.
pub mod cluster;
pub mod config;
pub mod io;
/// Metric ingest, daily averaging, and group feature assembly.
pub mod metrics;
pub mod pipeline;
pub mod schedule;
pub mod solar;
pub mod weather;

/// Hourly points in the non-leap simulation year.
pub const HOURS_PER_YEAR: usize = 8760;

/// Days in the non-leap simulation year.
pub const DAYS_PER_YEAR: usize = 365;
