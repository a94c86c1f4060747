//! Per-day, per-division metric tables built from the hourly series.

use tracing::warn;

use crate::DAYS_PER_YEAR;
use crate::solar::DaylightWindow;

use super::ingest::HourlySet;
use super::types::{AveragingBounds, Metric, MetricConfig};

/// Range floor that keeps min-max normalization defined for constant metrics.
const NORMALIZE_EPS: f64 = 1e-6;

/// Normalized daily division averages for every weighted metric.
///
/// Each table is `[day][division]` over the 365-day year, min-max normalized
/// to [0, 1] over the whole table; metrics with zero weight carry no table.
#[derive(Debug, Clone)]
pub struct DailyTables {
    tables: Vec<Option<Vec<Vec<f64>>>>,
}

impl DailyTables {
    /// Table for one metric, if it was weighted.
    pub fn get(&self, metric: Metric) -> Option<&Vec<Vec<f64>>> {
        self.tables[metric.index()].as_ref()
    }
}

/// Discrete points partially covered by one division, with their averaging
/// weights. A trailing point index equal to the window length carries zero
/// weight and is skipped when accumulating.
struct DivisionPattern {
    points: Vec<usize>,
    weights: Vec<f64>,
}

/// Splits a window of `window_len` points into `n_div` equal spans.
///
/// Spans need not align to whole points: the first and last point of each
/// span are weighted by their covered fraction, interior points by `1/n`
/// where `n` is the (possibly fractional) point count per span.
fn division_patterns(window_len: usize, n_div: usize) -> Vec<DivisionPattern> {
    let n = window_len as f64 / n_div as f64;
    (0..n_div)
        .map(|i| {
            let pstart = i as f64 * n;
            let pend = (i + 1) as f64 * n;
            let first = pstart as usize;
            let last = pend as usize;
            let npt = last - first + 1;
            let mut weights = vec![1.0 / n; npt];
            weights[0] = (1.0 - (pstart - first as f64)) / n;
            weights[npt - 1] = (pend - last as f64) / n;
            DivisionPattern {
                points: (first..=last).collect(),
                weights,
            }
        })
        .collect()
}

/// Builds normalized daily tables for every weighted metric.
///
/// # Arguments
///
/// * `set` - Canonical hourly series on the annual grid
/// * `config` - Metric weights, divisions, and averaging bounds
/// * `daylight` - Solstice daylight window for daylight-bounded metrics
pub fn build_daily_tables(
    set: &HourlySet,
    config: &MetricConfig,
    daylight: &DaylightWindow,
) -> DailyTables {
    let n_pts_day = set.points_per_day();
    let (sunrise_idx, sunset_idx) = daylight.point_range(set.points_per_hour);

    let mut tables: Vec<Option<Vec<Vec<f64>>>> = vec![None; Metric::ALL.len()];
    for metric in config.active() {
        let spec = config.spec(metric);
        let (window_len, p1) = match spec.bounds {
            AveragingBounds::FullDay => (n_pts_day, 0),
            AveragingBounds::SummerDaylight => (sunset_idx - sunrise_idx, sunrise_idx),
        };
        let series = set.series(metric.source());
        let patterns = division_patterns(window_len, spec.divisions);

        let mut table = vec![vec![0.0; spec.divisions]; DAYS_PER_YEAR];
        for (d, row) in table.iter_mut().enumerate() {
            for (i, pattern) in patterns.iter().enumerate() {
                let mut acc = 0.0;
                for (&pt, &w) in pattern.points.iter().zip(&pattern.weights) {
                    if pt >= window_len {
                        // Only the zero-weighted trailing point may land here.
                        if w > 0.0 {
                            warn!(
                                metric = metric.name(),
                                division = i,
                                "weighted point outside the day window"
                            );
                        }
                        continue;
                    }
                    acc += series[d * n_pts_day + p1 + pt] * w;
                }
                row[i] = acc;
            }
        }
        normalize_table(&mut table);
        tables[metric.index()] = Some(table);
    }
    DailyTables { tables }
}

/// Min-max normalizes a table in place over all entries.
fn normalize_table(table: &mut [Vec<f64>]) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for row in table.iter() {
        for &v in row {
            min = min.min(v);
            max = max.max(v);
        }
    }
    let denom = (max - min).max(NORMALIZE_EPS);
    for row in table.iter_mut() {
        for v in row.iter_mut() {
            *v = (*v - min) / denom;
        }
    }
}
