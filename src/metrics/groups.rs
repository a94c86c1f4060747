//! Multi-day group feature vectors assembled from the daily tables.

use std::fmt;

use crate::DAYS_PER_YEAR;

use super::daily::DailyTables;
use super::types::{DayPlacement, MetricConfig};

/// Feature vector with a per-feature validity mask.
///
/// Used for the incomplete first/last day-groups of the year, whose
/// `_prev`/`_next` features can reference days outside the year. Undefined
/// features hold 0.0 and are excluded from distance computations through
/// the mask.
#[derive(Debug, Clone)]
pub struct BoundaryVector {
    pub values: Vec<f64>,
    pub defined: Vec<bool>,
}

impl BoundaryVector {
    /// Number of features.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the vector carries no features.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when every feature references a day inside the year.
    pub fn fully_defined(&self) -> bool {
        self.defined.iter().all(|&d| d)
    }
}

/// Clustering inputs for one year: interior group rows plus the two
/// boundary vectors.
#[derive(Debug, Clone)]
pub struct GroupFeatures {
    /// `[group][feature]` matrix over the interior groups; every feature
    /// is defined.
    pub rows: Vec<Vec<f64>>,
    /// Feature vector for the incomplete group at year start (day 0).
    pub first: BoundaryVector,
    /// Feature vector for the incomplete group at year end.
    pub last: BoundaryVector,
    /// Days per group.
    pub ndays: usize,
}

impl GroupFeatures {
    /// Number of interior groups.
    pub fn n_group(&self) -> usize {
        self.rows.len()
    }

    /// Features per group vector.
    pub fn feature_len(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

/// Every metric weight is zero, so group vectors would have no features.
#[derive(Debug)]
pub struct NoFeaturesError;

impl fmt::Display for NoFeaturesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no weighted metrics: the group feature matrix has zero columns"
        )
    }
}

impl std::error::Error for NoFeaturesError {}

/// Number of interior `ndays` groups in a year, excluding the incomplete
/// first and last groups.
pub fn interior_group_count(ndays: usize) -> usize {
    (DAYS_PER_YEAR - 2) / ndays
}

/// Assembles the interior group rows and boundary vectors.
///
/// Group `g` starts at day `g * ndays + 1`; day 0 and the days after the
/// last full group form the boundary vectors. Each weighted metric
/// contributes its division averages multiplied by its weight, drawn from
/// the group's own days or the single adjacent day for `_prev`/`_next`
/// metrics.
///
/// # Errors
///
/// Returns `NoFeaturesError` when no metric carries weight.
pub fn assemble_groups(
    tables: &DailyTables,
    config: &MetricConfig,
    ndays: usize,
) -> Result<GroupFeatures, NoFeaturesError> {
    if config.feature_len(ndays) == 0 {
        return Err(NoFeaturesError);
    }
    let n_group = interior_group_count(ndays);

    let rows = (0..n_group)
        .map(|g| group_vector(tables, config, ndays, (g * ndays + 1) as isize).values)
        .collect();
    let first = group_vector(tables, config, ndays, 0);
    let last = group_vector(tables, config, ndays, (n_group * ndays + 1) as isize);

    Ok(GroupFeatures {
        rows,
        first,
        last,
        ndays,
    })
}

/// Builds the feature vector for a group starting at `start_day`, marking
/// features whose source day falls outside the year as undefined.
fn group_vector(
    tables: &DailyTables,
    config: &MetricConfig,
    ndays: usize,
    start_day: isize,
) -> BoundaryVector {
    let mut values = Vec::new();
    let mut defined = Vec::new();
    for metric in config.active() {
        let spec = config.spec(metric);
        let days: Vec<isize> = match metric.placement() {
            DayPlacement::PrevDay => vec![start_day - 1],
            DayPlacement::NextDay => vec![start_day + ndays as isize],
            DayPlacement::Own => (0..ndays as isize).map(|d| start_day + d).collect(),
        };
        let table = tables.get(metric);
        for day in days {
            let in_year = (0..DAYS_PER_YEAR as isize).contains(&day);
            match table {
                Some(t) if in_year => {
                    values.extend(t[day as usize].iter().map(|&v| v * spec.weight));
                    defined.extend(std::iter::repeat_n(true, spec.divisions));
                }
                _ => {
                    values.extend(std::iter::repeat_n(0.0, spec.divisions));
                    defined.extend(std::iter::repeat_n(false, spec.divisions));
                }
            }
        }
    }
    BoundaryVector { values, defined }
}
