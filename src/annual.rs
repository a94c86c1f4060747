//! Full-year reconstruction from per-exemplar simulation windows.

use tracing::warn;

use crate::HOURS_PER_YEAR;
use crate::cluster::{BoundaryAssignment, ClusterSet};
use crate::metrics::ShapeError;

/// Days averaged when a boundary region has no cluster assignment.
const FALLBACK_AVG_DAYS: usize = 5;

/// Rebuilds a full-year hourly array from data populated only inside each
/// exemplar's simulated window.
///
/// Interior groups receive the partition-weighted sum of the cluster
/// windows. The incomplete first and trailing days are copied from the
/// windows of their assigned boundary clusters, clipped to the year
/// length. When no boundary assignment is available, those regions fall
/// back to a per-hour-of-day average of the nearest five assigned days,
/// broadcast across every unfilled boundary day.
///
/// # Errors
///
/// Returns a [`ShapeError`] when `exemplar_data` is empty or not a whole
/// number of year-grids long.
pub fn annualize(
    exemplar_data: &[f64],
    set: &ClusterSet,
    boundary: Option<&BoundaryAssignment>,
    ndays: usize,
) -> Result<Vec<f64>, ShapeError> {
    let npts = exemplar_data.len();
    if npts == 0 || npts % HOURS_PER_YEAR != 0 {
        return Err(ShapeError {
            series: "exemplar data".to_string(),
            message: format!("length {npts} is not a whole number of {HOURS_PER_YEAR}-point years"),
        });
    }
    let pts_day = (npts / HOURS_PER_YEAR) * 24;
    let n_group = set.n_groups();
    let window = pts_day * ndays;

    // Each cluster's exemplar window, in source order.
    let windows: Vec<&[f64]> = set
        .exemplars
        .iter()
        .map(|&e| {
            let d = 1 + e * ndays;
            &exemplar_data[d * pts_day..(d + ndays) * pts_day]
        })
        .collect();

    let mut full = vec![0.0; npts];
    for (g, row) in set.partition.iter().enumerate() {
        let offset = (g * ndays + 1) * pts_day;
        for (k, &w) in row.iter().enumerate() {
            if w != 0.0 {
                for (t, &v) in windows[k].iter().enumerate() {
                    full[offset + t] += w * v;
                }
            }
        }
    }

    let trailing_start = (n_group * ndays + 1) * pts_day;
    match boundary {
        Some(assignment) => {
            let d = 1 + set.exemplars[assignment.first_cluster] * ndays;
            full.copy_within(d * pts_day..(d + 1) * pts_day, 0);

            let d = 1 + set.exemplars[assignment.last_cluster] * ndays;
            let count = window.min(npts - trailing_start);
            full.copy_within(d * pts_day..d * pts_day + count, trailing_start);
        }
        None => {
            fill_boundaries_from_neighbors(&mut full, pts_day, trailing_start);
        }
    }

    Ok(full)
}

/// Boolean variant of [`annualize`]: nonzero reconstructed values map to
/// `true`.
pub fn annualize_bool(
    exemplar_data: &[f64],
    set: &ClusterSet,
    boundary: Option<&BoundaryAssignment>,
    ndays: usize,
) -> Result<Vec<bool>, ShapeError> {
    Ok(annualize(exemplar_data, set, boundary, ndays)?
        .iter()
        .map(|&v| v != 0.0)
        .collect())
}

/// Fills still-zero boundary regions with a per-hour-of-day average of the
/// adjacent assigned days.
fn fill_boundaries_from_neighbors(full: &mut [f64], pts_day: usize, trailing_start: usize) {
    let npts = full.len();
    if full[..pts_day].iter().all(|&v| v == 0.0) {
        warn!(
            days = FALLBACK_AVG_DAYS,
            "first day has no cluster assignment, filling from the following days"
        );
        let avg = hour_of_day_average(full, pts_day, 1, FALLBACK_AVG_DAYS);
        full[..pts_day].copy_from_slice(&avg);
    }

    if trailing_start < npts && full[trailing_start..].iter().all(|&v| v == 0.0) {
        let trailing_days = (npts - trailing_start) / pts_day;
        warn!(
            days = trailing_days,
            "trailing days have no cluster assignment, filling from the preceding days"
        );
        let first_day = trailing_start / pts_day - FALLBACK_AVG_DAYS;
        let avg = hour_of_day_average(full, pts_day, first_day, FALLBACK_AVG_DAYS);
        for day in 0..trailing_days {
            let offset = trailing_start + day * pts_day;
            full[offset..offset + pts_day].copy_from_slice(&avg);
        }
    }
}

/// Mean daily profile over `count` days starting at `first_day`.
fn hour_of_day_average(full: &[f64], pts_day: usize, first_day: usize, count: usize) -> Vec<f64> {
    let mut avg = vec![0.0; pts_day];
    for day in first_day..first_day + count {
        for (h, slot) in avg.iter_mut().enumerate() {
            *slot += full[day * pts_day + h] / count as f64;
        }
    }
    avg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterSet;

    /// Hard two-cluster set over 181 two-day groups; groups below the
    /// split go to cluster 0.
    fn two_cluster_set(split: usize) -> ClusterSet {
        let n_group = 181;
        let index: Vec<usize> = (0..n_group).map(|g| usize::from(g >= split)).collect();
        let partition = index
            .iter()
            .map(|&k| {
                let mut row = vec![0.0, 0.0];
                row[k] = 1.0;
                row
            })
            .collect();
        let count = vec![split, n_group - split];
        ClusterSet {
            index,
            count,
            means: vec![vec![0.0], vec![1.0]],
            partition,
            exemplars: vec![0, 5],
            weights: vec![split as f64 / 181.0, (181 - split) as f64 / 181.0],
            wcss: 0.0,
            converged: true,
        }
    }

    /// Exemplar-window data for `two_cluster_set`: cluster 0's window
    /// (days 1..3) holds 1.0, cluster 1's (days 11..13) holds 2.0.
    fn exemplar_year() -> Vec<f64> {
        let mut data = vec![0.0; HOURS_PER_YEAR];
        data[24..72].fill(1.0);
        data[264..312].fill(2.0);
        data
    }

    #[test]
    fn interior_groups_mix_cluster_windows() {
        let set = two_cluster_set(90);
        let boundary = BoundaryAssignment {
            first_cluster: 0,
            last_cluster: 1,
            adjusted_weights: set.weights.clone(),
        };
        let full = annualize(&exemplar_year(), &set, Some(&boundary), 2).unwrap();
        // group 0 (days 1..3) belongs to cluster 0, group 100 (days
        // 201..203) to cluster 1
        assert!(full[24..72].iter().all(|&v| v == 1.0));
        assert!(full[201 * 24..203 * 24].iter().all(|&v| v == 2.0));
    }

    #[test]
    fn boundary_days_copy_their_assigned_cluster() {
        let set = two_cluster_set(90);
        let boundary = BoundaryAssignment {
            first_cluster: 0,
            last_cluster: 1,
            adjusted_weights: set.weights.clone(),
        };
        let full = annualize(&exemplar_year(), &set, Some(&boundary), 2).unwrap();
        assert!(full[..24].iter().all(|&v| v == 1.0));
        // trailing days 363 and 364
        assert!(full[363 * 24..].iter().all(|&v| v == 2.0));
        // every hour of the year is assigned
        assert!(full.iter().all(|&v| v != 0.0));
    }

    #[test]
    fn trailing_copy_is_clipped_to_the_year() {
        // 121 three-day groups end at day 363; only day 364 remains.
        let n_group = 121;
        let index = vec![0; n_group];
        let partition = vec![vec![1.0]; n_group];
        let set = ClusterSet {
            index,
            count: vec![n_group],
            means: vec![vec![0.0]],
            partition,
            exemplars: vec![0],
            weights: vec![1.0],
            wcss: 0.0,
            converged: true,
        };
        let mut data = vec![0.0; HOURS_PER_YEAR];
        // cluster 0 window, days 1..4
        for (t, v) in data[24..96].iter_mut().enumerate() {
            *v = 1.0 + (t / 24) as f64;
        }
        let boundary = BoundaryAssignment {
            first_cluster: 0,
            last_cluster: 0,
            adjusted_weights: vec![1.0],
        };
        let full = annualize(&data, &set, Some(&boundary), 3).unwrap();
        // day 364 holds the first day of the window
        assert!(full[364 * 24..].iter().all(|&v| v == 1.0));
        assert_eq!(full.len(), HOURS_PER_YEAR);
    }

    #[test]
    fn missing_boundary_assignment_falls_back_to_neighbor_averages() {
        let n_group = 181;
        let set = ClusterSet {
            index: vec![0; n_group],
            count: vec![n_group],
            means: vec![vec![0.0]],
            partition: vec![vec![1.0]; n_group],
            exemplars: vec![0],
            weights: vec![1.0],
            wcss: 0.0,
            converged: true,
        };
        let mut data = vec![0.0; HOURS_PER_YEAR];
        // window days 1..3 with an hour-of-day ramp, 1..=24
        for (t, v) in data[24..72].iter_mut().enumerate() {
            *v = (t % 24) as f64 + 1.0;
        }
        let full = annualize(&data, &set, None, 2).unwrap();
        for h in 0..24 {
            assert!((full[h] - (h as f64 + 1.0)).abs() < 1e-9, "first day hour {h}");
            assert!(
                (full[363 * 24 + h] - (h as f64 + 1.0)).abs() < 1e-9,
                "day 363 hour {h}"
            );
            assert!(
                (full[364 * 24 + h] - (h as f64 + 1.0)).abs() < 1e-9,
                "day 364 hour {h}"
            );
        }
    }

    #[test]
    fn reconstruction_is_repeatable() {
        let set = two_cluster_set(90);
        let boundary = BoundaryAssignment {
            first_cluster: 0,
            last_cluster: 1,
            adjusted_weights: set.weights.clone(),
        };
        let data = exemplar_year();
        let first = annualize(&data, &set, Some(&boundary), 2).unwrap();
        let second = annualize(&data, &set, Some(&boundary), 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn boolean_variant_maps_nonzero_hours() {
        let set = two_cluster_set(90);
        let boundary = BoundaryAssignment {
            first_cluster: 0,
            last_cluster: 1,
            adjusted_weights: set.weights.clone(),
        };
        let full = annualize_bool(&exemplar_year(), &set, Some(&boundary), 2).unwrap();
        assert!(full.iter().all(|&v| v));
    }

    #[test]
    fn rejects_partial_year_arrays() {
        let set = two_cluster_set(90);
        assert!(annualize(&vec![0.0; 5000], &set, None, 2).is_err());
        assert!(annualize(&[], &set, None, 2).is_err());
    }
}
