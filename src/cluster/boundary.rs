//! Assignment of the year's incomplete boundary groups to clusters.

use crate::DAYS_PER_YEAR;
use crate::metrics::groups::BoundaryVector;

use super::set::ClusterSet;

/// Cluster homes for the incomplete first/last day-groups and the cluster
/// weights renormalized to cover all 365 days.
#[derive(Debug, Clone)]
pub struct BoundaryAssignment {
    /// Cluster representing day 0.
    pub first_cluster: usize,
    /// Cluster representing the trailing partial group.
    pub last_cluster: usize,
    /// Per-cluster weights including the boundary-day fractions.
    pub adjusted_weights: Vec<f64>,
}

/// Assigns both boundary vectors to their nearest cluster means, measuring
/// distance over defined features only, then recomputes cluster weights
/// with the boundary days folded in as fractional groups.
pub fn assign_boundaries(
    set: &ClusterSet,
    first: &BoundaryVector,
    last: &BoundaryVector,
    ndays: usize,
) -> BoundaryAssignment {
    let first_cluster = nearest_masked(set, first);
    let last_cluster = nearest_masked(set, last);

    let n_group = set.n_groups();
    let first_frac = 1.0 / ndays as f64;
    let last_days = (DAYS_PER_YEAR - n_group * ndays - 1) as f64;
    let last_frac = last_days / ndays as f64;

    let mut sums = vec![0.0; set.n_clusters()];
    for row in &set.partition {
        for (k, &w) in row.iter().enumerate() {
            sums[k] += w;
        }
    }
    sums[first_cluster] += first_frac;
    sums[last_cluster] += last_frac;
    let total = n_group as f64 + first_frac + last_frac;

    BoundaryAssignment {
        first_cluster,
        last_cluster,
        adjusted_weights: sums.iter().map(|&s| s / total).collect(),
    }
}

/// Nearest cluster mean by squared distance over the vector's defined
/// features, first minimum on ties.
fn nearest_masked(set: &ClusterSet, vector: &BoundaryVector) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (k, mean) in set.means.iter().enumerate() {
        let dist: f64 = vector
            .values
            .iter()
            .zip(&vector.defined)
            .zip(mean)
            .filter(|&((_, &defined), _)| defined)
            .map(|((&v, _), &m)| (v - m) * (v - m))
            .sum();
        if dist < best_dist {
            best_dist = dist;
            best = k;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_set() -> ClusterSet {
        ClusterSet {
            index: vec![0, 0, 1, 1],
            count: vec![2, 2],
            means: vec![vec![0.0, 0.0], vec![5.0, 5.0]],
            partition: vec![
                vec![1.0, 0.0],
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![0.0, 1.0],
            ],
            exemplars: vec![0, 2],
            weights: vec![0.5, 0.5],
            wcss: 0.0,
            converged: true,
        }
    }

    #[test]
    fn assignment_skips_undefined_features() {
        let set = small_set();
        // Full-vector distance favors cluster 1; the defined feature alone
        // favors cluster 0.
        let first = BoundaryVector {
            values: vec![5.0, 1.0],
            defined: vec![false, true],
        };
        let last = BoundaryVector {
            values: vec![5.0, 5.0],
            defined: vec![true, true],
        };
        let assignment = assign_boundaries(&set, &first, &last, 2);
        assert_eq!(assignment.first_cluster, 0);
        assert_eq!(assignment.last_cluster, 1);
    }

    #[test]
    fn adjusted_weights_fold_in_boundary_fractions() {
        let set = small_set();
        let near_zero = BoundaryVector {
            values: vec![0.0, 0.0],
            defined: vec![true, true],
        };
        let near_five = BoundaryVector {
            values: vec![5.0, 5.0],
            defined: vec![true, true],
        };
        let assignment = assign_boundaries(&set, &near_zero, &near_five, 2);
        // 4 groups of 2 days: first fraction 0.5, trailing fraction
        // (365 - 9) / 2 = 178 groups' worth of days.
        let first_frac = 0.5;
        let last_frac = 178.0;
        let total = 4.0 + first_frac + last_frac;
        assert!((assignment.adjusted_weights[0] - (2.0 + first_frac) / total).abs() < 1e-12);
        assert!((assignment.adjusted_weights[1] - (2.0 + last_frac) / total).abs() < 1e-12);
        let sum: f64 = assignment.adjusted_weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn shared_boundary_cluster_accumulates_both_fractions() {
        let set = small_set();
        let near_zero = BoundaryVector {
            values: vec![0.1, 0.1],
            defined: vec![true, true],
        };
        let assignment = assign_boundaries(&set, &near_zero, &near_zero, 2);
        assert_eq!(assignment.first_cluster, 0);
        assert_eq!(assignment.last_cluster, 0);
        let total = 4.0 + 0.5 + 178.0;
        assert!((assignment.adjusted_weights[0] - (2.0 + 178.5) / total).abs() < 1e-12);
    }
}
