//! Clustering of day-groups into representative periods.

/// Affinity propagation engine.
pub mod affinity;
/// Boundary-group assignment and weight adjustment.
pub mod boundary;
pub mod search;
pub mod set;

use tracing::{debug, warn};

// Re-export the main types for convenience
pub use affinity::{AffinityOutcome, AffinityPropagation, median_similarity};
pub use boundary::{BoundaryAssignment, assign_boundaries};
pub use search::{PreferenceSearch, SearchStep, UpdateRule};
pub use set::{ClusterSet, Partitioning};

/// Tuning knobs for cluster creation.
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    /// Target number of clusters.
    pub n_cluster: usize,
    /// Maximum message-passing iterations per attempt.
    pub max_iter: usize,
    /// Damping factor for message updates.
    pub damping: f64,
    /// Stable iterations required for convergence.
    pub convergence_iter: usize,
    /// Preference multiplier used when count enforcement is off.
    pub preference_mult: f64,
    /// Whether to search for a multiplier that hits the target count.
    pub enforce_count: bool,
    /// Acceptable deviation from the target count.
    pub enforce_tolerance: usize,
    /// Attempt budget for the enforcement search.
    pub enforce_attempts: usize,
    /// Partition matrix construction mode.
    pub partitioning: Partitioning,
    /// Seed for the similarity perturbation.
    pub seed: u64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        ClusterOptions {
            n_cluster: 20,
            max_iter: 200,
            damping: 0.5,
            convergence_iter: 10,
            preference_mult: 1.0,
            enforce_count: true,
            enforce_tolerance: 0,
            enforce_attempts: 50,
            partitioning: Partitioning::Hard,
            seed: 123,
        }
    }
}

/// Clusters the group rows into representative periods, renumbered in
/// exemplar order.
///
/// A single group short-circuits to [`ClusterSet::singleton`]. With count
/// enforcement on, affinity propagation is rerun under a
/// [`PreferenceSearch`] until the cluster count lands within tolerance of
/// the target or the attempt budget is spent; the last attempt's result is
/// kept either way.
pub fn create_clusters(rows: &[Vec<f64>], options: &ClusterOptions) -> ClusterSet {
    if rows.len() == 1 {
        return ClusterSet::singleton(&rows[0]);
    }

    let median = median_similarity(rows);
    let fit_once = |multiplier: f64, damping: f64| -> ClusterSet {
        let alg = AffinityPropagation {
            damping,
            max_iter: options.max_iter,
            convergence_iter: options.convergence_iter,
            preference: Some(median * multiplier),
            seed: options.seed,
        };
        ClusterSet::from_fit(alg.fit(rows), rows, options.partitioning)
    };

    let mut set = if options.enforce_count {
        let mut search = PreferenceSearch::new(
            options.n_cluster,
            options.enforce_tolerance,
            options.enforce_attempts,
            options.damping,
        );
        let mut set = fit_once(search.multiplier(), search.damping());
        loop {
            debug!(
                n_clusters = set.n_clusters(),
                converged = set.converged,
                multiplier = search.multiplier(),
                "clustering attempt"
            );
            match search.record(set.n_clusters(), set.converged) {
                SearchStep::Converged => break,
                SearchStep::Exhausted => {
                    warn!(
                        target = options.n_cluster,
                        achieved = set.n_clusters(),
                        attempts = search.attempts(),
                        "cluster-count search budget exhausted, keeping last result"
                    );
                    break;
                }
                SearchStep::RetrySame | SearchStep::Propose { .. } => {
                    set = fit_once(search.multiplier(), search.damping());
                }
            }
        }
        set
    } else {
        fit_once(options.preference_mult, options.damping)
    };

    set.sort_by_exemplar();
    set
}
