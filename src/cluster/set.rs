//! Cluster sets built from an affinity propagation outcome.

use super::affinity::{AffinityOutcome, squared_distance};

/// Minimum squared distance used when a group sits exactly on a cluster
/// mean in fuzzy membership computation.
const FUZZY_DIST_FLOOR: f64 = 1e-10;

/// Partition matrix construction mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Partitioning {
    /// One-hot membership in the nearest cluster.
    Hard,
    /// Graded memberships with the given fuzziness exponent (`m > 1`).
    Fuzzy { fuzziness: f64 },
}

/// A complete clustering of the interior day-groups of the year.
#[derive(Debug, Clone)]
pub struct ClusterSet {
    /// Cluster assigned to each group.
    pub index: Vec<usize>,
    /// Groups nominally assigned to each cluster.
    pub count: Vec<usize>,
    /// Cluster means; row `k` is the feature vector of exemplar `k`.
    pub means: Vec<Vec<f64>>,
    /// `[group][cluster]` membership matrix.
    pub partition: Vec<Vec<f64>>,
    /// Group index of each cluster's exemplar.
    pub exemplars: Vec<usize>,
    /// Partition column sums divided by the group count.
    pub weights: Vec<f64>,
    /// Within-cluster sum of squares of the underlying fit.
    pub wcss: f64,
    /// Whether affinity propagation converged.
    pub converged: bool,
}

impl ClusterSet {
    /// Builds the cluster set for an affinity propagation outcome over
    /// `rows`.
    pub fn from_fit(
        outcome: AffinityOutcome,
        rows: &[Vec<f64>],
        partitioning: Partitioning,
    ) -> Self {
        let n_group = rows.len();
        let n_cluster = outcome.n_clusters();

        let mut count = vec![0; n_cluster];
        for &k in &outcome.index {
            count[k] += 1;
        }

        let partition = match partitioning {
            Partitioning::Hard => {
                let mut matrix = vec![vec![0.0; n_cluster]; n_group];
                for (g, &k) in outcome.index.iter().enumerate() {
                    matrix[g][k] = 1.0;
                }
                matrix
            }
            Partitioning::Fuzzy { fuzziness } => fuzzy_partition(rows, &outcome.means, fuzziness),
        };

        let mut weights = vec![0.0; n_cluster];
        for row in &partition {
            for (k, &w) in row.iter().enumerate() {
                weights[k] += w;
            }
        }
        for w in &mut weights {
            *w /= n_group as f64;
        }

        ClusterSet {
            index: outcome.index,
            count,
            means: outcome.means,
            partition,
            exemplars: outcome.exemplars,
            weights,
            wcss: outcome.wcss,
            converged: outcome.converged,
        }
    }

    /// Single-cluster set for a year with one interior group.
    pub fn singleton(row: &[f64]) -> Self {
        ClusterSet {
            index: vec![0],
            count: vec![1],
            means: vec![row.to_vec()],
            partition: vec![vec![1.0]],
            exemplars: vec![0],
            weights: vec![1.0],
            wcss: 0.0,
            converged: true,
        }
    }

    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.exemplars.len()
    }

    /// Number of interior groups.
    pub fn n_groups(&self) -> usize {
        self.index.len()
    }

    /// Renumbers clusters so exemplars appear in ascending group order.
    ///
    /// Reorders `exemplars`, `count`, `weights`, the rows of `means`, and
    /// the columns of `partition`, and remaps `index`. The scalar `wcss`
    /// and `converged` fields are untouched.
    pub fn sort_by_exemplar(&mut self) {
        let n_cluster = self.n_clusters();
        let mut order: Vec<usize> = (0..n_cluster).collect();
        order.sort_by_key(|&k| self.exemplars[k]);
        let mut inverse = vec![0; n_cluster];
        for (new, &old) in order.iter().enumerate() {
            inverse[old] = new;
        }

        self.exemplars = order.iter().map(|&k| self.exemplars[k]).collect();
        self.count = order.iter().map(|&k| self.count[k]).collect();
        self.weights = order.iter().map(|&k| self.weights[k]).collect();
        let mut means = std::mem::take(&mut self.means);
        self.means = order
            .iter()
            .map(|&k| std::mem::take(&mut means[k]))
            .collect();
        for row in &mut self.partition {
            *row = order.iter().map(|&k| row[k]).collect();
        }
        for idx in &mut self.index {
            *idx = inverse[*idx];
        }
    }
}

/// Graded memberships from squared distances to the cluster means.
///
/// `membership(g, k) = 1 / (d2(g, k)^e * sum_j d2(g, j)^-e)` with
/// `e = 2 / (m - 1)`, which normalizes each row to sum to one.
fn fuzzy_partition(rows: &[Vec<f64>], means: &[Vec<f64>], fuzziness: f64) -> Vec<Vec<f64>> {
    let exponent = 2.0 / (fuzziness - 1.0);
    rows.iter()
        .map(|row| {
            let dist2: Vec<f64> = means
                .iter()
                .map(|mean| squared_distance(row, mean).max(FUZZY_DIST_FLOOR))
                .collect();
            let total: f64 = dist2.iter().map(|&d| d.powf(-exponent)).sum();
            dist2
                .iter()
                .map(|&d| (d.powf(exponent) * total).recip())
                .collect()
        })
        .collect()
}
