//! Affinity propagation over group feature vectors.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::warn;

/// Relative magnitude of the tie-breaking noise added to the similarity
/// matrix.
const PERTURBATION_SCALE: f64 = 1e-8;

/// Affinity propagation clustering.
///
/// Exemplars are elected by message passing over a pairwise similarity
/// matrix (negative squared Euclidean distance). Every point carries the
/// same self-similarity (`preference`); lower values yield fewer clusters.
/// A seeded multiplicative perturbation breaks ties between equidistant
/// points, so repeated runs with the same seed produce identical results.
#[derive(Debug, Clone)]
pub struct AffinityPropagation {
    /// Damping factor applied to responsibility and availability updates,
    /// in `[0.5, 1)`.
    pub damping: f64,
    /// Maximum number of message-passing iterations.
    pub max_iter: usize,
    /// Consecutive iterations without exemplar change required to declare
    /// convergence.
    pub convergence_iter: usize,
    /// Self-similarity assigned to every point. `None` uses the median of
    /// the off-diagonal similarities.
    pub preference: Option<f64>,
    /// Seed for the tie-breaking perturbation.
    pub seed: u64,
}

/// Result of one affinity propagation run.
#[derive(Debug, Clone)]
pub struct AffinityOutcome {
    /// Row indices elected as exemplars. Refinement can move an exemplar
    /// to another member, so the list is not necessarily sorted.
    pub exemplars: Vec<usize>,
    /// Cluster assigned to each input row.
    pub index: Vec<usize>,
    /// Cluster means; row `k` is the feature vector of exemplar `k`.
    pub means: Vec<Vec<f64>>,
    /// Within-cluster sum of squared distances.
    pub wcss: f64,
    /// Whether the exemplar set stabilized before the iteration cap.
    pub converged: bool,
}

impl AffinityOutcome {
    /// Number of clusters found.
    pub fn n_clusters(&self) -> usize {
        self.exemplars.len()
    }
}

impl AffinityPropagation {
    /// Clusters `rows` and returns exemplars, assignments, and fit quality.
    ///
    /// Zero or one rows short-circuit to a trivial converged outcome. If
    /// message passing stabilizes on an empty exemplar set, the
    /// highest-scoring candidate row is elected so the outcome always
    /// contains at least one cluster.
    pub fn fit(&self, rows: &[Vec<f64>]) -> AffinityOutcome {
        let n = rows.len();
        if n <= 1 {
            return AffinityOutcome {
                exemplars: (0..n).collect(),
                index: vec![0; n],
                means: rows.to_vec(),
                wcss: 0.0,
                converged: true,
            };
        }

        // 1. Similarities with the preference on the diagonal.
        let mut s = similarity_matrix(rows);
        let preference = self
            .preference
            .unwrap_or_else(|| median_off_diagonal(&s));
        for (i, row) in s.iter_mut().enumerate() {
            row[i] = preference;
        }

        // 2. Seeded perturbation proportional to the smallest entry
        // magnitude. Identical inputs keep a zero matrix and stay exact.
        let mag = s
            .iter()
            .flatten()
            .fold(f64::INFINITY, |m, &v| m.min(v.abs()));
        let mut rng = StdRng::seed_from_u64(self.seed);
        for row in &mut s {
            for v in row.iter_mut() {
                *v += PERTURBATION_SCALE * mag * *v * (rng.random::<f64>() - 0.5);
            }
        }

        // 3. Message passing until the exemplar set holds still.
        let mut r = vec![vec![0.0; n]; n];
        let mut a = vec![vec![0.0; n]; n];
        let mut is_exemplar = vec![false; n];
        let mut iterations = 0;
        let mut stable = 0;
        while iterations < self.max_iter && stable < self.convergence_iter {
            self.update_responsibilities(&s, &a, &mut r);
            self.update_availabilities(&r, &mut a);

            let mut changed = false;
            for i in 0..n {
                let elected = a[i][i] + r[i][i] > 0.0;
                if elected != is_exemplar[i] {
                    changed = true;
                    is_exemplar[i] = elected;
                }
            }
            stable = if changed { 0 } else { stable + 1 };
            iterations += 1;
        }
        let converged = stable >= self.convergence_iter;

        // 4. Back to distances: drop the preference and negate.
        for (i, row) in s.iter_mut().enumerate() {
            row[i] = 0.0;
        }
        for row in &mut s {
            for v in row.iter_mut() {
                *v = -*v;
            }
        }

        let mut exemplars: Vec<usize> = (0..n).filter(|&i| is_exemplar[i]).collect();
        if exemplars.is_empty() {
            // No point elected itself; take the highest-scoring candidate.
            let mut best = 0;
            let mut best_score = f64::NEG_INFINITY;
            for i in 0..n {
                let score = a[i][i] + r[i][i];
                if score > best_score {
                    best_score = score;
                    best = i;
                }
            }
            warn!(candidate = best, "no exemplars elected, using best candidate row");
            exemplars.push(best);
        }

        // 5. Assign, then move each exemplar of a cluster with more than
        // two members to the member minimizing total within-cluster
        // distance, and assign again.
        let index = assign_nearest(&s, &exemplars);
        for k in 0..exemplars.len() {
            let members: Vec<usize> = (0..n).filter(|&i| index[i] == k).collect();
            if members.len() > 2 {
                let mut best = members[0];
                let mut best_total = f64::INFINITY;
                for &i in &members {
                    let total: f64 = members.iter().map(|&j| s[i][j]).sum();
                    if total < best_total {
                        best_total = total;
                        best = i;
                    }
                }
                exemplars[k] = best;
            }
        }
        let index = assign_nearest(&s, &exemplars);

        let means: Vec<Vec<f64>> = exemplars.iter().map(|&e| rows[e].clone()).collect();
        let wcss = within_cluster_sum(rows, &index, &means);

        AffinityOutcome {
            exemplars,
            index,
            means,
            wcss,
            converged,
        }
    }

    /// Damped responsibility update: `r[i][k]` trends toward `s[i][k]`
    /// minus the best competing `a + s` in row `i`.
    fn update_responsibilities(&self, s: &[Vec<f64>], a: &[Vec<f64>], r: &mut [Vec<f64>]) {
        let n = s.len();
        for i in 0..n {
            let mut best = f64::NEG_INFINITY;
            let mut best_k = 0;
            let mut second = f64::NEG_INFINITY;
            for k in 0..n {
                let m = a[i][k] + s[i][k];
                if m > best {
                    second = best;
                    best = m;
                    best_k = k;
                } else if m > second {
                    second = m;
                }
            }
            for k in 0..n {
                let competitor = if k == best_k { second } else { best };
                let update = s[i][k] - competitor;
                r[i][k] = self.damping * r[i][k] + (1.0 - self.damping) * update;
            }
        }
    }

    /// Damped availability update from the positive responsibilities.
    fn update_availabilities(&self, r: &[Vec<f64>], a: &mut [Vec<f64>]) {
        let n = r.len();
        // support[k] = sum over i' != k of max(0, r[i'][k])
        let mut support = vec![0.0; n];
        for (i, row) in r.iter().enumerate() {
            for (k, &v) in row.iter().enumerate() {
                if i != k {
                    support[k] += v.max(0.0);
                }
            }
        }
        for i in 0..n {
            for k in 0..n {
                let update = if i == k {
                    support[k]
                } else {
                    (r[k][k] + support[k] - r[i][k].max(0.0)).min(0.0)
                };
                a[i][k] = self.damping * a[i][k] + (1.0 - self.damping) * update;
            }
        }
    }
}

/// Negative squared Euclidean distance between each pair of rows.
fn similarity_matrix(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|a| rows.iter().map(|b| -squared_distance(a, b)).collect())
        .collect()
}

/// Median similarity between distinct rows. The default preference when
/// none is configured.
pub fn median_similarity(rows: &[Vec<f64>]) -> f64 {
    median_off_diagonal(&similarity_matrix(rows))
}

fn median_off_diagonal(s: &[Vec<f64>]) -> f64 {
    let mut values: Vec<f64> = s
        .iter()
        .enumerate()
        .flat_map(|(i, row)| {
            row.iter()
                .enumerate()
                .filter(move |&(j, _)| j != i)
                .map(|(_, &v)| v)
        })
        .collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Squared Euclidean distance between two feature vectors.
pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Nearest-exemplar assignment over a distance matrix, first minimum on
/// ties.
fn assign_nearest(dist: &[Vec<f64>], exemplars: &[usize]) -> Vec<usize> {
    dist.iter()
        .map(|row| {
            let mut best_k = 0;
            let mut best = f64::INFINITY;
            for (k, &e) in exemplars.iter().enumerate() {
                if row[e] < best {
                    best = row[e];
                    best_k = k;
                }
            }
            best_k
        })
        .collect()
}

/// Total squared distance of each row to its assigned cluster mean.
fn within_cluster_sum(rows: &[Vec<f64>], index: &[usize], means: &[Vec<f64>]) -> f64 {
    rows.iter()
        .zip(index)
        .map(|(row, &k)| squared_distance(row, &means[k]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_alg() -> AffinityPropagation {
        AffinityPropagation {
            damping: 0.5,
            max_iter: 200,
            convergence_iter: 10,
            preference: None,
            seed: 123,
        }
    }

    /// Two tight blobs far apart, every point distinct.
    fn two_blobs() -> Vec<Vec<f64>> {
        let mut rows = Vec::new();
        for i in 0..6 {
            rows.push(vec![0.01 * i as f64, 0.02 * i as f64]);
        }
        for i in 0..6 {
            rows.push(vec![10.0 + 0.01 * i as f64, 10.0 - 0.01 * i as f64]);
        }
        rows
    }

    #[test]
    fn separates_two_blobs() {
        let outcome = default_alg().fit(&two_blobs());
        assert!(outcome.converged);
        assert_eq!(outcome.n_clusters(), 2);
        let first = outcome.index[0];
        assert!(outcome.index[..6].iter().all(|&k| k == first));
        assert!(outcome.index[6..].iter().all(|&k| k != first));
    }

    #[test]
    fn means_are_exemplar_rows() {
        let rows = two_blobs();
        let outcome = default_alg().fit(&rows);
        for (k, &e) in outcome.exemplars.iter().enumerate() {
            assert_eq!(outcome.means[k], rows[e]);
        }
    }

    #[test]
    fn identical_rows_collapse_to_one_cluster() {
        let rows = vec![vec![0.4, 0.6, 0.2]; 8];
        let outcome = default_alg().fit(&rows);
        assert!(outcome.converged);
        assert_eq!(outcome.n_clusters(), 1);
        assert_eq!(outcome.exemplars, vec![0]);
        assert!(outcome.index.iter().all(|&k| k == 0));
        assert_eq!(outcome.wcss, 0.0);
    }

    #[test]
    fn refinement_picks_central_member() {
        // Collinear values: the middle point minimizes total squared
        // distance within each group of five.
        let rows: Vec<Vec<f64>> = [0.0, 1.0, 2.0, 3.0, 4.0, 100.0, 101.0, 102.0, 103.0, 104.0]
            .iter()
            .map(|&v| vec![v])
            .collect();
        let mut alg = default_alg();
        alg.preference = Some(-200.0);
        let outcome = alg.fit(&rows);
        assert_eq!(outcome.exemplars, vec![2, 7]);
        assert_eq!(outcome.index, vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);
        // Each group contributes 4 + 1 + 0 + 1 + 4.
        assert!((outcome.wcss - 20.0).abs() < 1e-9);
        assert!(outcome.converged);
    }

    #[test]
    fn seeded_runs_are_identical() {
        let rows = two_blobs();
        let a = default_alg().fit(&rows);
        let b = default_alg().fit(&rows);
        assert_eq!(a.exemplars, b.exemplars);
        assert_eq!(a.index, b.index);
        assert_eq!(a.wcss, b.wcss);
    }

    #[test]
    fn reports_divergence_when_iteration_budget_is_too_small() {
        let mut alg = default_alg();
        alg.max_iter = 3;
        let outcome = alg.fit(&two_blobs());
        assert!(!outcome.converged);
        assert!(outcome.n_clusters() >= 1);
    }

    #[test]
    fn median_similarity_excludes_self_pairs() {
        let rows = vec![vec![0.0], vec![1.0], vec![3.0]];
        // Pairwise squared distances 1, 9, 4, each appearing twice.
        assert_eq!(median_similarity(&rows), -4.0);
    }

    #[test]
    fn single_row_is_its_own_cluster() {
        let rows = vec![vec![1.0, 2.0]];
        let outcome = default_alg().fit(&rows);
        assert!(outcome.converged);
        assert_eq!(outcome.exemplars, vec![0]);
        assert_eq!(outcome.index, vec![0]);
        assert_eq!(outcome.wcss, 0.0);
    }
}
