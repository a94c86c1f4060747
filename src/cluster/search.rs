//! Preference-multiplier search toward a target cluster count.

/// Damping increase applied after a diverged attempt.
const DAMPING_STEP: f64 = 0.05;

/// Upper damping bound reached through retries.
const DAMPING_CAP: f64 = 0.95;

/// Under-relaxation factor applied to the secant extrapolation.
const SECANT_RELAXATION: f64 = 0.85;

/// Rule that produced a proposed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRule {
    /// Scale by achieved count over target count.
    Proportional,
    /// Linear extrapolation over the last two successful attempts.
    Secant,
}

/// Next action after recording a clustering attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchStep {
    /// The attempt diverged. Rerun the same multiplier with more damping.
    RetrySame,
    /// Rerun with the proposed multiplier.
    Propose { multiplier: f64, rule: UpdateRule },
    /// The attempt landed within tolerance of the target count.
    Converged,
    /// The attempt budget is spent; keep the last result.
    Exhausted,
}

/// Searches for the preference multiplier that makes affinity propagation
/// yield a target number of clusters.
///
/// The caller runs one clustering attempt per step, using [`multiplier`]
/// and [`damping`], then feeds the outcome to [`record`] and acts on the
/// returned [`SearchStep`]. Diverged attempts raise damping and repeat the
/// multiplier; converged attempts reset damping and move the multiplier by
/// a proportional or under-relaxed secant rule. Every attempt consumes
/// budget.
///
/// [`multiplier`]: PreferenceSearch::multiplier
/// [`damping`]: PreferenceSearch::damping
/// [`record`]: PreferenceSearch::record
#[derive(Debug, Clone)]
pub struct PreferenceSearch {
    target: usize,
    tolerance: usize,
    budget: usize,
    base_damping: f64,
    damping: f64,
    multiplier: f64,
    /// Last converged attempt as `(multiplier, n_clusters)`.
    previous: Option<(f64, usize)>,
    attempts: usize,
}

impl PreferenceSearch {
    /// Creates a search for `target` clusters (`target >= 1`) accepting
    /// counts within `tolerance`, allowing `budget` attempts and starting
    /// from the configured `damping`.
    pub fn new(target: usize, tolerance: usize, budget: usize, damping: f64) -> Self {
        PreferenceSearch {
            target,
            tolerance,
            budget,
            base_damping: damping,
            damping,
            multiplier: 1.0,
            previous: None,
            attempts: 0,
        }
    }

    /// Multiplier for the next attempt.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Damping for the next attempt.
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Attempts recorded so far.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Records an attempt run at the current multiplier and damping and
    /// decides the next step.
    pub fn record(&mut self, n_clusters: usize, converged: bool) -> SearchStep {
        self.attempts += 1;
        if !converged {
            self.damping = (self.damping + DAMPING_STEP).min(DAMPING_CAP);
            return self.bounded(SearchStep::RetrySame);
        }

        self.damping = self.base_damping;
        if n_clusters.abs_diff(self.target) <= self.tolerance {
            return SearchStep::Converged;
        }

        let achieved = n_clusters as f64;
        let proportional = self.multiplier * achieved / self.target as f64;
        let (next, rule) = match self.previous {
            Some((prev_mult, prev_n)) if prev_n != n_clusters => {
                let slope = (achieved - prev_n as f64) / (self.multiplier - prev_mult);
                let secant =
                    self.multiplier - SECANT_RELAXATION * (achieved - self.target as f64) / slope;
                if secant > 0.0 {
                    (secant, UpdateRule::Secant)
                } else {
                    (proportional, UpdateRule::Proportional)
                }
            }
            _ => (proportional, UpdateRule::Proportional),
        };
        self.previous = Some((self.multiplier, n_clusters));
        self.multiplier = next;
        self.bounded(SearchStep::Propose {
            multiplier: next,
            rule,
        })
    }

    /// Downgrades the step to `Exhausted` once the budget is spent.
    fn bounded(&self, step: SearchStep) -> SearchStep {
        if self.attempts >= self.budget {
            SearchStep::Exhausted
        } else {
            step
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_inside_tolerance() {
        let mut search = PreferenceSearch::new(20, 0, 50, 0.5);
        assert_eq!(search.record(20, true), SearchStep::Converged);
        assert_eq!(search.attempts(), 1);

        let mut wide = PreferenceSearch::new(20, 2, 50, 0.5);
        assert_eq!(wide.record(18, true), SearchStep::Converged);
        let mut off = PreferenceSearch::new(20, 2, 50, 0.5);
        assert!(matches!(off.record(17, true), SearchStep::Propose { .. }));
    }

    #[test]
    fn diverged_attempt_bumps_damping_and_keeps_multiplier() {
        let mut search = PreferenceSearch::new(20, 0, 50, 0.8);
        assert_eq!(search.record(5, false), SearchStep::RetrySame);
        assert!((search.damping() - 0.85).abs() < 1e-12);
        assert_eq!(search.multiplier(), 1.0);
        search.record(5, false);
        search.record(5, false);
        assert!((search.damping() - 0.95).abs() < 1e-12);
        search.record(5, false);
        assert!((search.damping() - 0.95).abs() < 1e-12);
    }

    #[test]
    fn damping_resets_after_a_converged_attempt() {
        let mut search = PreferenceSearch::new(20, 0, 50, 0.5);
        search.record(5, false);
        assert!((search.damping() - 0.55).abs() < 1e-12);
        assert!(matches!(search.record(30, true), SearchStep::Propose { .. }));
        assert!((search.damping() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn first_proposal_is_proportional() {
        let mut search = PreferenceSearch::new(20, 0, 50, 0.5);
        let step = search.record(30, true);
        match step {
            SearchStep::Propose { multiplier, rule } => {
                assert!((multiplier - 1.5).abs() < 1e-12);
                assert_eq!(rule, UpdateRule::Proportional);
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert!((search.multiplier() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn unchanged_count_stays_proportional() {
        let mut search = PreferenceSearch::new(20, 0, 50, 0.5);
        search.record(30, true);
        let step = search.record(30, true);
        match step {
            SearchStep::Propose { multiplier, rule } => {
                assert!((multiplier - 2.25).abs() < 1e-12);
                assert_eq!(rule, UpdateRule::Proportional);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn secant_extrapolates_between_successful_attempts() {
        let mut search = PreferenceSearch::new(20, 0, 50, 0.5);
        search.record(30, true);
        let step = search.record(26, true);
        // slope (26 - 30) / (1.5 - 1.0) = -8, so the update adds
        // 0.85 * 6 / 8 to the multiplier.
        match step {
            SearchStep::Propose { multiplier, rule } => {
                assert!((multiplier - 2.1375).abs() < 1e-12);
                assert_eq!(rule, UpdateRule::Secant);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn nonpositive_secant_falls_back_to_proportional() {
        let mut search = PreferenceSearch::new(20, 0, 50, 0.5);
        search.record(2, true);
        let step = search.record(10, true);
        match step {
            SearchStep::Propose { multiplier, rule } => {
                assert!((multiplier - 0.05).abs() < 1e-12);
                assert_eq!(rule, UpdateRule::Proportional);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn budget_exhaustion_is_reported() {
        let mut search = PreferenceSearch::new(20, 0, 2, 0.5);
        assert!(matches!(search.record(30, true), SearchStep::Propose { .. }));
        assert_eq!(search.record(25, true), SearchStep::Exhausted);
    }

    #[test]
    fn convergence_on_the_last_attempt_wins() {
        let mut search = PreferenceSearch::new(20, 0, 2, 0.5);
        search.record(30, true);
        assert_eq!(search.record(20, true), SearchStep::Converged);
    }

    #[test]
    fn diverged_attempts_consume_budget() {
        let mut search = PreferenceSearch::new(20, 0, 2, 0.5);
        assert_eq!(search.record(5, false), SearchStep::RetrySame);
        assert_eq!(search.record(5, false), SearchStep::Exhausted);
    }
}
