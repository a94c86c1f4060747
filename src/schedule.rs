//! Simulation calendars and initial-state heuristics for cluster
//! exemplars.

const SECONDS_PER_DAY: u64 = 86_400;

/// Prior-day insolation below this total (kWh/m2/day) counts as a poor
/// lead-in day for thermal storage.
const LOW_INSOLATION_KWH: f64 = 6.0;

/// Simulation calendar for one cluster exemplar.
///
/// The simulated span includes one unmodeled lead day before and one
/// trailing day after the counted window; the solution span covers the
/// counted days only. All times are seconds since the start of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSchedule {
    /// Cluster this schedule belongs to.
    pub cluster: usize,
    /// First counted day of the exemplar group (0-based day of year).
    pub start_day: usize,
    /// Start of the simulated span.
    pub sim_begin_s: u64,
    /// End of the simulated span (exclusive).
    pub sim_end_s: u64,
    /// Start of the solution span.
    pub sol_begin_s: u64,
    /// End of the solution span (exclusive).
    pub sol_end_s: u64,
}

impl SimulationSchedule {
    /// Builds the schedule for cluster `cluster` whose exemplar is the
    /// interior group `exemplar` of an `ndays` grouping.
    pub fn for_exemplar(cluster: usize, exemplar: usize, ndays: usize) -> Self {
        let start_day = 1 + exemplar * ndays;
        let d = start_day as u64;
        let n = ndays as u64;
        SimulationSchedule {
            cluster,
            start_day,
            sim_begin_s: (d - 1) * SECONDS_PER_DAY,
            sim_end_s: (d + n + 1) * SECONDS_PER_DAY,
            sol_begin_s: d * SECONDS_PER_DAY,
            sol_end_s: (d + n) * SECONDS_PER_DAY,
        }
    }
}

/// Schedules for every cluster of a sorted cluster set, in cluster order.
pub fn build_schedules(exemplars: &[usize], ndays: usize) -> Vec<SimulationSchedule> {
    exemplars
        .iter()
        .enumerate()
        .map(|(k, &e)| SimulationSchedule::for_exemplar(k, e, ndays))
        .collect()
}

/// Day whose insolation total feeds the thermal-storage heuristic: the
/// day before the unmodeled lead day, clamped at the start of the year.
pub fn lead_in_prior_day(start_day: usize) -> usize {
    start_day.saturating_sub(2)
}

/// Initial thermal-storage charge (%) for a concentrating-solar plant at
/// the start of a cluster's simulated span.
///
/// One extra day is simulated ahead of the counted window, so the value
/// only needs to produce a reasonable charge state after that lead day.
pub fn csp_initial_soc(prior_day_insolation_kwh: f64, solar_multiple: Option<f64>) -> f64 {
    match solar_multiple {
        None => 10.0,
        Some(sm) if prior_day_insolation_kwh < LOW_INSOLATION_KWH || sm < 1.5 => 5.0,
        Some(sm) if sm < 2.0 => 10.0,
        Some(_) => 20.0,
    }
}

/// Initial battery charge (%) at the start of a cluster's simulated span.
pub fn battery_initial_soc() -> f64 {
    0.0
}
