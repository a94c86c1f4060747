//! End-to-end pipeline from weather input to clusters and schedules.

use std::fmt;

use tracing::{debug, info};

use crate::DAYS_PER_YEAR;
use crate::annual;
use crate::cluster::{BoundaryAssignment, ClusterSet, assign_boundaries, create_clusters};
use crate::config::RunConfig;
use crate::metrics::{
    HourlySet, NoFeaturesError, ShapeError, SourceSeries, assemble_groups, build_daily_tables,
};
use crate::schedule::{
    SimulationSchedule, battery_initial_soc, build_schedules, csp_initial_soc, lead_in_prior_day,
};
use crate::solar::DaylightWindow;
use crate::weather::WeatherData;

/// Error raised while running the clustering pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// An input series does not fit the annual grid.
    Shape(ShapeError),
    /// The metric weighting selects no features to cluster on.
    NoFeatures(NoFeaturesError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Shape(e) => write!(f, "{e}"),
            PipelineError::NoFeatures(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Shape(e) => Some(e),
            PipelineError::NoFeatures(e) => Some(e),
        }
    }
}

impl From<ShapeError> for PipelineError {
    fn from(e: ShapeError) -> Self {
        PipelineError::Shape(e)
    }
}

impl From<NoFeaturesError> for PipelineError {
    fn from(e: NoFeaturesError) -> Self {
        PipelineError::NoFeatures(e)
    }
}

/// Complete clustering result: the cluster partition, boundary handling,
/// simulation schedules, and the per-day insolation needed for initial
/// storage states.
#[derive(Debug, Clone)]
pub struct ClusterRun {
    /// Cluster partition of the interior simulation groups.
    pub clusters: ClusterSet,
    /// Boundary-day assignment and adjusted cluster weights.
    pub boundary: BoundaryAssignment,
    /// One simulation window per cluster, in cluster order.
    pub schedules: Vec<SimulationSchedule>,
    /// Direct-normal insolation total per day (kWh/m2/day), after stow.
    pub daily_dni_kwh: Vec<f64>,
    /// Days per simulation group.
    pub ndays: usize,
}

impl ClusterRun {
    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.clusters.n_clusters()
    }

    /// Expands per-exemplar simulation output to a full annual series.
    ///
    /// `exemplar_data` is an annual grid that is populated only inside the
    /// exemplar solution windows; see [`annual::annualize`].
    ///
    /// # Errors
    ///
    /// Returns a [`ShapeError`] when `exemplar_data` is not a whole number
    /// of year-grids long.
    pub fn annualize(&self, exemplar_data: &[f64]) -> Result<Vec<f64>, ShapeError> {
        annual::annualize(exemplar_data, &self.clusters, Some(&self.boundary), self.ndays)
    }

    /// Boolean variant of [`ClusterRun::annualize`].
    ///
    /// # Errors
    ///
    /// Returns a [`ShapeError`] when `exemplar_data` is not a whole number
    /// of year-grids long.
    pub fn annualize_bool(&self, exemplar_data: &[f64]) -> Result<Vec<bool>, ShapeError> {
        annual::annualize_bool(exemplar_data, &self.clusters, Some(&self.boundary), self.ndays)
    }

    /// Initial CSP storage charge (% of capacity) for one cluster's
    /// simulation window, estimated from the insolation of the day before
    /// the window starts.
    pub fn csp_soc(&self, cluster: usize, solar_multiple: Option<f64>) -> f64 {
        let prior = lead_in_prior_day(self.schedules[cluster].start_day);
        csp_initial_soc(self.daily_dni_kwh[prior], solar_multiple)
    }

    /// Initial battery charge (% of capacity) for every cluster window.
    pub fn battery_soc(&self) -> f64 {
        battery_initial_soc()
    }

    /// Per-cluster summary table, in cluster order.
    pub fn summary_rows(&self) -> Vec<ClusterRow> {
        (0..self.n_clusters())
            .map(|k| ClusterRow {
                cluster: k,
                exemplar_group: self.clusters.exemplars[k],
                members: self.clusters.count[k],
                start_day: self.schedules[k].start_day,
                weight: self.clusters.weights[k],
                adjusted_weight: self.boundary.adjusted_weights[k],
                sim_begin_s: self.schedules[k].sim_begin_s,
                sim_end_s: self.schedules[k].sim_end_s,
            })
            .collect()
    }
}

/// One row of the per-cluster summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRow {
    /// Cluster index in exemplar order.
    pub cluster: usize,
    /// Group index of the cluster exemplar.
    pub exemplar_group: usize,
    /// Number of member groups.
    pub members: usize,
    /// First simulated-solution day of the exemplar window (1-based).
    pub start_day: usize,
    /// Fraction of interior groups in this cluster.
    pub weight: f64,
    /// Annual weight with the boundary days folded in.
    pub adjusted_weight: f64,
    /// Simulation window start, seconds from the start of the year.
    pub sim_begin_s: u64,
    /// Simulation window end, seconds from the start of the year.
    pub sim_end_s: u64,
}

impl fmt::Display for ClusterRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cluster={:>3} | exemplar group {:>3} starts day {:>3} | members={:>3}  \
             weight={:.4}  adjusted={:.4} | sim window [{}s, {}s)",
            self.cluster,
            self.exemplar_group,
            self.start_day,
            self.members,
            self.weight,
            self.adjusted_weight,
            self.sim_begin_s,
            self.sim_end_s,
        )
    }
}

/// Aggregate summary of a clustering run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Number of interior simulation groups.
    pub n_groups: usize,
    /// Days per group.
    pub ndays: usize,
    /// Number of clusters found.
    pub n_clusters: usize,
    /// Whether the final affinity propagation attempt converged.
    pub converged: bool,
    /// Within-cluster sum of squared feature distances.
    pub wcss: f64,
    /// Days covered by the exemplar simulation windows, lead-in/out included.
    pub simulated_days: usize,
    /// Cluster assigned to the first days of the year.
    pub first_cluster: usize,
    /// Cluster assigned to the last days of the year.
    pub last_cluster: usize,
}

impl RunSummary {
    /// Summarizes a completed run.
    pub fn from_run(run: &ClusterRun) -> Self {
        Self {
            n_groups: run.clusters.n_groups(),
            ndays: run.ndays,
            n_clusters: run.n_clusters(),
            converged: run.clusters.converged,
            wcss: run.clusters.wcss,
            simulated_days: run.n_clusters() * (run.ndays + 2),
            first_cluster: run.boundary.first_cluster,
            last_cluster: run.boundary.last_cluster,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = 100.0 * self.simulated_days as f64 / DAYS_PER_YEAR as f64;
        let converged = if self.converged { "converged" } else { "not converged" };
        writeln!(f, "--- Clustering Summary ---")?;
        writeln!(f, "Groups:             {} x {} days", self.n_groups, self.ndays)?;
        writeln!(f, "Clusters:           {} ({converged})", self.n_clusters)?;
        writeln!(f, "Within-cluster SS:  {:.4}", self.wcss)?;
        writeln!(
            f,
            "Days simulated:     {} of {DAYS_PER_YEAR} ({pct:.1}%)",
            self.simulated_days
        )?;
        write!(
            f,
            "Boundary clusters:  first year days -> {}, last -> {}",
            self.first_cluster, self.last_cluster
        )
    }
}

/// Runs the complete clustering pipeline.
///
/// Assembles the canonical hourly series, builds daily metric tables over
/// the solstice daylight window, folds them into multi-day group features,
/// clusters the groups, assigns the boundary days, and lays out one
/// simulation window per exemplar.
///
/// `config` is taken as given; call [`RunConfig::validate`] first to reject
/// out-of-range parameters with field-level messages.
///
/// # Errors
///
/// Returns a [`PipelineError`] when an input series does not fit the annual
/// grid or the metric weighting selects no features.
pub fn run_clustering(
    weather: &WeatherData,
    wind_resource: Option<&[f64]>,
    price: Option<&[f64]>,
    config: &RunConfig,
) -> Result<ClusterRun, PipelineError> {
    let metric_config = config.metric_config();
    let price_weighted = metric_config
        .active()
        .any(|m| m.source() == SourceSeries::Price);

    let set = HourlySet::assemble(
        weather,
        wind_resource,
        price,
        &config.technologies.active,
        config.price_cutoff(),
        price_weighted,
    )?;

    let daylight = DaylightWindow::on_summer_solstice(
        weather.site.latitude,
        weather.site.longitude,
        weather.site.time_zone,
    );
    debug!(
        sunrise_hr = daylight.sunrise_hr,
        sunset_hr = daylight.sunset_hr,
        "solstice daylight window"
    );

    let ndays = config.clustering.ndays;
    let tables = build_daily_tables(&set, &metric_config, &daylight);
    let features = assemble_groups(&tables, &metric_config, ndays)?;

    let clusters = create_clusters(&features.rows, &config.cluster_options());
    let boundary = assign_boundaries(&clusters, &features.first, &features.last, ndays);
    let schedules = build_schedules(&clusters.exemplars, ndays);
    info!(
        n_groups = clusters.n_groups(),
        n_clusters = clusters.n_clusters(),
        converged = clusters.converged,
        "clustering complete"
    );

    Ok(ClusterRun {
        clusters,
        boundary,
        schedules,
        daily_dni_kwh: set.daily_dni_kwh,
        ndays,
    })
}
