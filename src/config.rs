//! TOML-based run configuration and preset definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::cluster::{ClusterOptions, Partitioning};
use crate::metrics::groups::interior_group_count;
use crate::metrics::{Metric, MetricConfig, Technology};

/// Top-level run configuration parsed from TOML.
///
/// All fields have defaults matching the baseline run. Load from TOML
/// with [`RunConfig::from_toml_file`] or use [`RunConfig::baseline`] for
/// the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Day grouping and affinity propagation parameters.
    #[serde(default)]
    pub clustering: ClusteringConfig,
    /// Price-series preparation parameters.
    #[serde(default)]
    pub price: PriceConfig,
    /// Technologies selecting the default metric weighting.
    #[serde(default)]
    pub technologies: TechnologiesConfig,
    /// Full metric-weight override; unset metrics get weight 0.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    /// Sub-day division override; unset metrics get one division.
    #[serde(default)]
    pub divisions: BTreeMap<String, usize>,
}

/// Day grouping and affinity propagation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusteringConfig {
    /// Days per simulation group (1..=363).
    pub ndays: usize,
    /// Target number of clusters (must be > 0).
    pub n_cluster: usize,
    /// Maximum affinity propagation iterations per attempt.
    pub max_iter: usize,
    /// Damping factor for message updates, [0.0, 1.0).
    pub damping: f64,
    /// Iterations without exemplar change to declare convergence.
    pub convergence_iter: usize,
    /// Preference multiplier used when count enforcement is off.
    pub preference_mult: f64,
    /// Search for a multiplier that yields `n_cluster` clusters.
    pub enforce_cluster_count: bool,
    /// Acceptable deviation from the target count.
    pub enforce_tolerance: usize,
    /// Attempt budget for the count search.
    pub enforce_max_iter: usize,
    /// One-hot partition matrix; `false` builds graded memberships.
    pub hard_partitions: bool,
    /// Fuzziness exponent, read only when `hard_partitions = false`.
    pub fuzziness: f64,
    /// Seed for the similarity perturbation.
    pub seed: u64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            ndays: 2,
            n_cluster: 20,
            max_iter: 200,
            damping: 0.5,
            convergence_iter: 10,
            preference_mult: 1.0,
            enforce_cluster_count: true,
            enforce_tolerance: 0,
            enforce_max_iter: 50,
            hard_partitions: true,
            fuzziness: 2.0,
            seed: 123,
        }
    }
}

/// Price-series preparation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceConfig {
    /// Compress price outliers before averaging.
    pub limit_outliers: bool,
    /// Interquartile-range multiple where compression starts.
    pub cutoff_iqr: f64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            limit_outliers: true,
            cutoff_iqr: 3.5,
        }
    }
}

/// Technologies selecting the default metric weighting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TechnologiesConfig {
    /// Active technology identifiers.
    pub active: Vec<Technology>,
}

impl Default for TechnologiesConfig {
    fn default() -> Self {
        Self {
            active: vec![Technology::Tower, Technology::Battery],
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"clustering.ndays"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl RunConfig {
    /// Returns the baseline run: tower + battery with default weighting.
    pub fn baseline() -> Self {
        Self {
            clustering: ClusteringConfig::default(),
            price: PriceConfig::default(),
            technologies: TechnologiesConfig::default(),
            weights: BTreeMap::new(),
            divisions: BTreeMap::new(),
        }
    }

    /// Returns the PV-plus-battery preset.
    pub fn pv_battery() -> Self {
        Self {
            technologies: TechnologiesConfig {
                active: vec![Technology::Pv, Technology::Battery],
            },
            ..Self::baseline()
        }
    }

    /// Returns the coarse preset: three-day groups, fewer clusters, and a
    /// one-cluster tolerance.
    pub fn coarse() -> Self {
        Self {
            clustering: ClusteringConfig {
                ndays: 3,
                n_cluster: 10,
                enforce_tolerance: 1,
                ..ClusteringConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "pv_battery", "coarse"];

    /// Loads a run configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "pv_battery" => Ok(Self::pv_battery()),
            "coarse" => Ok(Self::coarse()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a run configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a run configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let c = &self.clustering;

        if c.ndays == 0 || c.ndays > 363 {
            errors.push(ConfigError {
                field: "clustering.ndays".into(),
                message: "must be in 1..=363".into(),
            });
        }
        if c.n_cluster == 0 {
            errors.push(ConfigError {
                field: "clustering.n_cluster".into(),
                message: "must be > 0".into(),
            });
        } else if (1..=363).contains(&c.ndays) && c.n_cluster > interior_group_count(c.ndays) {
            errors.push(ConfigError {
                field: "clustering.n_cluster".into(),
                message: format!(
                    "must be <= the {} groups a {}-day grouping produces",
                    interior_group_count(c.ndays),
                    c.ndays
                ),
            });
        }
        if c.max_iter == 0 {
            errors.push(ConfigError {
                field: "clustering.max_iter".into(),
                message: "must be > 0".into(),
            });
        }
        if c.convergence_iter == 0 {
            errors.push(ConfigError {
                field: "clustering.convergence_iter".into(),
                message: "must be > 0".into(),
            });
        }
        if !(0.0..1.0).contains(&c.damping) {
            errors.push(ConfigError {
                field: "clustering.damping".into(),
                message: "must be in [0.0, 1.0)".into(),
            });
        }
        if c.preference_mult <= 0.0 {
            errors.push(ConfigError {
                field: "clustering.preference_mult".into(),
                message: "must be > 0".into(),
            });
        }
        if c.enforce_max_iter == 0 {
            errors.push(ConfigError {
                field: "clustering.enforce_max_iter".into(),
                message: "must be > 0".into(),
            });
        }
        if !c.hard_partitions && c.fuzziness <= 1.0 {
            errors.push(ConfigError {
                field: "clustering.fuzziness".into(),
                message: "must be > 1 when hard_partitions is false".into(),
            });
        }

        if self.price.cutoff_iqr <= 0.0 {
            errors.push(ConfigError {
                field: "price.cutoff_iqr".into(),
                message: "must be > 0".into(),
            });
        }

        if self.technologies.active.is_empty() && self.weights.is_empty() {
            errors.push(ConfigError {
                field: "technologies.active".into(),
                message: "must name a technology unless [weights] overrides are given".into(),
            });
        }

        for (key, &value) in &self.weights {
            if Metric::from_name(key).is_none() {
                errors.push(ConfigError {
                    field: format!("weights.{key}"),
                    message: "unknown metric name".into(),
                });
            } else if value < 0.0 {
                errors.push(ConfigError {
                    field: format!("weights.{key}"),
                    message: "must be >= 0".into(),
                });
            }
        }
        for (key, &value) in &self.divisions {
            if Metric::from_name(key).is_none() {
                errors.push(ConfigError {
                    field: format!("divisions.{key}"),
                    message: "unknown metric name".into(),
                });
            } else if value == 0 {
                errors.push(ConfigError {
                    field: format!("divisions.{key}"),
                    message: "must be > 0".into(),
                });
            }
        }

        errors
    }

    /// Metric weighting implied by this configuration: the technology
    /// defaults, or the full `[weights]`/`[divisions]` override when
    /// either table is present.
    pub fn metric_config(&self) -> MetricConfig {
        if self.weights.is_empty() && self.divisions.is_empty() {
            MetricConfig::defaults(&self.technologies.active)
        } else {
            MetricConfig::with_overrides(&self.technologies.active, &self.weights, &self.divisions)
        }
    }

    /// Clustering knobs implied by this configuration.
    pub fn cluster_options(&self) -> ClusterOptions {
        let c = &self.clustering;
        ClusterOptions {
            n_cluster: c.n_cluster,
            max_iter: c.max_iter,
            damping: c.damping,
            convergence_iter: c.convergence_iter,
            preference_mult: c.preference_mult,
            enforce_count: c.enforce_cluster_count,
            enforce_tolerance: c.enforce_tolerance,
            enforce_attempts: c.enforce_max_iter,
            partitioning: if c.hard_partitions {
                Partitioning::Hard
            } else {
                Partitioning::Fuzzy {
                    fuzziness: c.fuzziness,
                }
            },
            seed: c.seed,
        }
    }

    /// Outlier cutoff for price preparation, `None` when compression is
    /// disabled.
    pub fn price_cutoff(&self) -> Option<f64> {
        self.price.limit_outliers.then_some(self.price.cutoff_iqr)
    }
}
