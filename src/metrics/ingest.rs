//! Canonical hourly-series assembly: stow truncation, price preparation, and
//! per-day insolation totals.

use std::fmt;

use tracing::warn;

use crate::weather::WeatherData;
use crate::{DAYS_PER_YEAR, HOURS_PER_YEAR};

use super::types::{SourceSeries, Technology};

/// Stow wind speed for power towers (m/s).
pub const TOWER_STOW_WSPD: f64 = 15.0;
/// Stow wind speed for parabolic troughs (m/s).
pub const TROUGH_STOW_WSPD: f64 = 25.0;

/// A primary series does not fit the expected annual grid.
#[derive(Debug)]
pub struct ShapeError {
    /// Series the error was raised for.
    pub series: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data shape error: {} — {}", self.series, self.message)
    }
}

impl std::error::Error for ShapeError {}

/// Canonical per-source hourly series for one clustering run, all on the
/// same 8760-hour annual grid.
#[derive(Debug, Clone)]
pub struct HourlySet {
    /// Direct normal irradiance, zeroed where collectors are stowed (W/m2).
    pub dni: Vec<f64>,
    /// Global horizontal irradiance (W/m2).
    pub ghi: Vec<f64>,
    /// Dry-bulb temperature (C).
    pub tdry: Vec<f64>,
    /// Wind speed at the solar-resource location, clipped at the stow limit (m/s).
    pub wspd_solar: Vec<f64>,
    /// Wind speed used for wind generation (m/s).
    pub wspd: Vec<f64>,
    /// Electricity price or price multiplier.
    pub price: Vec<f64>,
    /// Points per hour of every series.
    pub points_per_hour: usize,
    /// Direct-normal insolation total per day (kWh/m2/day), after stow.
    pub daily_dni_kwh: Vec<f64>,
}

impl HourlySet {
    /// Assembles the canonical series from a weather source and optional
    /// wind-resource/price series.
    ///
    /// A mismatched price series falls back to uniform multipliers with a
    /// logged notice; mismatched weather or wind-resource series are errors.
    /// `price_cutoff_iqr` enables outlier compression of the price series
    /// (see [`limit_outliers`]); `price_weighted` controls whether a missing
    /// price series is worth a notice.
    ///
    /// # Errors
    ///
    /// Returns a `ShapeError` if the weather series are not a whole number
    /// of 8760-hour years, or the wind-resource length differs from them.
    pub fn assemble(
        weather: &WeatherData,
        wind_resource: Option<&[f64]>,
        price: Option<&[f64]>,
        technologies: &[Technology],
        price_cutoff_iqr: Option<f64>,
        price_weighted: bool,
    ) -> Result<Self, ShapeError> {
        let n = weather.len();
        if n == 0 || n % HOURS_PER_YEAR != 0 {
            return Err(ShapeError {
                series: "weather".to_string(),
                message: format!("{n} points is not a whole number of {HOURS_PER_YEAR}-hour years"),
            });
        }
        let points_per_hour = n / HOURS_PER_YEAR;

        let mut dni = weather.dni.clone();
        let ghi = weather.ghi.clone();
        let tdry = weather.tdry.clone();
        let mut wspd_solar = weather.wspd.clone();

        let wspd = match wind_resource {
            Some(w) if w.len() == n => w.to_vec(),
            Some(w) => {
                return Err(ShapeError {
                    series: "wspd".to_string(),
                    message: format!("wind resource has {} points, expected {n}", w.len()),
                });
            }
            None => {
                if technologies.contains(&Technology::Wind) {
                    warn!("no wind-resource series supplied; using solar-resource wind speed");
                }
                wspd_solar.clone()
            }
        };

        let price = match price {
            Some(p) if p.len() == n => {
                let mut p = p.to_vec();
                if let Some(cutoff) = price_cutoff_iqr {
                    limit_outliers(&mut p, cutoff, cutoff + 0.5);
                }
                p
            }
            Some(p) => {
                warn!(
                    actual = p.len(),
                    expected = n,
                    "price series length mismatch; using uniform price multipliers"
                );
                vec![1.0; n]
            }
            None => {
                if price_weighted {
                    warn!("no price series supplied; using uniform price multipliers");
                }
                vec![1.0; n]
            }
        };

        // Park CSP collectors above the stow wind speed.
        if let Some(limit) = csp_stow_limit(technologies) {
            for (d, w) in dni.iter_mut().zip(wspd_solar.iter_mut()) {
                if *w > limit {
                    *d = 0.0;
                    *w = limit;
                }
            }
        }

        let points_per_day = n / DAYS_PER_YEAR;
        let daily_dni_kwh = (0..DAYS_PER_YEAR)
            .map(|d| {
                let day = &dni[d * points_per_day..(d + 1) * points_per_day];
                day.iter().sum::<f64>() / points_per_hour as f64 / 1000.0
            })
            .collect();

        Ok(Self {
            dni,
            ghi,
            tdry,
            wspd_solar,
            wspd,
            price,
            points_per_hour,
            daily_dni_kwh,
        })
    }

    /// Series for one metric source.
    pub fn series(&self, source: SourceSeries) -> &[f64] {
        match source {
            SourceSeries::Dni => &self.dni,
            SourceSeries::Ghi => &self.ghi,
            SourceSeries::Tdry => &self.tdry,
            SourceSeries::WspdSolar => &self.wspd_solar,
            SourceSeries::Wspd => &self.wspd,
            SourceSeries::Price => &self.price,
        }
    }

    /// Points per day of every series.
    pub fn points_per_day(&self) -> usize {
        self.points_per_hour * 24
    }
}

/// Stow wind speed for the present CSP technologies, if any.
pub fn csp_stow_limit(technologies: &[Technology]) -> Option<f64> {
    let mut limit = None;
    if technologies.contains(&Technology::Tower) {
        limit = Some(TOWER_STOW_WSPD);
    }
    if technologies.contains(&Technology::Trough) {
        limit = Some(limit.map_or(TROUGH_STOW_WSPD, |l: f64| l.max(TROUGH_STOW_WSPD)));
    }
    limit
}

/// Compresses outliers beyond `cutoff_iqr` interquartile ranges from the
/// quartiles into the band bounded by `max_iqr` interquartile ranges.
///
/// Values inside the cutoff band are untouched; values outside are scaled
/// proportionally to their distance from the band edge. Series that look
/// like normalized multipliers (mean within 0.99..1.01) are re-normalized
/// to unit mean afterwards.
pub fn limit_outliers(values: &mut [f64], cutoff_iqr: f64, max_iqr: f64) {
    if values.is_empty() {
        return;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let is_normalized = mean > 0.99 && mean < 1.01;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    let high = q3 + cutoff_iqr * iqr;
    let low = q1 - cutoff_iqr * iqr;
    let ymax = sorted[sorted.len() - 1];
    let ymin = sorted[0];

    if ymax > high {
        let cap = (q3 + max_iqr * iqr).min(ymax);
        for v in values.iter_mut() {
            if *v > high {
                *v = high + (*v - high) / (ymax - high) * (cap - high);
            }
        }
    }
    if ymin < low {
        let floor = (q1 - max_iqr * iqr).max(ymin);
        for v in values.iter_mut() {
            if *v < low {
                *v = low - (low - *v) / (low - ymin) * (low - floor);
            }
        }
    }

    if is_normalized {
        let new_mean = values.iter().sum::<f64>() / n;
        if new_mean != 0.0 {
            for v in values.iter_mut() {
                *v /= new_mean;
            }
        }
    }
}

/// Percentile of a sorted slice with linear interpolation between ranks.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let idx = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (idx - lo as f64)
}
