//! Shared test fixtures for integration tests.

use std::f64::consts::PI;

use repdays::config::RunConfig;
use repdays::weather::{Site, WeatherData};
use repdays::{DAYS_PER_YEAR, HOURS_PER_YEAR};

/// Mojave-like test site.
pub fn desert_site() -> Site {
    Site {
        latitude: 34.9,
        longitude: -116.8,
        time_zone: -8.0,
        elevation: 561.0,
    }
}

/// One deterministic synthetic year: a clear-sky diurnal irradiance shape
/// whose amplitude follows a seasonal sine, temperatures that track the
/// sun, and calm wind.
pub fn synthetic_weather() -> WeatherData {
    let mut dni = Vec::with_capacity(HOURS_PER_YEAR);
    let mut ghi = Vec::with_capacity(HOURS_PER_YEAR);
    let mut tdry = Vec::with_capacity(HOURS_PER_YEAR);
    for d in 0..DAYS_PER_YEAR {
        let season = 1.0 + 0.5 * (2.0 * PI * (d as f64 - 80.0) / 365.0).sin();
        for h in 0..24 {
            let sun = (PI * (h as f64 - 6.0) / 12.0).sin().max(0.0);
            dni.push(650.0 * season * sun);
            ghi.push(500.0 * season * sun);
            tdry.push(12.0 + 10.0 * season * sun);
        }
    }
    let wspd = vec![4.0; HOURS_PER_YEAR];
    WeatherData::from_series(desert_site(), 2019, dni, ghi, tdry, wspd)
        .expect("fixture series should be consistent")
}

/// Hourly price fixture with a morning and a taller evening peak, scaled up
/// in the second half of the year.
pub fn synthetic_price() -> Vec<f64> {
    (0..HOURS_PER_YEAR)
        .map(|t| {
            let h = t % 24;
            let d = t / 24;
            let peaks = match h {
                7..=9 => 1.4,
                17..=21 => 1.9,
                _ => 0.8,
            };
            if d >= 182 { 1.5 * peaks } else { peaks }
        })
        .collect()
}

/// A configuration small enough for fast integration runs: 22 groups of
/// 16 days, 4 target clusters with a one-cluster tolerance.
pub fn fast_config() -> RunConfig {
    let mut cfg = RunConfig::baseline();
    cfg.clustering.ndays = 16;
    cfg.clustering.n_cluster = 4;
    cfg.clustering.enforce_tolerance = 1;
    cfg
}
