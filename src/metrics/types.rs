//! Metric catalog: weighting, sub-day division counts, and averaging bounds.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Generation/storage technology present in the modeled plant.
///
/// Only used to pick default metric weights and stow limits; no further
/// coupling to any particular performance model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technology {
    Pv,
    Wind,
    Tower,
    Trough,
    Battery,
    Geothermal,
}

/// Underlying hourly series a metric is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSeries {
    Dni,
    Ghi,
    Tdry,
    WspdSolar,
    Wspd,
    Price,
}

/// Which day of a group a metric's features are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPlacement {
    /// Every day of the group itself.
    Own,
    /// The single day before the group.
    PrevDay,
    /// The single day after the group.
    NextDay,
}

/// Sub-day window the division averages are taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AveragingBounds {
    /// All points of the day.
    FullDay,
    /// Points between sunrise and sunset on the summer solstice.
    SummerDaylight,
}

/// One of the fourteen clustering metrics, in canonical feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Dni,
    DniPrev,
    DniNext,
    Ghi,
    GhiPrev,
    GhiNext,
    Tdry,
    WspdSolar,
    Wspd,
    WspdPrev,
    WspdNext,
    Price,
    PricePrev,
    PriceNext,
}

impl Metric {
    /// All metrics in canonical feature order.
    pub const ALL: [Metric; 14] = [
        Metric::Dni,
        Metric::DniPrev,
        Metric::DniNext,
        Metric::Ghi,
        Metric::GhiPrev,
        Metric::GhiNext,
        Metric::Tdry,
        Metric::WspdSolar,
        Metric::Wspd,
        Metric::WspdPrev,
        Metric::WspdNext,
        Metric::Price,
        Metric::PricePrev,
        Metric::PriceNext,
    ];

    /// Position in the canonical order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Configuration key for this metric.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Dni => "dni",
            Metric::DniPrev => "dni_prev",
            Metric::DniNext => "dni_next",
            Metric::Ghi => "ghi",
            Metric::GhiPrev => "ghi_prev",
            Metric::GhiNext => "ghi_next",
            Metric::Tdry => "tdry",
            Metric::WspdSolar => "wspd_solar",
            Metric::Wspd => "wspd",
            Metric::WspdPrev => "wspd_prev",
            Metric::WspdNext => "wspd_next",
            Metric::Price => "price",
            Metric::PricePrev => "price_prev",
            Metric::PriceNext => "price_next",
        }
    }

    /// Looks up a metric by its configuration key.
    pub fn from_name(name: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Hourly series this metric averages over.
    pub fn source(self) -> SourceSeries {
        match self {
            Metric::Dni | Metric::DniPrev | Metric::DniNext => SourceSeries::Dni,
            Metric::Ghi | Metric::GhiPrev | Metric::GhiNext => SourceSeries::Ghi,
            Metric::Tdry => SourceSeries::Tdry,
            Metric::WspdSolar => SourceSeries::WspdSolar,
            Metric::Wspd | Metric::WspdPrev | Metric::WspdNext => SourceSeries::Wspd,
            Metric::Price | Metric::PricePrev | Metric::PriceNext => SourceSeries::Price,
        }
    }

    /// Day-placement of this metric within a group's feature vector.
    pub fn placement(self) -> DayPlacement {
        match self {
            Metric::DniPrev
            | Metric::GhiPrev
            | Metric::WspdPrev
            | Metric::PricePrev => DayPlacement::PrevDay,
            Metric::DniNext
            | Metric::GhiNext
            | Metric::WspdNext
            | Metric::PriceNext => DayPlacement::NextDay,
            _ => DayPlacement::Own,
        }
    }
}

/// Weight, division count, and averaging window for one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSpec {
    /// Feature weight; zero removes the metric from the feature vector.
    pub weight: f64,
    /// Number of sub-day averaging intervals (>= 1).
    pub divisions: usize,
    /// Window the intervals subdivide.
    pub bounds: AveragingBounds,
}

/// Immutable per-metric configuration, total over all fourteen metrics.
///
/// Built once from the active technology set (or a full user override) and
/// threaded through every pipeline stage; every metric always has a spec, so
/// lookups cannot fail.
#[derive(Debug, Clone)]
pub struct MetricConfig {
    specs: Vec<MetricSpec>,
}

impl MetricConfig {
    /// Builds the default weighting for a set of active technologies.
    pub fn defaults(technologies: &[Technology]) -> Self {
        let csp = technologies.contains(&Technology::Tower)
            || technologies.contains(&Technology::Trough);
        let pv = technologies.contains(&Technology::Pv);
        let wind = technologies.contains(&Technology::Wind);
        let dispatch = csp || technologies.contains(&Technology::Battery);

        let spec = |on: bool, weight: f64, divisions: usize, bounds: AveragingBounds| MetricSpec {
            weight: if on { weight } else { 0.0 },
            divisions: if on { divisions } else { 1 },
            bounds,
        };

        use AveragingBounds::{FullDay, SummerDaylight};
        let specs = vec![
            spec(csp, 1.0, 4, SummerDaylight),               // dni
            spec(csp, 0.5, 2, SummerDaylight),               // dni_prev
            spec(csp, 0.5, 2, SummerDaylight),               // dni_next
            spec(pv, 1.0, 4, SummerDaylight),                // ghi
            spec(pv && dispatch, 0.5, 2, SummerDaylight),    // ghi_prev
            spec(pv && dispatch, 0.5, 2, SummerDaylight),    // ghi_next
            spec(csp, 0.25, 2, FullDay),                     // tdry
            spec(false, 0.0, 1, SummerDaylight),             // wspd_solar
            spec(wind, 1.0, 4, FullDay),                     // wspd
            spec(wind && dispatch, 0.5, 2, FullDay),         // wspd_prev
            spec(wind && dispatch, 0.5, 2, FullDay),         // wspd_next
            spec(dispatch, 0.75, 4, FullDay),                // price
            spec(dispatch, 0.375, 2, FullDay),               // price_prev
            spec(dispatch, 0.375, 2, FullDay),               // price_next
        ];
        Self { specs }
    }

    /// Builds a configuration from full user weight/division overrides.
    ///
    /// Metrics absent from `weights` get weight 0.0; metrics absent from
    /// `divisions` get a single division. Averaging bounds always come from
    /// the default table. Unknown keys are ignored (the config layer rejects
    /// them before this point).
    pub fn with_overrides(
        technologies: &[Technology],
        weights: &BTreeMap<String, f64>,
        divisions: &BTreeMap<String, usize>,
    ) -> Self {
        let mut cfg = Self::defaults(technologies);
        for m in Metric::ALL {
            let s = &mut cfg.specs[m.index()];
            s.weight = weights.get(m.name()).copied().unwrap_or(0.0);
            s.divisions = divisions.get(m.name()).copied().unwrap_or(1).max(1);
        }
        cfg
    }

    /// Spec for one metric.
    pub fn spec(&self, metric: Metric) -> &MetricSpec {
        &self.specs[metric.index()]
    }

    /// Metrics with non-zero weight, in canonical order.
    pub fn active(&self) -> impl Iterator<Item = Metric> + '_ {
        Metric::ALL
            .into_iter()
            .filter(|m| self.specs[m.index()].weight > 0.0)
    }

    /// Total feature-vector length for groups of `ndays` days.
    pub fn feature_len(&self, ndays: usize) -> usize {
        self.active()
            .map(|m| {
                let d = self.spec(m).divisions;
                match m.placement() {
                    DayPlacement::Own => ndays * d,
                    DayPlacement::PrevDay | DayPlacement::NextDay => d,
                }
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csp_defaults_weight_dni_and_price() {
        let cfg = MetricConfig::defaults(&[Technology::Tower, Technology::Battery]);
        assert!((cfg.spec(Metric::Dni).weight - 1.0).abs() < 1e-12);
        assert_eq!(cfg.spec(Metric::Dni).divisions, 4);
        assert!((cfg.spec(Metric::Price).weight - 0.75).abs() < 1e-12);
        assert!((cfg.spec(Metric::Tdry).weight - 0.25).abs() < 1e-12);
        assert!((cfg.spec(Metric::Ghi).weight).abs() < 1e-12);
        assert!((cfg.spec(Metric::Wspd).weight).abs() < 1e-12);
    }

    #[test]
    fn pv_alone_has_no_dispatch_metrics() {
        let cfg = MetricConfig::defaults(&[Technology::Pv]);
        assert!((cfg.spec(Metric::Ghi).weight - 1.0).abs() < 1e-12);
        assert!((cfg.spec(Metric::GhiPrev).weight).abs() < 1e-12);
        assert!((cfg.spec(Metric::Price).weight).abs() < 1e-12);
    }

    #[test]
    fn pv_with_battery_enables_adjacent_days() {
        let cfg = MetricConfig::defaults(&[Technology::Pv, Technology::Battery]);
        assert!((cfg.spec(Metric::GhiPrev).weight - 0.5).abs() < 1e-12);
        assert_eq!(cfg.spec(Metric::GhiPrev).divisions, 2);
        assert!((cfg.spec(Metric::Price).weight - 0.75).abs() < 1e-12);
    }

    #[test]
    fn wind_alone_weights_wspd_only() {
        let cfg = MetricConfig::defaults(&[Technology::Wind]);
        assert!((cfg.spec(Metric::Wspd).weight - 1.0).abs() < 1e-12);
        assert!((cfg.spec(Metric::WspdPrev).weight).abs() < 1e-12);
        assert!((cfg.spec(Metric::Price).weight).abs() < 1e-12);
        let active: Vec<Metric> = cfg.active().collect();
        assert_eq!(active, vec![Metric::Wspd]);
    }

    #[test]
    fn wspd_solar_never_weighted_by_default() {
        for techs in [
            vec![Technology::Tower],
            vec![Technology::Pv, Technology::Wind, Technology::Battery],
        ] {
            let cfg = MetricConfig::defaults(&techs);
            assert!((cfg.spec(Metric::WspdSolar).weight).abs() < 1e-12);
        }
    }

    #[test]
    fn feature_len_counts_days_and_divisions() {
        // tower alone: dni 2*4 + dni_prev 2 + dni_next 2 + tdry 2*2
        //            + price 2*4 + price_prev 2 + price_next 2 = 28
        let cfg = MetricConfig::defaults(&[Technology::Tower]);
        assert_eq!(cfg.feature_len(2), 28);
    }

    #[test]
    fn override_zeroes_unnamed_metrics() {
        let weights = BTreeMap::from([("dni".to_string(), 1.0)]);
        let divisions = BTreeMap::from([("dni".to_string(), 3)]);
        let cfg = MetricConfig::with_overrides(&[Technology::Tower], &weights, &divisions);
        assert!((cfg.spec(Metric::Dni).weight - 1.0).abs() < 1e-12);
        assert_eq!(cfg.spec(Metric::Dni).divisions, 3);
        assert!((cfg.spec(Metric::Price).weight).abs() < 1e-12);
        assert_eq!(cfg.spec(Metric::Price).divisions, 1);
        let active: Vec<Metric> = cfg.active().collect();
        assert_eq!(active, vec![Metric::Dni]);
    }

    #[test]
    fn override_keeps_default_bounds() {
        let weights = BTreeMap::from([("tdry".to_string(), 1.0)]);
        let cfg = MetricConfig::with_overrides(&[Technology::Pv], &weights, &BTreeMap::new());
        assert_eq!(cfg.spec(Metric::Tdry).bounds, AveragingBounds::FullDay);
        assert_eq!(cfg.spec(Metric::Dni).bounds, AveragingBounds::SummerDaylight);
    }

    #[test]
    fn metric_names_round_trip() {
        for m in Metric::ALL {
            assert_eq!(Metric::from_name(m.name()), Some(m));
        }
        assert_eq!(Metric::from_name("bogus"), None);
    }

    #[test]
    fn canonical_index_matches_all_order() {
        for (i, m) in Metric::ALL.into_iter().enumerate() {
            assert_eq!(m.index(), i);
        }
    }
}
