//! Sunrise/sunset calculation for the solstice daylight averaging window.

/// Day of year of the northern summer solstice, used as the fixed reference
/// day for daylight-window bounds.
pub const SUMMER_SOLSTICE_DOY: u32 = 172;

/// Clock-hour daylight window at a site, held fixed for the whole year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaylightWindow {
    /// Local clock hour of sunrise (0.0–24.0).
    pub sunrise_hr: f64,
    /// Local clock hour of sunset (0.0–24.0).
    pub sunset_hr: f64,
}

impl DaylightWindow {
    /// Computes the daylight window on the summer solstice for a site.
    ///
    /// # Arguments
    ///
    /// * `latitude_deg` - Site latitude in degrees (north positive)
    /// * `longitude_deg` - Site longitude in degrees (east positive)
    /// * `tz_hours` - UTC offset of the data's local clock in hours
    pub fn on_summer_solstice(latitude_deg: f64, longitude_deg: f64, tz_hours: f64) -> Self {
        daylight_window(latitude_deg, longitude_deg, tz_hours, SUMMER_SOLSTICE_DOY)
    }

    /// Converts the clock-hour window to a half-open point-index range
    /// `[sunrise_idx, sunset_idx)` on a day sampled at `points_per_hour`,
    /// clamped to the day length.
    pub fn point_range(&self, points_per_hour: usize) -> (usize, usize) {
        let pph = points_per_hour as f64;
        let points_per_day = points_per_hour * 24;
        let sunrise_idx = (self.sunrise_hr * pph) as usize;
        let sunset_idx = (self.sunset_hr * pph) as usize + 1;
        (
            sunrise_idx.min(points_per_day),
            sunset_idx.min(points_per_day),
        )
    }
}

/// Solar declination in radians (Spencer series).
pub fn declination_rad(day_of_year: u32) -> f64 {
    let g = day_angle_rad(day_of_year);
    0.006918 - 0.399912 * g.cos() + 0.070257 * g.sin() - 0.006758 * (2.0 * g).cos()
        + 0.000907 * (2.0 * g).sin()
        - 0.002697 * (3.0 * g).cos()
        + 0.00148 * (3.0 * g).sin()
}

/// Equation of time in minutes (Spencer series). Positive means the sun
/// crosses the meridian before mean noon.
pub fn equation_of_time_min(day_of_year: u32) -> f64 {
    let g = day_angle_rad(day_of_year);
    229.18
        * (0.000075 + 0.001868 * g.cos()
            - 0.032077 * g.sin()
            - 0.014615 * (2.0 * g).cos()
            - 0.04089 * (2.0 * g).sin())
}

/// Fractional year angle in radians for a given day of year.
fn day_angle_rad(day_of_year: u32) -> f64 {
    2.0 * std::f64::consts::PI * (day_of_year as f64 - 1.0) / 365.0
}

/// Computes the local-clock daylight window for an arbitrary day of year.
///
/// Sunrise and sunset come from the sunset hour angle
/// `cos w = -tan(lat) * tan(decl)`, centred on solar noon, with solar noon
/// shifted from clock noon by the longitude-vs-timezone offset and the
/// equation of time. The hour angle is clamped for polar day and night.
pub fn daylight_window(
    latitude_deg: f64,
    longitude_deg: f64,
    tz_hours: f64,
    day_of_year: u32,
) -> DaylightWindow {
    let decl = declination_rad(day_of_year);
    let lat = latitude_deg.to_radians();

    let cos_w = -lat.tan() * decl.tan();
    let sunset_angle_deg = cos_w.clamp(-1.0, 1.0).acos().to_degrees();
    let half_day_hr = sunset_angle_deg / 15.0;

    // Minutes between local clock time and local solar time.
    let time_correction_min =
        4.0 * (longitude_deg - 15.0 * tz_hours) + equation_of_time_min(day_of_year);
    let solar_noon_hr = 12.0 - time_correction_min / 60.0;

    DaylightWindow {
        sunrise_hr: (solar_noon_hr - half_day_hr).clamp(0.0, 24.0),
        sunset_hr: (solar_noon_hr + half_day_hr).clamp(0.0, 24.0),
    }
}
