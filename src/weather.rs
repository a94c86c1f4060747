//! Weather source contract and the SAM-style CSV adapter.
//!
//! The clustering pipeline only depends on the in-memory [`WeatherData`]
//! contract (site metadata plus equal-length hourly series); the CSV reader
//! is a convenience for the common file layout: two metadata rows (names,
//! values), one column-label row, then one row per timestep.

use std::fmt;
use std::path::Path;

use tracing::warn;

/// Site metadata carried by a weather source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    /// Latitude in degrees (north positive).
    pub latitude: f64,
    /// Longitude in degrees (east positive).
    pub longitude: f64,
    /// UTC offset of the data's local clock in hours.
    pub time_zone: f64,
    /// Elevation in meters.
    pub elevation: f64,
}

/// One year of hourly (or sub-hourly) weather series for a site.
///
/// All series have the same length; [`WeatherData::from_series`] and the CSV
/// adapter enforce this, so downstream code can index any series with a
/// single grid.
#[derive(Debug, Clone)]
pub struct WeatherData {
    pub site: Site,
    /// Calendar year of the data (first data row).
    pub year: i32,
    /// Direct normal irradiance (W/m2).
    pub dni: Vec<f64>,
    /// Diffuse horizontal irradiance (W/m2).
    pub dhi: Vec<f64>,
    /// Global horizontal irradiance (W/m2).
    pub ghi: Vec<f64>,
    /// Dry-bulb temperature (C).
    pub tdry: Vec<f64>,
    /// Wind speed at the solar-resource location (m/s).
    pub wspd: Vec<f64>,
}

/// Error raised by the weather adapter.
#[derive(Debug)]
pub struct WeatherError {
    /// Human-readable failure description.
    pub message: String,
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "weather error: {}", self.message)
    }
}

impl std::error::Error for WeatherError {}

/// Column-label alternatives accepted for each series, in lookup order.
const SERIES_LABELS: [(&str, &[&str]); 5] = [
    ("dni", &["DNI"]),
    ("dhi", &["DHI"]),
    ("ghi", &["GHI"]),
    ("tdry", &["Tdry", "Temperature"]),
    ("wspd", &["Wspd", "Wind Speed"]),
];

impl WeatherData {
    /// Builds weather data from in-memory series.
    ///
    /// Diffuse irradiance is not needed for clustering and is zero-filled.
    ///
    /// # Errors
    ///
    /// Returns a `WeatherError` if the series lengths differ or are empty.
    pub fn from_series(
        site: Site,
        year: i32,
        dni: Vec<f64>,
        ghi: Vec<f64>,
        tdry: Vec<f64>,
        wspd: Vec<f64>,
    ) -> Result<Self, WeatherError> {
        let n = dni.len();
        if n == 0 {
            return Err(WeatherError {
                message: "weather series are empty".to_string(),
            });
        }
        for (name, len) in [("ghi", ghi.len()), ("tdry", tdry.len()), ("wspd", wspd.len())] {
            if len != n {
                return Err(WeatherError {
                    message: format!("series \"{name}\" has {len} points, expected {n}"),
                });
            }
        }
        Ok(Self {
            site,
            year,
            dhi: vec![0.0; n],
            dni,
            ghi,
            tdry,
            wspd,
        })
    }

    /// Reads a SAM-style weather CSV file.
    ///
    /// Site latitude/longitude/time zone are mandatory; a missing series
    /// column is zero-filled with a logged notice.
    ///
    /// # Errors
    ///
    /// Returns a `WeatherError` if the file cannot be read, mandatory
    /// metadata is absent, or a data field fails to parse.
    pub fn from_csv_path(path: &Path) -> Result<Self, WeatherError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| WeatherError {
                message: format!("cannot read \"{}\": {e}", path.display()),
            })?;

        let mut rows = rdr.records();
        let meta_names = next_row(&mut rows, "metadata names")?;
        let meta_values = next_row(&mut rows, "metadata values")?;
        let labels = next_row(&mut rows, "column labels")?;

        let meta = |name: &str| -> Option<f64> {
            meta_names
                .iter()
                .position(|f| f.trim() == name)
                .and_then(|i| meta_values.get(i))
                .and_then(|v| v.trim().parse().ok())
        };
        let site = Site {
            latitude: meta("Latitude").ok_or_else(|| missing_meta("Latitude"))?,
            longitude: meta("Longitude").ok_or_else(|| missing_meta("Longitude"))?,
            time_zone: meta("Time Zone").ok_or_else(|| missing_meta("Time Zone"))?,
            elevation: meta("Elevation").unwrap_or(0.0),
        };

        let column = |alternatives: &[&str]| -> Option<usize> {
            alternatives
                .iter()
                .find_map(|a| labels.iter().position(|f| f.trim() == *a))
        };
        let year_col = column(&["Year"]);
        let series_cols: Vec<Option<usize>> = SERIES_LABELS
            .iter()
            .map(|(key, alts)| {
                let col = column(alts);
                if col.is_none() {
                    warn!(series = *key, "weather file has no column for series");
                }
                col
            })
            .collect();

        let mut series: Vec<Vec<f64>> = vec![Vec::new(); SERIES_LABELS.len()];
        let mut year: Option<i32> = None;
        for (line, record) in rows.enumerate() {
            let record = record.map_err(|e| WeatherError {
                message: format!("bad record at data row {}: {e}", line + 1),
            })?;
            if year.is_none() {
                year = year_col
                    .and_then(|c| record.get(c))
                    .and_then(|v| v.trim().parse().ok());
            }
            for (values, col) in series.iter_mut().zip(&series_cols) {
                let Some(c) = col else {
                    values.push(0.0);
                    continue;
                };
                let field = record.get(*c).unwrap_or("").trim();
                let value = field.parse::<f64>().map_err(|_| WeatherError {
                    message: format!(
                        "unparseable value \"{field}\" at data row {}, column {c}",
                        line + 1
                    ),
                })?;
                values.push(value);
            }
        }
        if series[0].is_empty() {
            return Err(WeatherError {
                message: format!("\"{}\" has no data rows", path.display()),
            });
        }

        let mut it = series.into_iter();
        Ok(Self {
            site,
            year: year.unwrap_or(0),
            dni: it.next().unwrap_or_default(),
            dhi: it.next().unwrap_or_default(),
            ghi: it.next().unwrap_or_default(),
            tdry: it.next().unwrap_or_default(),
            wspd: it.next().unwrap_or_default(),
        })
    }

    /// Number of points in each series.
    pub fn len(&self) -> usize {
        self.dni.len()
    }

    /// True when the series carry no points.
    pub fn is_empty(&self) -> bool {
        self.dni.is_empty()
    }
}

fn next_row(
    rows: &mut csv::StringRecordsIter<'_, std::fs::File>,
    what: &str,
) -> Result<csv::StringRecord, WeatherError> {
    match rows.next() {
        Some(Ok(r)) => Ok(r),
        Some(Err(e)) => Err(WeatherError {
            message: format!("cannot read {what} row: {e}"),
        }),
        None => Err(WeatherError {
            message: format!("file ended before {what} row"),
        }),
    }
}

fn missing_meta(name: &str) -> WeatherError {
    WeatherError {
        message: format!("weather file metadata has no \"{name}\" entry"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_site() -> Site {
        Site {
            latitude: 34.9,
            longitude: -116.8,
            time_zone: -8.0,
            elevation: 561.0,
        }
    }

    #[test]
    fn from_series_accepts_equal_lengths() {
        let w = WeatherData::from_series(
            sample_site(),
            2019,
            vec![0.0; 48],
            vec![0.0; 48],
            vec![20.0; 48],
            vec![5.0; 48],
        );
        assert!(w.is_ok());
        assert_eq!(w.map(|w| w.len()).unwrap_or(0), 48);
    }

    #[test]
    fn from_series_rejects_mismatched_lengths() {
        let w = WeatherData::from_series(
            sample_site(),
            2019,
            vec![0.0; 48],
            vec![0.0; 47],
            vec![20.0; 48],
            vec![5.0; 48],
        );
        assert!(w.is_err());
        let msg = w.err().map(|e| e.message).unwrap_or_default();
        assert!(msg.contains("ghi"), "got: {msg}");
    }

    #[test]
    fn from_series_rejects_empty() {
        let w = WeatherData::from_series(sample_site(), 2019, vec![], vec![], vec![], vec![]);
        assert!(w.is_err());
    }

    fn write_sample_csv(path: &Path, label_row: &str, data_rows: &[&str]) {
        let mut content = String::new();
        content.push_str("Source,Location ID,Latitude,Longitude,Time Zone,Elevation\n");
        content.push_str("TMY,722880,34.9,-116.8,-8,561\n");
        content.push_str(label_row);
        content.push('\n');
        for row in data_rows {
            content.push_str(row);
            content.push('\n');
        }
        fs::write(path, content).ok();
    }

    #[test]
    fn csv_round_trip() {
        let path = std::env::temp_dir().join("repdays_weather_round_trip.csv");
        write_sample_csv(
            &path,
            "Year,Month,Day,Hour,GHI,DNI,DHI,Tdry,Wspd",
            &[
                "2019,1,1,0,0,0,0,10.5,3.2",
                "2019,1,1,1,12,30,5,11.0,3.5",
                "2019,1,1,2,80,410,22,12.2,4.0",
            ],
        );
        let w = WeatherData::from_csv_path(&path);
        fs::remove_file(&path).ok();
        assert!(w.is_ok(), "parse failed: {:?}", w.err().map(|e| e.message));
        let w = w.ok();
        assert_eq!(w.as_ref().map(|w| w.len()), Some(3));
        assert_eq!(w.as_ref().map(|w| w.year), Some(2019));
        assert_eq!(w.as_ref().map(|w| w.site.latitude), Some(34.9));
        assert_eq!(w.as_ref().map(|w| w.site.time_zone), Some(-8.0));
        assert_eq!(w.as_ref().map(|w| w.dni[2]), Some(410.0));
        assert_eq!(w.as_ref().map(|w| w.tdry[1]), Some(11.0));
    }

    #[test]
    fn csv_accepts_alternate_labels() {
        let path = std::env::temp_dir().join("repdays_weather_alt_labels.csv");
        write_sample_csv(
            &path,
            "Year,Month,Day,Hour,GHI,DNI,DHI,Temperature,Wind Speed",
            &["2019,1,1,0,0,0,0,10.5,3.2"],
        );
        let w = WeatherData::from_csv_path(&path);
        fs::remove_file(&path).ok();
        assert!(w.is_ok());
        let w = w.ok();
        assert_eq!(w.as_ref().map(|w| w.tdry[0]), Some(10.5));
        assert_eq!(w.as_ref().map(|w| w.wspd[0]), Some(3.2));
    }

    #[test]
    fn csv_zero_fills_missing_series() {
        let path = std::env::temp_dir().join("repdays_weather_missing_series.csv");
        write_sample_csv(
            &path,
            "Year,Month,Day,Hour,GHI,DNI,DHI,Tdry",
            &["2019,1,1,0,55,120,8,10.5"],
        );
        let w = WeatherData::from_csv_path(&path);
        fs::remove_file(&path).ok();
        assert!(w.is_ok());
        let w = w.ok();
        assert_eq!(w.as_ref().map(|w| w.wspd[0]), Some(0.0));
        assert_eq!(w.as_ref().map(|w| w.dni[0]), Some(120.0));
    }

    #[test]
    fn csv_rejects_missing_latitude() {
        let path = std::env::temp_dir().join("repdays_weather_no_lat.csv");
        let content = "Source,Location ID,Longitude,Time Zone,Elevation\n\
                       TMY,722880,-116.8,-8,561\n\
                       Year,Month,Day,Hour,GHI,DNI,DHI,Tdry,Wspd\n\
                       2019,1,1,0,0,0,0,10.5,3.2\n";
        fs::write(&path, content).ok();
        let w = WeatherData::from_csv_path(&path);
        fs::remove_file(&path).ok();
        assert!(w.is_err());
        let msg = w.err().map(|e| e.message).unwrap_or_default();
        assert!(msg.contains("Latitude"), "got: {msg}");
    }

    #[test]
    fn csv_rejects_unparseable_field() {
        let path = std::env::temp_dir().join("repdays_weather_bad_field.csv");
        write_sample_csv(
            &path,
            "Year,Month,Day,Hour,GHI,DNI,DHI,Tdry,Wspd",
            &["2019,1,1,0,0,not_a_number,0,10.5,3.2"],
        );
        let w = WeatherData::from_csv_path(&path);
        fs::remove_file(&path).ok();
        assert!(w.is_err());
    }
}
