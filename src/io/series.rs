//! Single-column CSV import for hourly price and wind-resource series.

use std::fmt;
use std::path::Path;

/// Error raised while reading a series file.
#[derive(Debug)]
pub struct SeriesError {
    /// File the error was raised for.
    pub path: String,
    /// Human-readable failure description.
    pub message: String,
}

impl fmt::Display for SeriesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "series error: {} — {}", self.path, self.message)
    }
}

impl std::error::Error for SeriesError {}

/// Reads an hourly series from a single-column CSV file.
///
/// Values come from the first column of each row; a non-numeric first row
/// is treated as a header and skipped.
///
/// # Errors
///
/// Returns a `SeriesError` if the file cannot be read, a value after the
/// first row fails to parse, or no values remain.
pub fn read_series_csv(path: &Path) -> Result<Vec<f64>, SeriesError> {
    let err = |message: String| SeriesError {
        path: path.display().to_string(),
        message,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| err(format!("cannot read file: {e}")))?;

    let mut values = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| err(format!("bad record at row {}: {e}", line + 1)))?;
        let field = record.get(0).unwrap_or("").trim();
        match field.parse::<f64>() {
            Ok(v) => values.push(v),
            // Tolerate a header row, nothing after it.
            Err(_) if line == 0 => continue,
            Err(_) => {
                return Err(err(format!(
                    "unparseable value \"{field}\" at row {}",
                    line + 1
                )));
            }
        }
    }
    if values.is_empty() {
        return Err(err("no data rows".to_string()));
    }
    Ok(values)
}
