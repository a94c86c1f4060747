//! CSV export for the per-cluster summary table.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::pipeline::ClusterRow;

/// Column header for the cluster summary CSV.
const HEADER: &str = "cluster,exemplar_group,members,start_day,weight,\
                      adjusted_weight,sim_begin_s,sim_end_s";

/// Exports the cluster summary table to a CSV file at the given path.
///
/// Writes a header row followed by one data row per cluster. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `rows` - Per-cluster summary rows in cluster order
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(rows: &[ClusterRow], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(rows, buf)
}

/// Writes the cluster summary table as CSV to any writer.
///
/// # Arguments
///
/// * `rows` - Per-cluster summary rows in cluster order
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(rows: &[ClusterRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    // Header
    wtr.write_record(HEADER.split(',').map(str::trim))?;

    // Data rows
    for r in rows {
        wtr.write_record(&[
            r.cluster.to_string(),
            r.exemplar_group.to_string(),
            r.members.to_string(),
            r.start_day.to_string(),
            format!("{:.6}", r.weight),
            format!("{:.6}", r.adjusted_weight),
            r.sim_begin_s.to_string(),
            r.sim_end_s.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
