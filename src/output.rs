//! CSV persistence for output rows.

use crate::error::Result;
use crate::models::OutputRow;
use std::path::Path;
use tracing::{debug, info};

/// Default output file name
pub const DEFAULT_OUTPUT_FILE: &str = "pubmed_papers.csv";

/// Column order of the output file
pub const CSV_HEADERS: &[&str] = &[
    "PubmedID",
    "Title",
    "Publication Date",
    "Non-academic Authors",
    "Company Affiliations",
    "Corresponding Author Email",
];

/// Write `rows` to `path`, replacing any existing file.
///
/// The header row is always written, even for an empty slice.
pub fn write_rows(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    wtr.write_record(CSV_HEADERS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    info!(path = %path.display(), rows = rows.len(), "Saved CSV");
    Ok(())
}

/// Read an output file back into rows
pub fn read_rows(path: &Path) -> Result<Vec<OutputRow>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let rows = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<OutputRow>, csv::Error>>()?;

    debug!(path = %path.display(), rows = rows.len(), "Read CSV");
    Ok(rows)
}
