//! The fetch pipeline: search, fetch summaries, extract, write.
//!
//! Stages run strictly in sequence. A failure in any stage aborts the run
//! before anything is written; a search with no hits ends the run early,
//! also without writing.

use crate::affiliation::AffiliationClassifier;
use crate::email::EmailExtractor;
use crate::error::{PubmedError, Result};
use crate::models::{OutputRow, RecordMetadata};
use crate::output::{self, DEFAULT_OUTPUT_FILE};
use crate::pubmed::PubmedClient;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Default number of search results
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Options for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub max_results: usize,
    pub output: PathBuf,
    pub classifier: AffiliationClassifier,
    pub extractor: EmailExtractor,
}

impl PipelineOptions {
    /// Options with the default output file, result count and heuristics
    pub fn new() -> Result<Self> {
        Ok(Self {
            max_results: DEFAULT_MAX_RESULTS,
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            classifier: AffiliationClassifier::default(),
            extractor: EmailExtractor::new()?,
        })
    }
}

/// How a successful run ended
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// The search matched nothing; no file was written
    NoResults,
    /// Rows were written to `path`
    Written { path: PathBuf, rows: Vec<OutputRow> },
}

/// Run the full pipeline for `query`.
pub async fn run(client: &PubmedClient, query: &str, options: &PipelineOptions) -> Result<PipelineOutcome> {
    let query = query.trim();
    if query.is_empty() {
        return Err(PubmedError::Validation("Search query must not be empty".to_string()));
    }
    if options.max_results == 0 {
        return Err(PubmedError::Validation("Max results must be at least 1".to_string()));
    }

    // Searching
    let ids = client.search(query, options.max_results).await?;
    if ids.is_empty() {
        info!(query = query, "No results");
        return Ok(PipelineOutcome::NoResults);
    }

    // FetchingDetails
    debug!(count = ids.len(), "Fetching details");
    let details = client.fetch_details(&ids).await?;

    // Extracting
    let rows = build_rows(&ids, &details, &options.classifier, &options.extractor);

    // Writing
    output::write_rows(&options.output, &rows)?;

    Ok(PipelineOutcome::Written {
        path: options.output.clone(),
        rows,
    })
}

/// Build one row per ID, in ID order.
///
/// IDs without metadata still get a row, filled with defaults.
pub fn build_rows(
    ids: &[String],
    details: &HashMap<String, RecordMetadata>,
    classifier: &AffiliationClassifier,
    extractor: &EmailExtractor,
) -> Vec<OutputRow> {
    let empty = RecordMetadata::default();

    ids.iter()
        .map(|id| {
            let record = details.get(id).unwrap_or(&empty);
            let (names, affiliations) = classifier.company_authors(&record.authors);

            OutputRow {
                pubmed_id: id.clone(),
                title: record.title().to_string(),
                publication_date: record.pubdate().to_string(),
                non_academic_authors: names.join(", "),
                company_affiliations: affiliations.join(", "),
                corresponding_email: extractor.corresponding_email(record),
            }
        })
        .collect()
}
