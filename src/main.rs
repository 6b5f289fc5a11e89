//! pubmed-papers - PubMed paper fetcher
//!
//! Searches PubMed, flags authors with company affiliations and saves the
//! results to CSV.
//!
//! ## Usage
//!
//! ```bash
//! pubmed-papers "crispr therapy" --max-results 25 -f crispr.csv
//! pubmed-papers            # prompts for the query
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use pubmed_papers::affiliation::{AffiliationClassifier, BlankAffiliationPolicy};
use pubmed_papers::pipeline::{self, PipelineOptions, PipelineOutcome, DEFAULT_MAX_RESULTS};
use pubmed_papers::pubmed::{
    ClientConfig, PubmedClient, DEFAULT_BATCH_SIZE, DEFAULT_TIMEOUT_SECS, SEARCH_URL, SUMMARY_URL,
};
use pubmed_papers::retry::RetryPolicy;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Fetch PubMed papers with non-academic authors and save them to CSV
#[derive(Parser)]
#[command(name = "pubmed-papers")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Search query (prompted for when omitted)
    query: Option<String>,

    /// Enable debug mode for detailed logs
    #[arg(short, long)]
    debug: bool,

    /// Filename to save results
    #[arg(short, long, default_value = pubmed_papers::output::DEFAULT_OUTPUT_FILE)]
    file: PathBuf,

    /// Number of results to fetch from PubMed
    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS as u64, value_parser = clap::value_parser!(u64).range(1..))]
    max_results: u64,

    /// Maximum IDs per summary request
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Attempts per request, including the first
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// esearch endpoint
    #[arg(long, default_value = SEARCH_URL)]
    search_url: String,

    /// esummary endpoint
    #[arg(long, default_value = SUMMARY_URL)]
    summary_url: String,

    /// List authors with an empty affiliation as non-academic
    #[arg(long)]
    include_blank_affiliations: bool,

    /// Comma-separated academic keywords (replaces the built-in list)
    #[arg(long, value_delimiter = ',')]
    academic_keywords: Option<Vec<String>>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    let query = match cli.query.clone() {
        Some(q) => q,
        None => prompt_query().context("Failed to read search query")?,
    };

    debug!(query = %query, "Fetching papers for query");

    let config = ClientConfig {
        search_url: cli.search_url.clone(),
        summary_url: cli.summary_url.clone(),
        timeout: Duration::from_secs(cli.timeout_secs),
        batch_size: cli.batch_size,
        retry: RetryPolicy {
            max_attempts: cli.max_attempts,
            ..Default::default()
        },
    };
    let client = PubmedClient::new(config).context("Invalid client configuration")?;

    let options = build_options(&cli)?;

    match pipeline::run(&client, &query, &options).await? {
        PipelineOutcome::NoResults => {
            println!("No papers found for the given query.");
        }
        PipelineOutcome::Written { path, rows } => {
            debug!(rows = rows.len(), "Pipeline complete");
            println!("Results saved to {}", path.display());
        }
    }

    Ok(())
}

fn build_options(cli: &Cli) -> Result<PipelineOptions> {
    let mut options = PipelineOptions::new().context("Failed to build pipeline options")?;

    let classifier = match &cli.academic_keywords {
        Some(keywords) => AffiliationClassifier::new(keywords),
        None => AffiliationClassifier::default(),
    };
    let policy = if cli.include_blank_affiliations {
        BlankAffiliationPolicy::Include
    } else {
        BlankAffiliationPolicy::Skip
    };

    options.max_results = cli.max_results as usize;
    options.output = cli.file.clone();
    options.classifier = classifier.with_blank_policy(policy);
    Ok(options)
}

/// Ask for the search query on stdin
fn prompt_query() -> Result<String> {
    print!("Enter your search query: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
