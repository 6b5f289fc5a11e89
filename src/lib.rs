//! # pubmed_papers
//!
//! Fetch PubMed papers for a query, flag authors with non-academic
//! (company) affiliations, and export the results as CSV.
//!
//! ## Modules
//!
//! - [`pubmed`] - E-utilities client (esearch + esummary)
//! - [`affiliation`] - Academic keyword heuristic
//! - [`email`] - Corresponding-author email extraction
//! - [`output`] - CSV writer
//! - [`pipeline`] - Search → details → extraction → CSV
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pubmed_papers::pipeline::{self, PipelineOptions, PipelineOutcome};
//! use pubmed_papers::pubmed::{ClientConfig, PubmedClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PubmedClient::new(ClientConfig::default())?;
//!     let options = PipelineOptions::new()?;
//!     if let PipelineOutcome::Written { rows, .. } = pipeline::run(&client, "cancer", &options).await? {
//!         println!("Wrote {} rows", rows.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod affiliation;
pub mod email;
pub mod error;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod pubmed;
pub mod retry;

pub use error::{PubmedError, Result};
