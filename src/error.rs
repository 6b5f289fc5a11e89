//! Custom error types for pubmed-papers.
//!
//! This module defines all error types used throughout the application.
//! All functions return `Result<T, PubmedError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for pubmed-papers operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum PubmedError {
    /// An E-utilities endpoint answered with a non-success status
    #[error("Request failed: HTTP {status} from {url}")]
    Request {
        /// HTTP status code
        status: u16,
        /// Requested URL (without query string)
        url: String,
    },

    /// Server asked us to slow down (HTTP 429)
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// Network/HTTP transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl PubmedError {
    /// Whether the failure is transient and the request may be retried.
    ///
    /// Timeouts, connection failures, 429 and 5xx are transient. Any other
    /// 4xx is a permanent answer from the server.
    pub fn is_retryable(&self) -> bool {
        match self {
            PubmedError::RateLimited(_) => true,
            PubmedError::Request { status, .. } => *status == 429 || (500..600).contains(status),
            PubmedError::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Result type alias using `PubmedError`
pub type Result<T> = std::result::Result<T, PubmedError>;
