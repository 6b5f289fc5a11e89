//! Corresponding-author email extraction.
//!
//! Scans the abstract text for the first email-shaped substring. This is a
//! best-effort heuristic: the first address found wins, whether or not it
//! belongs to the corresponding author.

use crate::error::{PubmedError, Result};
use crate::models::RecordMetadata;
use regex::Regex;

/// Local part `@` domain with at least one dot segment
pub const EMAIL_PATTERN: &str = r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9.-]+";

/// Marker written when no email is found
pub const NOT_AVAILABLE: &str = "Not Available";

/// Regex-backed email extractor
#[derive(Debug, Clone)]
pub struct EmailExtractor {
    pattern: Regex,
}

impl EmailExtractor {
    /// Extractor using [`EMAIL_PATTERN`]
    pub fn new() -> Result<Self> {
        Self::with_pattern(EMAIL_PATTERN)
    }

    /// Extractor using a custom pattern
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| PubmedError::Config(format!("Invalid email pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Leftmost email-shaped match in `text`
    pub fn first_email<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern.find(text).map(|m| m.as_str())
    }

    /// Email for a record, or "Not Available"
    pub fn corresponding_email(&self, record: &RecordMetadata) -> String {
        self.first_email(record.abstract_text())
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    }
}
