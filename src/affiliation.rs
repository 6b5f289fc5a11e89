//! Academic / non-academic affiliation heuristic.
//!
//! An affiliation counts as academic when it contains any of a fixed set of
//! keywords (case-insensitive substring match). Everything else, including
//! an empty string, is non-academic.

use crate::models::Author;

/// Keywords marking an affiliation as academic
pub const ACADEMIC_KEYWORDS: &[&str] = &["university", "institute", "college", "school", "hospital"];

/// Placeholder used when an author entry has no name
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// How authors with an empty or missing affiliation are reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlankAffiliationPolicy {
    /// Leave them out of the company lists
    #[default]
    Skip,
    /// List them as non-academic with a blank affiliation
    Include,
}

/// Keyword-based affiliation classifier
#[derive(Debug, Clone)]
pub struct AffiliationClassifier {
    keywords: Vec<String>,
    blank_policy: BlankAffiliationPolicy,
}

impl Default for AffiliationClassifier {
    fn default() -> Self {
        Self::new(ACADEMIC_KEYWORDS.iter().copied())
    }
}

impl AffiliationClassifier {
    /// Create a classifier from a custom keyword list
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            keywords,
            blank_policy: BlankAffiliationPolicy::default(),
        }
    }

    pub fn with_blank_policy(mut self, policy: BlankAffiliationPolicy) -> Self {
        self.blank_policy = policy;
        self
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True if the affiliation contains any academic keyword
    pub fn is_academic(&self, affiliation: &str) -> bool {
        let lower = affiliation.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Split out the non-academic authors of a record.
    ///
    /// Returns the author names and their affiliations, index-aligned and
    /// in author order.
    pub fn company_authors(&self, authors: &[Author]) -> (Vec<String>, Vec<String>) {
        let mut names = Vec::new();
        let mut affiliations = Vec::new();

        for author in authors {
            let affiliation = author.affiliation.as_deref().unwrap_or_default();

            if affiliation.is_empty() && self.blank_policy == BlankAffiliationPolicy::Skip {
                continue;
            }
            if self.is_academic(affiliation) {
                continue;
            }

            names.push(
                author
                    .name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            );
            affiliations.push(affiliation.to_string());
        }

        (names, affiliations)
    }
}
