//! Record and row types shared by the pipeline stages.

use serde::{Deserialize, Serialize};

/// Placeholder for a missing title or publication date
pub const MISSING_FIELD: &str = "N/A";

/// A single author entry from an esummary record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Author {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub affiliation: Option<String>,
}

impl Author {
    pub fn new(name: &str, affiliation: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            affiliation: Some(affiliation.to_string()),
        }
    }
}

/// Metadata for one PubMed record as returned by esummary.
///
/// Every field is optional on the wire; absent or null values fall back
/// to defaults instead of failing the decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub pubdate: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<Author>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
}

impl RecordMetadata {
    /// Title, or "N/A" when absent
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(MISSING_FIELD)
    }

    /// Publication date, or "N/A" when absent
    pub fn pubdate(&self) -> &str {
        self.pubdate.as_deref().unwrap_or(MISSING_FIELD)
    }

    /// Abstract text, empty when absent
    pub fn abstract_text(&self) -> &str {
        self.abstract_text.as_deref().unwrap_or_default()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One line of the output CSV.
///
/// Field names are the column headers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputRow {
    #[serde(rename = "PubmedID")]
    pub pubmed_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Publication Date")]
    pub publication_date: String,
    #[serde(rename = "Non-academic Authors")]
    pub non_academic_authors: String,
    #[serde(rename = "Company Affiliations")]
    pub company_affiliations: String,
    #[serde(rename = "Corresponding Author Email")]
    pub corresponding_email: String,
}
