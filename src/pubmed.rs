//! NCBI E-utilities client for PubMed.
//!
//! Two endpoints are used:
//! - `esearch` turns a query into an ordered list of PubMed IDs
//! - `esummary` returns metadata keyed by PubMed ID
//!
//! Both are plain GET requests with `retmode=json`. Summary lookups are
//! split into bounded batches so long ID lists never produce oversized URLs.

use crate::error::{PubmedError, Result};
use crate::models::RecordMetadata;
use crate::retry::RetryPolicy;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// esearch endpoint
pub const SEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";

/// esummary endpoint
pub const SUMMARY_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi";

/// Maximum IDs per esummary request
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DATABASE: &str = "pubmed";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub search_url: String,
    pub summary_url: String,
    pub timeout: Duration,
    pub batch_size: usize,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            search_url: SEARCH_URL.to_string(),
            summary_url: SUMMARY_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Config pointing both endpoints at `base` (e.g. a local mock server)
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            search_url: format!("{}/esearch.fcgi", base),
            summary_url: format!("{}/esummary.fcgi", base),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        for endpoint in [&self.search_url, &self.summary_url] {
            Url::parse(endpoint)
                .map_err(|e| PubmedError::Config(format!("Invalid endpoint {}: {}", endpoint, e)))?;
        }
        if self.batch_size == 0 {
            return Err(PubmedError::Config("Batch size must be at least 1".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(PubmedError::Config("Timeout must be greater than zero".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(PubmedError::Config("Retry attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// PubMed E-utilities client
pub struct PubmedClient {
    client: Client,
    config: ClientConfig,
}

impl PubmedClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pubmed-papers/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PubmedError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Search PubMed and return matching IDs in ranking order.
    ///
    /// Zero matches is an empty list, not an error.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        let retmax = max_results.to_string();
        let params = [
            ("db", DATABASE),
            ("term", query),
            ("retmode", "json"),
            ("retmax", retmax.as_str()),
        ];

        info!(query = query, max_results = max_results, "Searching PubMed");

        let response: ESearchResponse = self.get_json(&self.config.search_url, &params).await?;
        let mut ids = response.esearchresult.idlist;

        if let Some(error) = response.esearchresult.error {
            warn!(error = %error, "esearch reported an error");
        }

        // retmax is a request, not a guarantee
        ids.truncate(max_results);

        info!(
            count = ids.len(),
            total = response.esearchresult.count.as_deref().unwrap_or("?"),
            "Search complete"
        );
        Ok(ids)
    }

    /// Fetch summaries for `ids`, one request per batch.
    ///
    /// IDs missing from the response are simply absent from the map.
    pub async fn fetch_details(&self, ids: &[String]) -> Result<HashMap<String, RecordMetadata>> {
        let mut details = HashMap::with_capacity(ids.len());
        if ids.is_empty() {
            return Ok(details);
        }

        let batch_count = ids.len().div_ceil(self.config.batch_size);
        info!(
            total = ids.len(),
            batches = batch_count,
            "Fetching PubMed summaries"
        );

        for (batch_idx, chunk) in ids.chunks(self.config.batch_size).enumerate() {
            debug!(batch = batch_idx + 1, papers = chunk.len(), "Processing batch");

            let joined = chunk.join(",");
            let params = [("db", DATABASE), ("id", joined.as_str()), ("retmode", "json")];

            let response: ESummaryResponse =
                self.get_json(&self.config.summary_url, &params).await?;
            let records = parse_summary_result(response.result);

            debug!(batch = batch_idx + 1, found = records.len(), "Batch completed");
            details.extend(records);
        }

        info!(found = details.len(), "Summaries fetched");
        Ok(details)
    }

    /// GET `url` with `params` and decode the JSON body, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, &str)]) -> Result<T> {
        let policy = self.config.retry;
        let mut attempt = 0;

        loop {
            match self.try_get_json(url, params).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && policy.should_retry(attempt) => {
                    let mut backoff = policy.backoff_with_jitter(attempt);
                    if let PubmedError::RateLimited(secs) = &e {
                        backoff = backoff.max(Duration::from_secs(*secs));
                    }
                    warn!(
                        url = url,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Transient failure, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, &str)]) -> Result<T> {
        let response = self.client.get(url).query(params).send().await?;
        let status = response.status();

        debug!(url = url, status = status.as_u16(), "E-utilities response");

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PubmedError::RateLimited(retry_after_secs(response.headers())));
        }

        if !status.is_success() {
            return Err(PubmedError::Request {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| PubmedError::Parse(format!("Unexpected response from {}: {}", url, e)))
    }
}

/// Seconds from a `Retry-After` header, 0 when absent or not a plain integer
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

// === E-utilities Response Types ===

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    #[serde(default)]
    esearchresult: ESearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    count: Option<String>,
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(rename = "ERROR", default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ESummaryResponse {
    #[serde(default)]
    result: HashMap<String, serde_json::Value>,
}

/// Decode the esummary `result` map into records.
///
/// The map also carries a `uids` bookkeeping array, which is skipped along
/// with any other non-object entry. Records that fail to decode are logged
/// and dropped, so their rows fall back to defaults.
fn parse_summary_result(result: HashMap<String, serde_json::Value>) -> HashMap<String, RecordMetadata> {
    result
        .into_iter()
        .filter(|(_, value)| value.is_object())
        .filter_map(|(uid, value)| match serde_json::from_value::<RecordMetadata>(value) {
            Ok(record) => Some((uid, record)),
            Err(e) => {
                warn!(uid = %uid, error = %e, "Skipping undecodable summary record");
                None
            }
        })
        .collect()
}
