//! End-to-end pipeline tests against a mock E-utilities server.

use mockito::{Matcher, Mock, Server, ServerGuard};
use pubmed_papers::output::read_rows;
use pubmed_papers::pipeline::{self, PipelineOptions, PipelineOutcome};
use pubmed_papers::pubmed::{ClientConfig, PubmedClient};
use pubmed_papers::retry::RetryPolicy;
use pubmed_papers::PubmedError;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    }
}

fn client_for(server: &ServerGuard, batch_size: usize, retry: RetryPolicy) -> PubmedClient {
    let config = ClientConfig {
        batch_size,
        retry,
        ..ClientConfig::with_base_url(&server.url())
    };
    PubmedClient::new(config).unwrap()
}

fn options_for(dir: &TempDir, max_results: usize) -> PipelineOptions {
    let mut options = PipelineOptions::new().unwrap();
    options.max_results = max_results;
    options.output = dir.path().join("papers.csv");
    options
}

async fn mock_search(server: &mut ServerGuard, term: &str, retmax: &str, ids: &[&str]) -> Mock {
    server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("db".into(), "pubmed".into()),
            Matcher::UrlEncoded("term".into(), term.into()),
            Matcher::UrlEncoded("retmode".into(), "json".into()),
            Matcher::UrlEncoded("retmax".into(), retmax.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "header": { "type": "esearch", "version": "0.3" },
                "esearchresult": {
                    "count": ids.len().to_string(),
                    "retmax": ids.len().to_string(),
                    "retstart": "0",
                    "idlist": ids
                }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await
}

async fn mock_summary(server: &mut ServerGuard, ids: &str, body: serde_json::Value) -> Mock {
    server
        .mock("GET", "/esummary.fcgi")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("db".into(), "pubmed".into()),
            Matcher::UrlEncoded("id".into(), ids.into()),
            Matcher::UrlEncoded("retmode".into(), "json".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(1)
        .create_async()
        .await
}

fn titles_body(ids: &[&str]) -> serde_json::Value {
    let mut result = serde_json::Map::new();
    result.insert("uids".to_string(), json!(ids));
    for id in ids {
        result.insert(id.to_string(), json!({ "uid": id, "title": format!("Paper {}", id) }));
    }
    json!({ "result": result })
}

fn written_rows(outcome: PipelineOutcome, path: &Path) -> Vec<pubmed_papers::models::OutputRow> {
    match outcome {
        PipelineOutcome::Written { path: written, rows } => {
            assert_eq!(written, path);
            rows
        }
        PipelineOutcome::NoResults => panic!("expected rows to be written"),
    }
}

#[tokio::test]
async fn test_cancer_scenario() {
    let mut server = Server::new_async().await;
    let search = mock_search(&mut server, "cancer", "2", &["111", "222"]).await;
    let summary = mock_summary(
        &mut server,
        "111,222",
        json!({
            "header": { "type": "esummary", "version": "0.3" },
            "result": {
                "uids": ["111", "222"],
                "111": {
                    "uid": "111",
                    "title": "Bispecific antibodies in oncology",
                    "pubdate": "2024 Mar",
                    "authors": [{ "name": "Doe J", "affiliation": "Genentech Inc." }],
                    "abstract": "We report a trial. contact: jdoe@example.com"
                },
                "222": {
                    "uid": "222",
                    "title": "Tumour microenvironment",
                    "pubdate": "2023",
                    "authors": [{ "name": "Roe R", "affiliation": "Stanford University" }],
                    "abstract": "No contact details."
                }
            }
        }),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&server, 200, RetryPolicy::none());
    let options = options_for(&dir, 2);

    let outcome = pipeline::run(&client, "cancer", &options).await.unwrap();
    let rows = written_rows(outcome, &options.output);

    search.assert_async().await;
    summary.assert_async().await;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].pubmed_id, "111");
    assert_eq!(rows[0].title, "Bispecific antibodies in oncology");
    assert_eq!(rows[0].publication_date, "2024 Mar");
    assert_eq!(rows[0].non_academic_authors, "Doe J");
    assert_eq!(rows[0].company_affiliations, "Genentech Inc.");
    assert_eq!(rows[0].corresponding_email, "jdoe@example.com");

    assert_eq!(rows[1].pubmed_id, "222");
    assert_eq!(rows[1].non_academic_authors, "");
    assert_eq!(rows[1].company_affiliations, "");
    assert_eq!(rows[1].corresponding_email, "Not Available");

    let on_disk = read_rows(&options.output).unwrap();
    assert_eq!(on_disk, rows);
}

#[tokio::test]
async fn test_zero_results_writes_nothing() {
    let mut server = Server::new_async().await;
    let search = mock_search(&mut server, "zzzz nothing", "10", &[]).await;
    let summary = server
        .mock("GET", "/esummary.fcgi")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&server, 200, RetryPolicy::none());
    let options = options_for(&dir, 10);

    let outcome = pipeline::run(&client, "zzzz nothing", &options).await.unwrap();

    assert_eq!(outcome, PipelineOutcome::NoResults);
    assert!(!options.output.exists());
    search.assert_async().await;
    summary.assert_async().await;
}

#[tokio::test]
async fn test_missing_metadata_keeps_row_order() {
    let mut server = Server::new_async().await;
    let _search = mock_search(&mut server, "rare", "3", &["3", "1", "2"]).await;
    let _summary = mock_summary(
        &mut server,
        "3,1,2",
        json!({
            "result": {
                "uids": ["3", "1"],
                "1": { "uid": "1", "title": "Only one" },
                "3": { "uid": "3", "error": "cannot get document summary" }
            }
        }),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&server, 200, RetryPolicy::none());
    let options = options_for(&dir, 3);

    let outcome = pipeline::run(&client, "rare", &options).await.unwrap();
    let rows = written_rows(outcome, &options.output);

    let ids: Vec<&str> = rows.iter().map(|r| r.pubmed_id.as_str()).collect();
    assert_eq!(ids, vec!["3", "1", "2"]);
    assert_eq!(rows[0].title, "N/A");
    assert_eq!(rows[1].title, "Only one");
    assert_eq!(rows[2].title, "N/A");
    assert_eq!(rows[2].publication_date, "N/A");
    assert_eq!(rows[2].corresponding_email, "Not Available");
}

#[tokio::test]
async fn test_details_are_batched() {
    let mut server = Server::new_async().await;
    let _search = mock_search(&mut server, "batch", "5", &["1", "2", "3", "4", "5"]).await;
    let first = mock_summary(&mut server, "1,2", titles_body(&["1", "2"])).await;
    let second = mock_summary(&mut server, "3,4", titles_body(&["3", "4"])).await;
    let third = mock_summary(&mut server, "5", titles_body(&["5"])).await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&server, 2, RetryPolicy::none());
    let options = options_for(&dir, 5);

    let outcome = pipeline::run(&client, "batch", &options).await.unwrap();
    let rows = written_rows(outcome, &options.output);

    first.assert_async().await;
    second.assert_async().await;
    third.assert_async().await;

    let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Paper 1", "Paper 2", "Paper 3", "Paper 4", "Paper 5"]);
}

#[tokio::test]
async fn test_http_failure_aborts_without_output() {
    let mut server = Server::new_async().await;
    let _search = mock_search(&mut server, "cancer", "2", &["111", "222"]).await;
    let summary = server
        .mock("GET", "/esummary.fcgi")
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&server, 200, RetryPolicy::none());
    let options = options_for(&dir, 2);

    let err = pipeline::run(&client, "cancer", &options).await.unwrap_err();

    assert!(matches!(err, PubmedError::Request { status: 500, .. }));
    assert!(!options.output.exists());
    summary.assert_async().await;
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let mut server = Server::new_async().await;
    let unavailable = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(1)
        .create_async()
        .await;
    let search = mock_search(&mut server, "cancer", "1", &["111"]).await;
    let _summary = mock_summary(&mut server, "111", titles_body(&["111"])).await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&server, 200, fast_retry(3));
    let options = options_for(&dir, 1);

    let outcome = pipeline::run(&client, "cancer", &options).await.unwrap();
    let rows = written_rows(outcome, &options.output);

    unavailable.assert_async().await;
    search.assert_async().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Paper 111");
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut server = Server::new_async().await;
    let bad_request = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(400)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, 200, fast_retry(3));

    let err = client.search("cancer", 10).await.unwrap_err();

    assert!(matches!(err, PubmedError::Request { status: 400, .. }));
    assert!(!err.is_retryable());
    bad_request.assert_async().await;
}

#[tokio::test]
async fn test_retries_are_capped() {
    let mut server = Server::new_async().await;
    let unavailable = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(502)
        .expect(3)
        .create_async()
        .await;

    let client = client_for(&server, 200, fast_retry(3));

    let err = client.search("cancer", 10).await.unwrap_err();

    assert!(matches!(err, PubmedError::Request { status: 502, .. }));
    unavailable.assert_async().await;
}

#[tokio::test]
async fn test_empty_query_is_rejected() {
    let server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let client = client_for(&server, 200, RetryPolicy::none());
    let options = options_for(&dir, 10);

    let err = pipeline::run(&client, "   ", &options).await.unwrap_err();

    assert!(matches!(err, PubmedError::Validation(_)));
    assert!(!options.output.exists());
}

#[tokio::test]
async fn test_extra_search_ids_are_truncated() {
    let mut server = Server::new_async().await;
    let search = mock_search(&mut server, "cancer", "2", &["1", "2", "3", "4"]).await;
    let summary = mock_summary(&mut server, "1,2", titles_body(&["1", "2"])).await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&server, 200, RetryPolicy::none());
    let options = options_for(&dir, 2);

    let outcome = pipeline::run(&client, "cancer", &options).await.unwrap();
    let rows = written_rows(outcome, &options.output);

    search.assert_async().await;
    summary.assert_async().await;

    let ids: Vec<&str> = rows.iter().map(|r| r.pubmed_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert_eq!(read_rows(&options.output).unwrap().len(), 2);
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let mut server = Server::new_async().await;
    let throttled = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_header("retry-after", "0")
        .expect(1)
        .create_async()
        .await;
    let search = mock_search(&mut server, "cancer", "10", &["111"]).await;

    let client = client_for(&server, 200, fast_retry(3));

    let ids = client.search("cancer", 10).await.unwrap();

    throttled.assert_async().await;
    search.assert_async().await;
    assert_eq!(ids, vec!["111"]);
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let mut server = Server::new_async().await;
    let throttled = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_header("retry-after", "7")
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, 200, RetryPolicy::none());

    let err = client.search("cancer", 10).await.unwrap_err();

    assert!(matches!(err, PubmedError::RateLimited(7)));
    throttled.assert_async().await;
}
