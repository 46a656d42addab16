use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};

use kvideo_api::{
    api::{create_router, AppState},
    error::{AppError, AppResult},
    models::{Candidate, SourceConfig},
    services::{catalog::CatalogClient, prober::AvailabilityProber, search_run::BatchLimits},
    sources::SourceRegistry,
};

fn candidate(source_id: &str, vod_id: i64, playable: bool) -> Candidate {
    Candidate {
        source_id: source_id.to_string(),
        vod_id,
        name: format!("title-{}", vod_id),
        poster: None,
        year: Some("1999".to_string()),
        type_name: None,
        remarks: None,
        play_url: playable.then(|| format!("https://cdn.example.com/{}.m3u8", vod_id)),
    }
}

/// Catalog stub: `dytt` yields three candidates (one without a playable
/// URL), `ruyi` yields nothing, `baofeng` always fails.
struct StubCatalog;

#[async_trait::async_trait]
impl CatalogClient for StubCatalog {
    async fn search(
        &self,
        _query: &str,
        source: &SourceConfig,
        _page: u32,
    ) -> AppResult<Vec<Candidate>> {
        match source.id.as_str() {
            "dytt" => Ok(vec![
                candidate("dytt", 1, true),
                candidate("dytt", 2, false),
                candidate("dytt", 3, true),
            ]),
            "baofeng" => Err(AppError::Catalog("baofeng unreachable".to_string())),
            _ => Ok(Vec::new()),
        }
    }
}

/// Prober stub: a candidate is usable exactly when it has a playable URL
struct StubProber;

#[async_trait::async_trait]
impl AvailabilityProber for StubProber {
    async fn check(&self, candidate: &Candidate) -> AppResult<bool> {
        Ok(candidate.play_url.is_some())
    }
}

fn create_test_server() -> TestServer {
    let state = AppState::with_collaborators(
        Arc::new(SourceRegistry::with_defaults()),
        Arc::new(StubCatalog),
        Arc::new(StubProber),
        BatchLimits::default(),
    );
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn parse_records(body: &str) -> Vec<Value> {
    body.lines()
        .map(|line| serde_json::from_str(line).expect("each line is one JSON record"))
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_list_sources() {
    let server = create_test_server();
    let response = server.get("/api/v1/sources").await;
    response.assert_status_ok();

    let sources: Vec<Value> = response.json();
    assert_eq!(sources.len(), 16);
    assert_eq!(sources[0]["id"], "dytt");
    assert!(sources.iter().all(|s| s["enabled"] == true));
}

#[tokio::test]
async fn test_search_stream_full_run() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/search/stream")
        .json(&json!({
            "query": "matrix",
            "sources": ["dytt", "ruyi", "baofeng"]
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/x-ndjson");

    let records = parse_records(&response.text());

    // Opens with the zero-progress record
    assert_eq!(records[0]["kind"], "progress");
    assert_eq!(records[0]["stage"], "searching");
    assert_eq!(records[0]["sourcesCompleted"], 0);
    assert_eq!(records[0]["sourcesTotal"], 3);

    // Every source completes, including the failing one, and no error record
    // is emitted for it
    assert!(records
        .iter()
        .any(|r| r["stage"] == "searching" && r["sourcesCompleted"] == 3));
    assert!(!records.iter().any(|r| r["kind"] == "error"));

    // Exactly one terminal record, and it is the last line
    let terminals: Vec<&Value> = records
        .iter()
        .filter(|r| r["kind"] == "complete" || r["kind"] == "error")
        .collect();
    assert_eq!(terminals.len(), 1);
    let last = records.last().unwrap();
    assert_eq!(last["kind"], "complete");

    // All three verdicts arrived; only the two playable candidates surface
    assert_eq!(last["candidatesFound"], 3);
    assert_eq!(last["candidatesValidated"], 3);

    let streamed: Vec<&Value> = records
        .iter()
        .filter(|r| r["kind"] == "results")
        .flat_map(|r| r["items"].as_array().unwrap())
        .collect();
    assert_eq!(streamed.len(), 2);
    assert!(streamed.iter().all(|item| item["sourceId"] == "dytt"));
    assert!(streamed.iter().all(|item| item["vodId"] != 2));
}

#[tokio::test]
async fn test_search_stream_rejects_blank_query() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/search/stream")
        .json(&json!({
            "query": "   ",
            "sources": ["dytt"]
        }))
        .await;

    response.assert_status_ok();
    let records = parse_records(&response.text());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["kind"], "error");
    assert_eq!(records[0]["message"], "Invalid query");
}

#[tokio::test]
async fn test_search_stream_rejects_unknown_sources() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/search/stream")
        .json(&json!({
            "query": "matrix",
            "sources": ["unknown1", "unknown2"]
        }))
        .await;

    response.assert_status_ok();
    let records = parse_records(&response.text());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["kind"], "error");
    assert_eq!(records[0]["message"], "No valid sources");
}

#[tokio::test]
async fn test_search_stream_checking_progress_is_per_candidate() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/search/stream")
        .json(&json!({
            "query": "matrix",
            "sources": ["dytt"]
        }))
        .await;

    let records = parse_records(&response.text());

    let checked: Vec<i64> = records
        .iter()
        .filter(|r| r["stage"] == "checking")
        .map(|r| r["candidatesValidated"].as_i64().unwrap())
        .collect();
    assert_eq!(checked, vec![1, 2, 3]);
}
