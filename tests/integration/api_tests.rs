use crate::common::*;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use shelf_crawler::api::{router, AppState};
use shelf_crawler::crawler::Orchestrator;
use shelf_crawler::storage::{CsvRecordStore, RecordStore};
use shelf_crawler::ScrapeState;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_crawl_then_query_over_http() {
    let server = MockServer::start().await;
    mount_catalog(&server, &[PAGE_ONE, PAGE_TWO], Duration::ZERO).await;

    let dir = TempDir::new().unwrap();
    let store: Arc<dyn RecordStore> = Arc::new(CsvRecordStore::new(dir.path().join("books.csv")));
    let config = create_test_config(start_url(&server), &dir.path().join("books.csv"));
    let orchestrator = Orchestrator::new(&config, Arc::clone(&store)).unwrap();
    let app = router(AppState::new(orchestrator.clone(), store));

    let (_, health) = get_json(&app, "/api/v1/health").await;
    assert!(health["books_scraped"].is_null());

    let (status, started) = get_json(&app, "/api/v1/scraper/start").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["current_count"], 0);

    let run = orchestrator.wait().await;
    assert_eq!(run.state, ScrapeState::Done);

    let (_, status) = get_json(&app, "/api/v1/scraper/status").await;
    assert_eq!(status["state"], "Done");
    assert_eq!(status["books_collected"], 4);
    assert!(status["finished_at"].is_string());

    let (_, fiction) = get_json(&app, "/api/v1/books/search?category=Fiction").await;
    let titles: Vec<&str> = fiction
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Sharp Objects", "Dune"]);

    let (_, book) = get_json(&app, "/api/v1/books/0").await;
    assert_eq!(book["rating"], "Four");

    let (status, _) = get_json(&app, "/api/v1/books/4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, health) = get_json(&app, "/api/v1/health").await;
    assert_eq!(health["books_scraped"], 4);

    let (_, again) = get_json(&app, "/api/v1/scraper/start").await;
    assert_eq!(again["current_count"], 4);

    let (_, reset) = get_json(&app, "/api/v1/scraper/reset").await;
    assert_eq!(reset["current_count"], 0);

    let (_, status) = get_json(&app, "/api/v1/scraper/status").await;
    assert_eq!(status["state"], "Idle");
}
