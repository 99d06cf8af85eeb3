use crate::common::*;
use shelf_crawler::crawler::{crawl, Orchestrator};
use shelf_crawler::storage::{CsvRecordStore, RecordStore};
use shelf_crawler::ScrapeState;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

fn store_in(dir: &TempDir) -> Arc<CsvRecordStore> {
    Arc::new(CsvRecordStore::new(dir.path().join("books.csv")))
}

fn assert_contiguous_ids(store: &CsvRecordStore) {
    let records = store.load_all().unwrap();
    let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
    let expected: Vec<u64> = (0..records.len() as u64).collect();
    assert_eq!(ids, expected);
}

/// Polls `check` until it holds or a few seconds have passed
async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_full_crawl_catalog() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_catalog(&server, &[PAGE_ONE, PAGE_TWO, PAGE_THREE], Duration::ZERO).await;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let config = create_test_config(start_url(&server), store.path());

    let run = crawl(&config, store.clone()).await.unwrap();
    assert_eq!(run.state, ScrapeState::Done);
    assert_eq!(run.books_collected, 5);

    let records = store.load_all().unwrap();
    assert_contiguous_ids(&store);

    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Learning Python",
            "Sharp Objects",
            "Dune",
            "The Raven",
            "Soumission"
        ]
    );

    let first = &records[0];
    assert_eq!(first.price, "£12.50");
    assert_eq!(first.category, "Programming");
    assert_eq!(first.availability, "In stock (5 available)");
    assert_eq!(first.rating, "Four");
    assert_eq!(
        first.description,
        "About Learning Python, with a comma and a \"quote\"."
    );
    assert_eq!(records[3].rating, "One");
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        "User-agent: *\nDisallow: /catalogue/sharp-objects_2/",
    )
    .await;
    mount_catalog(&server, &[PAGE_ONE, PAGE_TWO], Duration::ZERO).await;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let config = create_test_config(start_url(&server), store.path());

    let run = crawl(&config, store.clone()).await.unwrap();
    assert_eq!(run.state, ScrapeState::Done);
    assert_eq!(run.books_collected, 3);

    let records = store.load_all().unwrap();
    assert!(records.iter().all(|r| r.title != "Sharp Objects"));
    assert_contiguous_ids(&store);
}

#[tokio::test]
async fn test_robots_disallowed_listing_is_fatal() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: TestBot\nDisallow: /catalogue/").await;
    mount_catalog(&server, &[PAGE_ONE], Duration::ZERO).await;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let config = create_test_config(start_url(&server), store.path());

    let run = crawl(&config, store.clone()).await.unwrap();
    assert_eq!(run.state, ScrapeState::Error);
    assert!(run.message.contains("robots.txt"));
    assert!(store.load_all().unwrap().is_empty());
}

#[tokio::test]
async fn test_failing_item_is_skipped() {
    let server = MockServer::start().await;
    // Mounted first so it wins over the catalog's detail page
    mount_status(&server, "/catalogue/dune_3/index.html", 404).await;
    mount_catalog(&server, &[PAGE_ONE, PAGE_TWO], Duration::ZERO).await;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let config = create_test_config(start_url(&server), store.path());

    let run = crawl(&config, store.clone()).await.unwrap();
    assert_eq!(run.state, ScrapeState::Done);
    assert_eq!(run.books_collected, 3);

    let records = store.load_all().unwrap();
    assert!(records.iter().all(|r| r.title != "Dune"));
    assert_eq!(records[2].title, "The Raven");
    assert_contiguous_ids(&store);
}

#[tokio::test]
async fn test_listing_failure_keeps_partial_data() {
    let server = MockServer::start().await;
    mount_status(&server, "/catalogue/page-2.html", 503).await;
    mount_catalog(&server, &[PAGE_ONE, PAGE_TWO], Duration::ZERO).await;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let config = create_test_config(start_url(&server), store.path());

    let run = crawl(&config, store.clone()).await.unwrap();
    assert_eq!(run.state, ScrapeState::Error);
    assert_eq!(run.books_collected, 2);
    assert!(run.message.contains("2 books were kept"));

    assert_eq!(store.load_all().unwrap().len(), 2);
    assert_contiguous_ids(&store);
}

#[tokio::test]
async fn test_unparseable_listing_is_fatal() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/catalogue/page-1.html",
        "<html><body><p>Maintenance</p></body></html>".to_string(),
        Duration::ZERO,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let config = create_test_config(start_url(&server), store.path());

    let run = crawl(&config, store.clone()).await.unwrap();
    assert_eq!(run.state, ScrapeState::Error);
    assert!(run.message.contains("Missing page structure"));
}

#[tokio::test]
async fn test_empty_catalog_finishes_with_nothing() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/catalogue/page-1.html",
        listing_html(&[], Some("page-2.html")),
        Duration::ZERO,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let config = create_test_config(start_url(&server), store.path());

    let run = crawl(&config, store.clone()).await.unwrap();
    assert_eq!(run.state, ScrapeState::Done);
    assert_eq!(run.books_collected, 0);
    assert_eq!(store.metadata().unwrap(), None);
}

#[tokio::test]
async fn test_max_pages_limits_the_crawl() {
    let server = MockServer::start().await;
    mount_catalog(&server, &[PAGE_ONE, PAGE_TWO, PAGE_THREE], Duration::ZERO).await;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let mut config = create_test_config(start_url(&server), store.path());
    config.crawler.max_pages = 2;

    let run = crawl(&config, store.clone()).await.unwrap();
    assert_eq!(run.state, ScrapeState::Done);
    assert_eq!(run.books_collected, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_start_while_running_reports_progress() {
    let server = MockServer::start().await;
    mount_catalog(&server, &[PAGE_ONE, PAGE_TWO], Duration::from_millis(100)).await;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let config = create_test_config(start_url(&server), store.path());
    let orchestrator = Orchestrator::new(&config, store.clone()).unwrap();

    let first = orchestrator.start().unwrap();
    assert!(first.message.starts_with("Scraping started"));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.start().unwrap() })
        })
        .collect();
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.message.starts_with("Scraping in progress"));
        assert!(result.current_count <= 4);
    }

    let run = orchestrator.wait().await;
    assert_eq!(run.state, ScrapeState::Done);
    assert_eq!(store.load_all().unwrap().len(), 4);
    assert_contiguous_ids(&store);
}

#[tokio::test]
async fn test_reset_during_running_discards_everything() {
    let server = MockServer::start().await;
    mount_catalog(
        &server,
        &[PAGE_ONE, PAGE_TWO, PAGE_THREE],
        Duration::from_millis(150),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let config = create_test_config(start_url(&server), store.path());
    let orchestrator = Orchestrator::new(&config, store.clone()).unwrap();

    orchestrator.start().unwrap();
    eventually(|| orchestrator.status().books_collected >= 1).await;
    assert_eq!(orchestrator.status().state, ScrapeState::Running);

    let reset = orchestrator.reset().await.unwrap();
    assert_eq!(reset.current_count, 0);

    let status = orchestrator.status();
    assert_eq!(status.state, ScrapeState::Idle);
    assert_eq!(status.books_collected, 0);
    assert!(store.load_all().unwrap().is_empty());

    // The stopped loop must not write anything afterwards
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(store.load_all().unwrap().is_empty());
    assert_eq!(orchestrator.status().state, ScrapeState::Idle);

    // And a new crawl starts from id 0
    orchestrator.start().unwrap();
    let run = orchestrator.wait().await;
    assert_eq!(run.books_collected, 5);
    assert_contiguous_ids(&store);
}

#[tokio::test]
async fn test_absurd_crawl_delay_does_not_wedge_the_run() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nCrawl-delay: 1e20\n").await;
    mount_page(
        &server,
        "/catalogue/page-1.html",
        listing_html(&[], None),
        Duration::ZERO,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let config = create_test_config(start_url(&server), store.path());
    let orchestrator = Orchestrator::new(&config, store.clone()).unwrap();

    orchestrator.start().unwrap();
    let run = tokio::time::timeout(Duration::from_secs(5), orchestrator.wait())
        .await
        .expect("crawl should finish");
    assert_eq!(run.state, ScrapeState::Done);
    assert_eq!(orchestrator.status().state, ScrapeState::Done);
}
