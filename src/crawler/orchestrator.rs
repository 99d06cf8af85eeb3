//! Crawl orchestrator - lifecycle and main crawl loop
//!
//! The orchestrator owns the process-wide [`ScrapeRun`] and the handle of the one
//! background crawl task that may exist at a time. It exposes three control
//! operations:
//! - `start`: launches the crawl loop in the background and returns immediately
//! - `status`: returns a consistent snapshot of the run
//! - `reset`: stops any active crawl, waits for it to exit, then empties the store
//!
//! The crawl loop walks the listing pages in order, and for every item link
//! fetches, parses and normalizes the detail page before appending it to the
//! record store with the next sequential id.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::parser::{parse_detail, parse_listing};
use crate::record::normalize;
use crate::state::{running_message, ScrapeRun, ScrapeState};
use crate::storage::RecordStore;
use crate::CrawlError;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Result of a control operation, ready for direct serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlResult {
    pub message: String,
    pub current_count: u64,
}

impl ControlResult {
    fn new(message: impl Into<String>, current_count: u64) -> Self {
        Self {
            message: message.into(),
            current_count,
        }
    }
}

/// Handle of the background crawl task
struct RunningCrawl {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

struct Inner {
    crawler: CrawlerConfig,
    agent_name: String,
    client: Client,
    store: Arc<dyn RecordStore>,

    /// Lock order: `run` before `task`
    run: Mutex<ScrapeRun>,
    task: Mutex<Option<RunningCrawl>>,

    /// Mirrors `run.state` for `wait`
    state_tx: watch::Sender<ScrapeState>,

    /// Written for the whole of a reset; `start` reads it and refuses while it is written
    reset_gate: tokio::sync::RwLock<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Crawl orchestrator
///
/// Cheap to clone; all clones drive the same run.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Creates an orchestrator over `store`
    ///
    /// If the store already holds records the run starts out `Done` with their
    /// count, so a restarted process keeps serving what it collected before.
    pub fn new(config: &Config, store: Arc<dyn RecordStore>) -> Result<Self, CrawlError> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;

        let existing = store.count()? as u64;
        let run = if existing > 0 {
            tracing::info!("Record store already holds {} books", existing);
            ScrapeRun::restored(existing)
        } else {
            ScrapeRun::idle()
        };

        let (state_tx, _) = watch::channel(run.state);

        Ok(Self {
            inner: Arc::new(Inner {
                crawler: config.crawler.clone(),
                agent_name: config.user_agent.crawler_name.clone(),
                client,
                store,
                run: Mutex::new(run),
                task: Mutex::new(None),
                state_tx,
                reset_gate: tokio::sync::RwLock::new(()),
            }),
        })
    }

    /// Launches a crawl in the background unless one is active or data exists
    ///
    /// Must be called from within a tokio runtime. The active-run check and the
    /// move to `Running` happen under one lock, so concurrent callers launch at
    /// most one crawl loop. The store is counted before that lock is taken.
    pub fn start(&self) -> Result<ControlResult, CrawlError> {
        let Ok(_gate) = self.inner.reset_gate.try_read() else {
            let count = self.status().books_collected;
            return Ok(ControlResult::new(
                "A reset is in progress. Try again once it has finished.",
                count,
            ));
        };

        if let Some(progress) = in_progress(&lock(&self.inner.run)) {
            return Ok(progress);
        }

        let stored = self.inner.store.count()? as u64;

        let mut run = lock(&self.inner.run);
        if let Some(progress) = in_progress(&run) {
            return Ok(progress);
        }

        // A run that finished after the count still owns its records
        let existing = stored.max(run.books_collected);
        if existing > 0 {
            return Ok(ControlResult::new(
                format!(
                    "Already have {} books. Reset before starting a new scrape.",
                    existing
                ),
                existing,
            ));
        }

        if !run.begin(Utc::now()) {
            return Ok(ControlResult::new(run.message.clone(), run.books_collected));
        }
        self.inner.state_tx.send_replace(run.state);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_crawl(Arc::clone(&self.inner), cancel.clone()));
        *lock(&self.inner.task) = Some(RunningCrawl { handle, cancel });

        tracing::info!("Crawl started from {}", self.inner.crawler.start_url);
        Ok(ControlResult::new("Scraping started in the background.", 0))
    }

    /// Returns a consistent snapshot of the current run
    pub fn status(&self) -> ScrapeRun {
        lock(&self.inner.run).clone()
    }

    /// Stops any active crawl and deletes every persisted record
    ///
    /// While a crawl is active this waits until the loop has acknowledged the
    /// cancellation, so the store is never cleared under an in-flight append.
    pub async fn reset(&self) -> Result<ControlResult, CrawlError> {
        let _gate = self.inner.reset_gate.write().await;

        if self.inner.update_run(|run| run.begin_stopping()) {
            tracing::info!("Stopping the active crawl");
        }

        let task = lock(&self.inner.task).take();
        if let Some(task) = task {
            task.cancel.cancel();
            if let Err(e) = task.handle.await {
                tracing::warn!("Crawl task ended abnormally: {}", e);
            }
        }

        if let Err(e) = self.inner.store.reset() {
            tracing::error!("Failed to reset record store: {}", e);
            let reason = format!("could not clear the record store ({})", e);
            self.inner.update_run(|run| {
                if run.state == ScrapeState::Stopping {
                    run.fail(&reason, Utc::now());
                }
            });
            return Err(e.into());
        }

        self.inner.update_run(|run| run.clear());
        tracing::info!("Crawl state and record store reset");
        Ok(ControlResult::new(
            "Scraping reset. All collected books were deleted.",
            0,
        ))
    }

    /// Waits until no crawl is active and returns the resulting snapshot
    pub async fn wait(&self) -> ScrapeRun {
        let mut rx = self.inner.state_tx.subscribe();
        if let Err(e) = rx.wait_for(|state| !state.is_active()).await {
            tracing::debug!("State channel closed: {}", e);
        }
        self.status()
    }
}

fn in_progress(run: &ScrapeRun) -> Option<ControlResult> {
    run.state.is_active().then(|| {
        ControlResult::new(running_message(run.books_collected), run.books_collected)
    })
}

impl Inner {
    /// Applies `f` to the run under its lock and publishes the resulting state
    fn update_run<R>(&self, f: impl FnOnce(&mut ScrapeRun) -> R) -> R {
        let mut run = lock(&self.run);
        let result = f(&mut run);
        self.state_tx.send_replace(run.state);
        result
    }

    /// Runs the crawl loop to the end of the catalog
    ///
    /// Returns `CrawlError::Cancelled` once the token fires; cancellation is
    /// checked before every page and every item.
    async fn crawl_catalog(&self, cancel: &CancellationToken) -> Result<(), CrawlError> {
        let start_url = Url::parse(&self.crawler.start_url)?;
        let fetcher = Fetcher::new(self.client.clone(), &self.crawler, &self.agent_name);

        if self.crawler.respect_robots {
            fetcher.load_robots(&start_url).await;
        }

        let mut next_page = Some(start_url);
        let mut next_id: u64 = 0;
        let mut pages: u32 = 0;
        let started = std::time::Instant::now();

        while let Some(page_url) = next_page.take() {
            if cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }
            if pages >= self.crawler.max_pages {
                tracing::warn!(
                    "Stopping after {} listing pages (max-pages reached)",
                    pages
                );
                break;
            }
            pages += 1;

            let listing = fetcher.fetch(&page_url, cancel, parse_listing).await?;
            if listing.is_exhausted() {
                tracing::info!(page = pages, "Listing page has no items, catalog exhausted");
                break;
            }
            tracing::debug!(page = pages, items = listing.items.len(), "Parsed {}", page_url);

            for item_url in &listing.items {
                if cancel.is_cancelled() {
                    return Err(CrawlError::Cancelled);
                }

                let fetched = fetcher.fetch(item_url, cancel, |html, _| parse_detail(html));
                let raw = match fetched.await {
                    Ok(raw) => raw,
                    Err(CrawlError::Cancelled) => return Err(CrawlError::Cancelled),
                    Err(e) => {
                        tracing::warn!(url = %item_url, "Skipping item: {}", e);
                        continue;
                    }
                };

                let record = normalize(&raw, next_id);
                self.store.append(&record)?;
                next_id += 1;
                self.update_run(|run| run.record_book());
                tracing::debug!(id = record.id, "Stored '{}'", record.title);
            }

            if pages % 10 == 0 {
                tracing::info!(
                    "Progress: {} pages, {} books, {:.1}s elapsed",
                    pages,
                    next_id,
                    started.elapsed().as_secs_f64()
                );
            }

            next_page = listing.next;
        }

        tracing::info!(
            "Catalog crawl finished: {} books from {} pages in {:?}",
            next_id,
            pages,
            started.elapsed()
        );
        Ok(())
    }
}

/// Body of the background crawl task
///
/// The loop runs in a task of its own so that a panic inside it still ends
/// the run instead of leaving it `Running`.
async fn run_crawl(inner: Arc<Inner>, cancel: CancellationToken) {
    let crawl_loop = tokio::spawn({
        let inner = Arc::clone(&inner);
        async move { inner.crawl_catalog(&cancel).await }
    });
    let outcome = crawl_loop.await;
    let now = Utc::now();

    inner.update_run(|run| {
        // A reset owns the run from here on
        if run.state != ScrapeState::Running {
            tracing::debug!("Crawl loop exited while {}", run.state);
            return;
        }

        match outcome {
            Ok(Ok(())) => {
                run.complete(now);
                tracing::info!("{}", run.message);
            }
            Ok(Err(CrawlError::Cancelled)) => {
                tracing::warn!("Crawl cancelled without a stop request");
                run.fail("the crawl was cancelled", now);
            }
            Ok(Err(e)) => {
                tracing::error!("Crawl failed: {}", e);
                run.fail(&e.to_string(), now);
            }
            Err(e) => {
                tracing::error!("Crawl loop aborted: {}", e);
                run.fail(&format!("the crawl loop stopped unexpectedly ({})", e), now);
            }
        }
    });
}
