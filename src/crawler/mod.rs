//! Crawler module for catalog fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with politeness delay and robots.txt rules
//! - Bounded retries with exponential backoff
//! - Listing and detail page parsing
//! - The crawl orchestrator and its lifecycle

mod fetcher;
mod orchestrator;
mod parser;
mod retry;

pub use fetcher::{build_http_client, Fetcher};
pub use orchestrator::{ControlResult, Orchestrator};
pub use parser::{parse_detail, parse_listing, ListingPage};
pub use retry::{is_retryable, retry_with_backoff, RetryPolicy};

use crate::config::Config;
use crate::storage::RecordStore;
use crate::{CrawlError, ScrapeRun};
use std::sync::Arc;

/// Runs one crawl to completion in the foreground
///
/// Starts the orchestrator over `store` and waits until the run has left the
/// active states. If the store already holds records nothing is crawled and the
/// restored run is returned.
///
/// # Returns
///
/// * `Ok(ScrapeRun)` - The final run snapshot (`Done` or `Error`)
/// * `Err(CrawlError)` - The orchestrator could not be created or started
pub async fn crawl(config: &Config, store: Arc<dyn RecordStore>) -> Result<ScrapeRun, CrawlError> {
    let orchestrator = Orchestrator::new(config, store)?;
    let started = orchestrator.start()?;
    tracing::info!("{}", started.message);
    Ok(orchestrator.wait().await)
}
