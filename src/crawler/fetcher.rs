//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Keeping a minimum delay between consecutive requests
//! - Honoring robots.txt rules for the catalog origin
//! - Error classification and retry with backoff

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::retry::{retry_with_backoff, RetryPolicy};
use crate::robots::{fetch_robots, ParsedRobots};
use crate::state::Politeness;
use crate::{CrawlError, FetchError, ParseError};
use reqwest::Client;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Upper bound for a whole request, body included
///
/// # Example
///
/// ```no_run
/// use shelf_crawler::config::UserAgentConfig;
/// use shelf_crawler::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "ShelfCrawler".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, FetchError> {
    let client = Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()?;
    Ok(client)
}

/// Polite page fetcher for one crawl run
///
/// Requests are serialized: each one waits until the politeness delay has
/// elapsed since the previous request started.
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
    agent_name: String,
    politeness: Mutex<Politeness>,
    robots: RwLock<ParsedRobots>,
}

impl Fetcher {
    pub fn new(client: Client, config: &CrawlerConfig, agent_name: &str) -> Self {
        Self {
            client,
            retry: RetryPolicy::from_config(config),
            agent_name: agent_name.to_string(),
            politeness: Mutex::new(Politeness::new(config.politeness_delay())),
            robots: RwLock::new(ParsedRobots::allow_all()),
        }
    }

    /// Loads robots.txt for the origin of `site`
    ///
    /// A `Crawl-delay` longer than the configured politeness delay replaces it.
    pub async fn load_robots(&self, site: &Url) {
        let robots = fetch_robots(&self.client, site).await;

        if let Some(delay) = robots.crawl_delay(&self.agent_name) {
            let mut politeness = self.politeness.lock().await;
            politeness.raise_delay(delay);
            tracing::info!(
                "robots.txt crawl delay in effect: {}ms",
                politeness.delay().as_millis()
            );
        }

        *self.robots.write().unwrap_or_else(PoisonError::into_inner) = robots;
    }

    fn is_allowed(&self, url: &Url) -> bool {
        self.robots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_allowed(url.as_str(), &self.agent_name)
    }

    /// Waits for our turn under the politeness delay and claims it
    async fn wait_turn(&self) {
        let mut politeness = self.politeness.lock().await;
        if let Some(wait) = politeness.time_until_next_request(Instant::now()) {
            tokio::time::sleep(wait).await;
        }
        politeness.record_request(Instant::now());
    }

    /// Fetches `url` once, without retries
    ///
    /// # Error Classification
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Disallowed by robots.txt | `RobotsDenied` (not retryable) |
    /// | Request or body timeout | `Timeout` |
    /// | Connection refused, DNS, TLS | `Connect` |
    /// | Non-2xx status | `Status` |
    /// | Body could not be read | `Body` |
    pub async fn fetch_once(&self, url: &Url) -> Result<String, FetchError> {
        if !self.is_allowed(url) {
            return Err(FetchError::RobotsDenied {
                url: url.to_string(),
            });
        }

        self.wait_turn().await;
        tracing::trace!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    /// Fetches `url` and hands the body to `parse`, retrying the pair with backoff
    ///
    /// A page that arrives but does not parse is retried like a network
    /// failure. robots.txt denials and cancellation end the attempts at once.
    pub async fn fetch<T, P>(
        &self,
        url: &Url,
        cancel: &CancellationToken,
        parse: P,
    ) -> Result<T, CrawlError>
    where
        P: Fn(&str, &Url) -> Result<T, ParseError>,
    {
        let parse = &parse;
        retry_with_backoff(&self.retry, cancel, url.as_str(), move || async move {
            let html = self.fetch_once(url).await?;
            Ok(parse(&html, url)?)
        })
        .await
    }
}

fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
