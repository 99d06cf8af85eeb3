//! Robots.txt handling module
//!
//! The catalog origin's robots.txt is fetched once per run. Anything other than a
//! successful response is treated as "allow everything".

mod parser;

pub use parser::{ParsedRobots, MAX_CRAWL_DELAY};

use reqwest::Client;
use url::Url;

/// Fetches robots.txt for the origin of `site`
pub async fn fetch_robots(client: &Client, site: &Url) -> ParsedRobots {
    let robots_url = match site.join("/robots.txt") {
        Ok(u) => u,
        Err(e) => {
            tracing::debug!("Cannot build robots.txt URL for {}: {}", site, e);
            return ParsedRobots::allow_all();
        }
    };

    tracing::debug!("Fetching {}", robots_url);
    let response = match client.get(robots_url.clone()).send().await {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            tracing::debug!("robots.txt returned HTTP {}, allowing all", r.status());
            return ParsedRobots::allow_all();
        }
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}
