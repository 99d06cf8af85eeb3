//! Robots.txt rules backed by the robotstxt crate

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Upper bound on a `Crawl-delay` taken from a remote robots.txt
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// Robots.txt rules for the catalog origin
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt body; `None` allows everything
    content: Option<String>,
}

impl ParsedRobots {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
        }
    }

    /// Permissive rules, used when robots.txt is missing or unreadable
    pub fn allow_all() -> Self {
        Self { content: None }
    }

    /// Checks if `url` may be fetched by `user_agent`
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match self.content.as_deref() {
            None | Some("") => true,
            Some(body) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(body, user_agent, url)
            }
        }
    }

    /// `Crawl-delay` for `user_agent`, preferring its own group over `*`
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        let body = self.content.as_deref()?;
        let agent = user_agent.to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut group_closed = false;
        let mut for_agent = None;
        let mut for_wildcard = None;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if group_closed {
                        group.clear();
                        group_closed = false;
                    }
                    if !value.is_empty() {
                        group.push(value.to_lowercase());
                    }
                }
                "crawl-delay" => {
                    group_closed = true;
                    let Some(delay) = parse_delay(value) else {
                        continue;
                    };
                    if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                        for_agent = Some(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        for_wildcard = Some(delay);
                    }
                }
                _ => group_closed = true,
            }
        }

        for_agent.or(for_wildcard)
    }
}

/// Seconds as written in robots.txt, capped at [`MAX_CRAWL_DELAY`]
fn parse_delay(value: &str) -> Option<Duration> {
    let secs = value.parse::<f64>().ok()?;
    if secs.is_nan() || secs < 0.0 {
        return None;
    }
    let delay = Duration::try_from_secs_f64(secs).unwrap_or(MAX_CRAWL_DELAY);
    Some(delay.min(MAX_CRAWL_DELAY))
}
