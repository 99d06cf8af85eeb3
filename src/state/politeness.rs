use std::time::{Duration, Instant};

/// Tracks request timing so consecutive requests keep a minimum gap
#[derive(Debug, Clone)]
pub struct Politeness {
    /// Minimum time between the start of two requests
    delay: Duration,

    /// Timestamp of the last request
    last_request_time: Option<Instant>,
}

impl Politeness {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request_time: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Raises the delay to `delay` if it is longer than the current one
    ///
    /// Used for robots.txt `Crawl-delay`, which may only make the crawler slower.
    pub fn raise_delay(&mut self, delay: Duration) {
        if delay > self.delay {
            self.delay = delay;
        }
    }

    /// Records that a request was made
    pub fn record_request(&mut self, now: Instant) {
        self.last_request_time = Some(now);
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.delay {
            Some(self.delay - elapsed)
        } else {
            None
        }
    }
}
