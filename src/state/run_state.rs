//! Crawl lifecycle definitions
//!
//! This module defines the states a crawl run moves through and the run record
//! the orchestrator keeps behind its lock.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Represents the current state of the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScrapeState {
    /// No crawl has run since the last reset
    Idle,

    /// The background crawl loop is active
    Running,

    /// A reset asked the loop to stop and is waiting for it
    Stopping,

    /// The catalog was exhausted
    Done,

    /// The run aborted; records persisted before the failure are kept
    Error,
}

impl ScrapeState {
    /// Returns true while a crawl loop exists (single-flight guard)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Stopping)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    ///
    /// | From | Allowed targets |
    /// |------|-----------------|
    /// | Idle, Done, Error | Running, Idle |
    /// | Running | Done, Error, Stopping |
    /// | Stopping | Idle, Error |
    ///
    /// `Stopping -> Error` is only taken when discarding the stopped run's data fails.
    pub fn can_transition_to(&self, next: ScrapeState) -> bool {
        use ScrapeState::*;
        match self {
            Idle | Done | Error => matches!(next, Running | Idle),
            Running => matches!(next, Done | Error | Stopping),
            Stopping => matches!(next, Idle | Error),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Stopping => "Stopping",
            Self::Done => "Done",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for ScrapeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current or last crawl run
///
/// Only the orchestrator mutates this, always under its lock, so a clone is a
/// consistent snapshot of `state`, `books_collected` and `message` together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeRun {
    pub state: ScrapeState,
    pub books_collected: u64,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScrapeRun {
    /// A run that has not started
    pub fn idle() -> Self {
        Self {
            state: ScrapeState::Idle,
            books_collected: 0,
            message: idle_message(),
            started_at: None,
            finished_at: None,
        }
    }

    /// A finished run restored from `count` persisted records
    pub fn restored(count: u64) -> Self {
        Self {
            state: ScrapeState::Done,
            books_collected: count,
            message: done_message(count),
            started_at: None,
            finished_at: None,
        }
    }

    /// Moves to `next` if the transition is legal
    ///
    /// Returns false, leaving the run untouched, otherwise.
    fn transition(&mut self, next: ScrapeState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::debug!("Refusing transition {} -> {}", self.state, next);
            return false;
        }
        self.state = next;
        true
    }

    /// Enters `Running` with cleared bookkeeping
    pub fn begin(&mut self, now: DateTime<Utc>) -> bool {
        if !self.transition(ScrapeState::Running) {
            return false;
        }
        self.books_collected = 0;
        self.started_at = Some(now);
        self.finished_at = None;
        self.message = running_message(0);
        true
    }

    /// Counts one persisted record
    pub fn record_book(&mut self) {
        if self.state == ScrapeState::Running {
            self.books_collected += 1;
            self.message = running_message(self.books_collected);
        }
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if !self.transition(ScrapeState::Done) {
            return false;
        }
        self.finished_at = Some(now);
        self.message = done_message(self.books_collected);
        true
    }

    pub fn fail(&mut self, reason: &str, now: DateTime<Utc>) -> bool {
        if !self.transition(ScrapeState::Error) {
            return false;
        }
        self.finished_at = Some(now);
        self.message = format!(
            "Scraping failed: {}. {} books were kept; reset to try again.",
            reason, self.books_collected
        );
        true
    }

    pub fn begin_stopping(&mut self) -> bool {
        if !self.transition(ScrapeState::Stopping) {
            return false;
        }
        self.message = "Stopping the current scrape...".to_string();
        true
    }

    /// Returns to `Idle` with counters cleared
    pub fn clear(&mut self) {
        if self.transition(ScrapeState::Idle) {
            *self = Self::idle();
        }
    }
}

impl Default for ScrapeRun {
    fn default() -> Self {
        Self::idle()
    }
}

fn idle_message() -> String {
    "Scraping has not started yet. Call start to begin collecting books.".to_string()
}

pub(crate) fn running_message(count: u64) -> String {
    format!("Scraping in progress: {} books collected so far.", count)
}

fn done_message(count: u64) -> String {
    format!(
        "Scraping finished: {} books collected and available for queries.",
        count
    )
}
