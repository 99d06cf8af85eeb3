//! State module for tracking crawl progress
//!
//! This module provides the state shared between the orchestrator and its callers.
//!
//! # Components
//!
//! - `ScrapeState`: lifecycle of the crawl (idle, running, stopping, done, error)
//! - `ScrapeRun`: the process-wide record of the current or last crawl
//! - `Politeness`: minimum spacing between consecutive requests

mod politeness;
mod run_state;

// Re-export main types
pub use politeness::Politeness;
pub use run_state::{ScrapeRun, ScrapeState};

pub(crate) use run_state::running_message;
