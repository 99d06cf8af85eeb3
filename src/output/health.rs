//! Health report for the service

use crate::state::ScrapeRun;
use crate::storage::{RecordStore, StorageResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Service health snapshot
///
/// The storage fields are `None` while no record store file exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub api_status: String,
    pub uptime_seconds: u64,
    pub scraping_status_message: String,
    pub books_scraped: Option<u64>,
    pub storage_size_mb: Option<f64>,
    pub storage_created_at: Option<DateTime<Utc>>,
}

impl HealthReport {
    pub fn collect(
        uptime: Duration,
        run: &ScrapeRun,
        store: &dyn RecordStore,
    ) -> StorageResult<Self> {
        let (books_scraped, storage_size_mb, storage_created_at) = match store.metadata()? {
            Some(meta) => (
                Some(store.count()? as u64),
                Some(meta.size_mb()),
                Some(meta.created_at),
            ),
            None => (None, None, None),
        };

        Ok(Self {
            api_status: "online".to_string(),
            uptime_seconds: uptime.as_secs(),
            scraping_status_message: run.message.clone(),
            books_scraped,
            storage_size_mb,
            storage_created_at,
        })
    }
}
