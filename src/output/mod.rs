//! Output module for reporting on the collected catalog
//!
//! This module handles:
//! - The service health report
//! - Catalog statistics for the command line

pub mod health;
pub mod stats;

pub use health::HealthReport;
pub use stats::{print_statistics, CatalogStatistics};

use crate::storage::RecordStore;
use crate::CrawlError;

/// Loads the full snapshot from `store` and summarizes it
pub fn load_statistics(store: &dyn RecordStore) -> Result<CatalogStatistics, CrawlError> {
    let records = store.load_all()?;
    Ok(CatalogStatistics::from_snapshot(&records))
}
