//! Storage module for persisting crawled records
//!
//! This module handles the durable record table, including:
//! - Appending records as they are extracted
//! - Loading a full catalog snapshot for queries
//! - Atomic reset of the whole table
//! - File metadata for health reporting

mod csv_store;
mod traits;

pub use csv_store::CsvRecordStore;
pub use traits::{RecordStore, StorageError, StorageResult, StoreMetadata};

use crate::record::BookRecord;

/// The full, ordered set of persisted records
pub type CatalogSnapshot = Vec<BookRecord>;
