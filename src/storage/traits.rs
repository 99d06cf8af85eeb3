//! Storage traits and error types
//!
//! This module defines the trait interface for record store backends and
//! associated error types.

use crate::record::BookRecord;
use crate::storage::CatalogSnapshot;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Corrupt record at line {line}: {message}")]
    Corrupt { line: u64, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Filesystem facts about the store, used only for health reporting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreMetadata {
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl StoreMetadata {
    pub fn size_mb(&self) -> f64 {
        let mb = self.size_bytes as f64 / (1024.0 * 1024.0);
        (mb * 1000.0).round() / 1000.0
    }
}

/// Trait for record store implementations
///
/// Implementations serialize mutations internally: `append` and `reset` never
/// interleave, and `load_all` never observes a half-written record.
pub trait RecordStore: Send + Sync {
    /// Appends one record, creating the table and its header on first write
    fn append(&self, record: &BookRecord) -> StorageResult<()>;

    /// Reads every persisted record in storage order
    ///
    /// Returns an empty snapshot if nothing has been persisted.
    fn load_all(&self) -> StorageResult<CatalogSnapshot>;

    /// Removes all records atomically
    fn reset(&self) -> StorageResult<()>;

    /// Returns `None` when the table does not exist
    fn metadata(&self) -> StorageResult<Option<StoreMetadata>>;

    /// Number of persisted records
    fn count(&self) -> StorageResult<usize> {
        Ok(self.load_all()?.len())
    }
}
