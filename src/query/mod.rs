//! Read-only query surface over the record store
//!
//! Every query loads a fresh catalog snapshot, so results always reflect what
//! is on disk, including records appended by a crawl that is still running.

use crate::record::BookRecord;
use crate::storage::{CatalogSnapshot, RecordStore};
use crate::CrawlError;
use std::sync::Arc;

/// Filtering, listing and lookup over persisted books
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn RecordStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    fn snapshot(&self) -> Result<CatalogSnapshot, CrawlError> {
        let mut records = self.store.load_all()?;
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    /// Number of persisted books
    pub fn count(&self) -> Result<usize, CrawlError> {
        Ok(self.store.count()?)
    }

    /// All titles in ascending id order
    pub fn list_titles(&self) -> Result<Vec<String>, CrawlError> {
        Ok(self.snapshot()?.into_iter().map(|r| r.title).collect())
    }

    /// Books matching every supplied filter, in ascending id order
    ///
    /// # Matching
    ///
    /// | Filter | Rule |
    /// |--------|------|
    /// | `title` | case-insensitive substring |
    /// | `category` | case-sensitive exact match |
    ///
    /// With neither filter every book is returned.
    pub fn search(
        &self,
        title: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<BookRecord>, CrawlError> {
        let needle = title.map(str::to_lowercase);

        Ok(self
            .snapshot()?
            .into_iter()
            .filter(|r| {
                needle
                    .as_deref()
                    .map_or(true, |n| r.title.to_lowercase().contains(n))
            })
            .filter(|r| category.map_or(true, |c| r.category == c))
            .collect())
    }

    /// Distinct categories, sorted ascending
    pub fn list_categories(&self) -> Result<Vec<String>, CrawlError> {
        let mut categories: Vec<String> = self
            .store
            .load_all()?
            .into_iter()
            .map(|r| r.category)
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    /// Looks up one book by id
    ///
    /// Ids outside `[0, count)` yield `CrawlError::NotFound`.
    pub fn get_by_id(&self, id: i64) -> Result<BookRecord, CrawlError> {
        let Ok(wanted) = u64::try_from(id) else {
            return Err(CrawlError::NotFound { id });
        };

        self.store
            .load_all()?
            .into_iter()
            .find(|r| r.id == wanted)
            .ok_or(CrawlError::NotFound { id })
    }
}
