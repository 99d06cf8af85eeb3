//! CSV record store implementation
//!
//! Records live in a single comma-delimited file with a header row. Values that
//! contain the delimiter, a line break or a quote are quoted with doubled-quote
//! escaping, so every record reloads field-for-field.

use crate::record::{BookRecord, FIELD_NAMES};
use crate::storage::traits::{RecordStore, StorageError, StorageResult, StoreMetadata};
use crate::storage::CatalogSnapshot;
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// CSV-file record store
pub struct CsvRecordStore {
    path: PathBuf,
    /// Appends and resets hold the write side, loads hold the read side
    access: RwLock<()>,
}

impl CsvRecordStore {
    /// Creates a store backed by the file at `path`
    ///
    /// The file is not touched until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            access: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn needs_header(&self) -> StorageResult<bool> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }
}

impl RecordStore for CsvRecordStore {
    fn append(&self, record: &BookRecord) -> StorageResult<()> {
        let _guard = self.access.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let write_header = self.needs_header()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer.write_record(FIELD_NAMES)?;
        }
        writer.serialize(record)?;
        writer.flush()?;

        Ok(())
    }

    fn load_all(&self) -> StorageResult<CatalogSnapshot> {
        let _guard = self.access.read().unwrap_or_else(PoisonError::into_inner);

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Ok(Vec::new());
        }
        if !headers.iter().eq(FIELD_NAMES.iter().copied()) {
            return Err(StorageError::Corrupt {
                line: 1,
                message: format!("unexpected header {:?}", headers),
            });
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();

            // A crash mid-append can leave a short trailing row behind
            if row.len() != FIELD_NAMES.len() {
                tracing::warn!(
                    line,
                    fields = row.len(),
                    "Skipping incomplete row in {}",
                    self.path.display()
                );
                continue;
            }

            let record: BookRecord =
                row.deserialize(Some(&headers))
                    .map_err(|e| StorageError::Corrupt {
                        line,
                        message: e.to_string(),
                    })?;
            records.push(record);
        }

        Ok(records)
    }

    fn reset(&self) -> StorageResult<()> {
        let _guard = self.access.write().unwrap_or_else(PoisonError::into_inner);

        // Move the table aside in one rename so readers see either all of it or none
        let discarded = self.sibling(".discard");
        match fs::rename(&self.path, &discarded) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = fs::remove_file(&discarded) {
            tracing::warn!("Failed to remove {}: {}", discarded.display(), e);
        }

        tracing::info!("Record store {} reset", self.path.display());
        Ok(())
    }

    fn metadata(&self) -> StorageResult<Option<StoreMetadata>> {
        let meta = match fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // Not every filesystem records birth time
        let created = meta.created().or_else(|_| meta.modified())?;

        Ok(Some(StoreMetadata {
            size_bytes: meta.len(),
            created_at: DateTime::<Utc>::from(created),
        }))
    }
}
