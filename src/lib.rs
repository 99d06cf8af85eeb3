//! Shelf-Crawler: a polite catalog crawler
//!
//! This crate crawls a paginated book catalog, normalizes every detail page into a
//! [`BookRecord`], appends the records to a CSV store and serves them back through a
//! filtering query surface. A single background crawl may be active at any time.

pub mod api;
pub mod config;
pub mod crawler;
pub mod output;
pub mod query;
pub mod record;
pub mod robots;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Shelf-Crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Book not found: {id}")]
    NotFound { id: i64 },

    #[error("Crawl cancelled")]
    Cancelled,

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Network failures while retrieving a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl FetchError {
    /// Whether another attempt at the same URL could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Connect { .. } | Self::Status { .. } | Self::Body { .. }
        )
    }
}

/// Page structure errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Missing page structure: {what}")]
    MissingStructure { what: &'static str },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid link '{href}': {message}")]
    InvalidUrl { href: String, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

pub use storage::StorageError;

/// Result type alias for Shelf-Crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{ControlResult, Orchestrator};
pub use query::QueryService;
pub use record::BookRecord;
pub use state::{ScrapeRun, ScrapeState};
pub use storage::{CsvRecordStore, RecordStore};
