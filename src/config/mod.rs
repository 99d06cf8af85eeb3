//! Configuration module for Shelf-Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use shelf_crawler::config::load_config;
//! use std::path::Path;
//!
//! let loaded = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawl starts at: {}", loaded.config.crawler.start_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, ServerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config, LoadedConfig};
pub use validation::validate;
