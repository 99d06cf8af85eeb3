use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// A validated configuration and the digest of the file it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// Hex SHA-256 of the exact bytes that were parsed
    pub sha256: String,
}

/// Reads, parses and validates the configuration file at `path`
///
/// The file is read once; the digest is taken over the same text that was
/// parsed, so a logged hash always identifies the configuration in effect.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use shelf_crawler::config::load_config;
///
/// let loaded = load_config(Path::new("config.toml")).unwrap();
/// println!("{} ({})", loaded.config.crawler.start_url, loaded.sha256);
/// ```
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok(LoadedConfig {
        config,
        sha256: hex::encode(Sha256::digest(content.as_bytes())),
    })
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}
