//! Shelf-Crawler main entry point
//!
//! This is the command-line interface for the Shelf-Crawler catalog crawler.

use clap::Parser;
use shelf_crawler::api::{router, AppState};
use shelf_crawler::config::{load_config, Config};
use shelf_crawler::crawler::Orchestrator;
use shelf_crawler::storage::{CsvRecordStore, RecordStore};
use shelf_crawler::ScrapeState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Shelf-Crawler: A polite catalog crawler
///
/// Shelf-Crawler walks a paginated book catalog, stores every book in a CSV
/// file and serves the collection through a small REST API.
#[derive(Parser, Debug)]
#[command(name = "shelf-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run one crawl in the foreground and exit
    #[arg(long, conflicts_with_all = ["stats", "dry_run"])]
    crawl: bool,

    /// Show statistics from the record store and exit
    #[arg(long, conflicts_with_all = ["crawl", "dry_run"])]
    stats: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["crawl", "stats"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(loaded) => {
            tracing::info!("Configuration loaded successfully (sha256: {})", loaded.sha256);
            loaded.config
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.crawl {
        handle_crawl(&config).await?;
    } else {
        serve(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_crawler=info,warn"),
            1 => EnvFilter::new("shelf_crawler=debug,info"),
            2 => EnvFilter::new("shelf_crawler=trace,tower_http=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_store(config: &Config) -> Arc<dyn RecordStore> {
    Arc::new(CsvRecordStore::new(&config.output.csv_path))
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Shelf-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Retries: {} (backoff from {}ms)",
        config.crawler.max_retries, config.crawler.backoff_base_ms
    );
    println!(
        "  Politeness delay: {}ms",
        config.crawler.politeness_delay_ms
    );
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  CSV store: {}", config.output.csv_path);

    println!("\nServer:");
    println!("  Bind address: {}", config.server.bind_address);

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", config.crawler.start_url);
}

/// Handles the --stats mode: shows statistics from the record store
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use shelf_crawler::output::{load_statistics, print_statistics};

    println!("Record store: {}\n", config.output.csv_path);

    let store = open_store(config);
    let stats = load_statistics(store.as_ref())?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --crawl mode: one foreground crawl
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let run = shelf_crawler::crawler::crawl(config, open_store(config)).await?;

    println!("{}", run.message);
    if run.state == ScrapeState::Error {
        anyhow::bail!("crawl ended in error state");
    }
    Ok(())
}

/// Default mode: serve the REST API
async fn serve(config: Config) -> anyhow::Result<()> {
    let store = open_store(&config);
    let orchestrator = Orchestrator::new(&config, Arc::clone(&store))?;
    let app = router(AppState::new(orchestrator, store));

    let listener = tokio::net::TcpListener::bind(config.server.bind_address.as_str()).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
