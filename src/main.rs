//! sitesearch main entry point
//!
//! This is the command-line interface for the sitesearch engine.

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use sitesearch::config::{load_config_with_hash, Config};
use sitesearch::output::print_statistics;
use sitesearch::service::SearchResponse;
use sitesearch::{IndexingService, ServiceResponse, SiteStatus};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// sitesearch: a search engine over a configured list of websites
///
/// By default every configured site is crawled, lemmatized and indexed. Ctrl-C
/// stops the running jobs; their sites are marked as failed.
#[derive(Parser, Debug)]
#[command(name = "sitesearch")]
#[command(version)]
#[command(about = "Crawl, index and search a fixed list of websites", long_about = None)]
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

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "index_page", "search"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["index_page", "search"])]
    stats: bool,

    /// Fetch and index a single page of a configured site
    #[arg(long, value_name = "URL", conflicts_with = "search")]
    index_page: Option<String>,

    /// Run a search query against the index
    #[arg(long, value_name = "QUERY")]
    search: Option<String>,

    /// Restrict the search to one site (root URL)
    #[arg(long, value_name = "URL", requires = "search")]
    site: Option<String>,

    /// Number of results to skip
    #[arg(long, default_value_t = 0, requires = "search")]
    offset: usize,

    /// Maximum number of results (defaults to the configured limit)
    #[arg(long, requires = "search")]
    limit: Option<usize>,

    /// Print responses as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let service = Arc::new(IndexingService::from_config(config)?);

    if cli.stats {
        handle_stats(&service, cli.json)
    } else if let Some(url) = &cli.index_page {
        handle_index_page(&service, url, cli.json).await
    } else if let Some(query) = &cli.search {
        handle_search(&service, query, &cli, cli.json)
    } else {
        handle_indexing(&service, cli.json).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitesearch=info,warn"),
            1 => EnvFilter::new("sitesearch=debug,info"),
            2 => EnvFilter::new("sitesearch=trace,debug"),
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

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_response(response: &ServiceResponse, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(response);
    }
    match &response.error {
        None => println!("OK"),
        Some(error) => println!("Error: {}", error),
    }
    Ok(())
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== sitesearch Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent pages: {}",
        config.crawler.max_concurrent_pages_open
    );
    println!(
        "  Delay between requests: {}-{}ms",
        config.crawler.min_delay_ms, config.crawler.max_delay_ms
    );
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );

    println!("\nUser Agent:");
    println!("  Agent: {}", config.user_agent.agent);
    println!("  Referrer: {}", config.user_agent.referrer);

    println!("\nIndexing:");
    println!(
        "  Valid status codes: {:?}",
        config.indexing.valid_status_codes
    );
    println!(
        "  Frequent lemma threshold: {}%",
        config.search.frequency_threshold_percent
    );
    match &config.morphology.dictionary_path {
        Some(path) => println!("  Morphology dictionary: {}", path),
        None => println!("  Morphology dictionary: none (stemmer only)"),
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        println!("  - {} ({})", site.name, site.url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(service: &IndexingService, json: bool) -> anyhow::Result<()> {
    let response = service.statistics()?;
    if json {
        return print_json(&response);
    }
    println!("Database: {}\n", service.config().output.database_path);
    print_statistics(&response.statistics);
    Ok(())
}

/// Handles the --index-page mode
async fn handle_index_page(service: &IndexingService, url: &str, json: bool) -> anyhow::Result<()> {
    let response = service.index_page(url).await;
    print_response(&response, json)?;
    if !response.result {
        bail!("Page was not indexed");
    }
    Ok(())
}

/// Handles the --search mode
fn handle_search(service: &IndexingService, query: &str, cli: &Cli, json: bool) -> anyhow::Result<()> {
    let response: SearchResponse =
        service.search(query, cli.site.as_deref(), cli.offset, cli.limit);
    if json {
        return print_json(&response);
    }

    if let Some(error) = &response.error {
        println!("Error: {}", error);
        return Ok(());
    }

    println!("Found {} pages\n", response.count);
    for (i, item) in response.data.iter().enumerate() {
        println!(
            "{}. {} [{:.3}]",
            cli.offset + i + 1,
            if item.title.is_empty() { &item.uri } else { &item.title },
            item.relevance
        );
        println!("   {}{} ({})", item.site, item.uri, item.site_name);
        println!("   {}\n", item.snippet);
    }
    Ok(())
}

/// Handles the main indexing operation
async fn handle_indexing(service: &Arc<IndexingService>, json: bool) -> anyhow::Result<()> {
    tracing::info!("Sites to index: {}", service.config().sites.len());

    let response = service.start_indexing();
    if !response.result {
        print_response(&response, json)?;
        bail!("Indexing did not start");
    }

    let watcher = {
        let service = Arc::clone(service);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping indexing");
                service.stop_indexing();
            }
        })
    };
    let statuses = service.wait_for_completion().await;
    watcher.abort();

    let failed = statuses
        .iter()
        .filter(|status| **status == SiteStatus::Failed)
        .count();
    tracing::info!(
        "Indexing finished: {} sites indexed, {} failed",
        statuses.len() - failed,
        failed
    );

    let stats = service.statistics()?;
    if json {
        print_json(&stats)
    } else {
        print_statistics(&stats.statistics);
        Ok(())
    }
}
