//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest scraper.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use sumi_harvest::config::{load_config_with_hash, Config};
use sumi_harvest::output::{compute_statistics, print_statistics, render_json, render_text};
use sumi_harvest::url::load_url_list;
use sumi_harvest::{scrape_urls, ParserRegistry};
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: a concurrent, retrying page scraper
///
/// Fetches every URL concurrently, retries per domain policy, and parses
/// entity JSON pages and product HTML pages.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version)]
#[command(about = "A concurrent, retrying page scraper", long_about = None)]
struct Cli {
    /// Comma-separated list of URLs to scrape
    #[arg(short, long, value_delimiter = ',', required_unless_present = "file")]
    urls: Vec<String>,

    /// File containing one URL per line
    #[arg(short, long, value_name = "PATH", conflicts_with = "urls")]
    file: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let urls = match &cli.file {
        Some(path) => load_url_list(path)
            .with_context(|| format!("Failed to read URL list {}", path.display()))?,
        None => cli
            .urls
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect(),
    };

    if urls.is_empty() {
        bail!("Require a URL list file or at least one URL");
    }

    tracing::info!(
        "Scraping {} URLs ({} domain overrides)",
        urls.len(),
        config.domains.len()
    );

    let parsers = ParserRegistry::standard();
    let results = scrape_urls(&config, &urls, &parsers).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&render_json(&results)?)?);
    } else {
        println!("Scraped data");
        print!("{}", render_text(&results));
        if !cli.quiet {
            println!();
            print_statistics(&compute_statistics(&results));
        }
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
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}
