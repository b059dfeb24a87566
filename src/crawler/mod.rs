//! Crawler module for concurrent fetching and parsing
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching through a shared client
//! - Retrying execution of single requests
//! - Per-domain workers that fetch and parse their URLs concurrently
//! - Dispatch of a URL batch across workers and merging of the results

mod coordinator;
mod executor;
mod fetcher;
mod worker;

pub use coordinator::WorkerFactory;
pub use executor::RetryingExecutor;
pub use fetcher::{
    build_http_client, HttpTransport, RawResponse, Request, Transport, TransportError,
    TransportErrorKind,
};
pub use worker::ScrapeWorker;

use crate::config::Config;
use crate::parser::ParserRegistry;
use crate::{Outcome, ScrapeError};
use std::collections::HashMap;
use std::sync::Arc;

/// Scrapes a batch of URLs with the given configuration
///
/// This is the main entry point for a batch. It will:
/// 1. Build the shared HTTP client
/// 2. Build the default and per-domain retry policies
/// 3. Register every URL with its domain's worker
/// 4. Fetch and parse all URLs concurrently
///
/// # Arguments
///
/// * `config` - The scraper configuration
/// * `urls` - The URLs to scrape
/// * `parsers` - Parsers to choose from, in priority order
///
/// # Returns
///
/// * `Ok(HashMap)` - One outcome per distinct URL
/// * `Err(ScrapeError)` - The batch could not be started
pub async fn scrape_urls<E, S>(
    config: &Config,
    urls: &[S],
    parsers: &ParserRegistry<E>,
) -> Result<HashMap<String, Outcome<E>>, ScrapeError>
where
    E: Send + 'static,
    S: AsRef<str>,
{
    let transport = Arc::new(HttpTransport::from_config(&config.client)?);
    let factory = WorkerFactory::new(
        transport,
        config.default_policy()?,
        config.domain_configs()?,
    );

    factory.dispatch(urls, parsers).await
}
