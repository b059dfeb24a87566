//! Per-domain scrape worker
//!
//! A worker collects `(url, parser)` registrations and, once `scrape` is
//! called, runs one fetch-and-parse task per registration on the tokio
//! runtime. It waits for every task to settle; a failed task only affects
//! its own entry in the result.

use crate::crawler::executor::RetryingExecutor;
use crate::crawler::fetcher::Request;
use crate::parser::{ParseError, ParseInput, ResponseParser};
use crate::{FetchError, Outcome};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use url::Url;

/// A URL waiting to be scraped
struct Registration<E> {
    url: Url,
    parser: Arc<dyn ResponseParser<E>>,
}

/// Fetches and parses every URL registered for one domain
pub struct ScrapeWorker<E> {
    domain: String,
    executor: RetryingExecutor,
    registrations: HashMap<String, Registration<E>>,
}

impl<E: Send + 'static> ScrapeWorker<E> {
    pub fn new(domain: impl Into<String>, executor: RetryingExecutor) -> Self {
        Self {
            domain: domain.into(),
            executor,
            registrations: HashMap::new(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Number of distinct URLs registered
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Registers a URL with the parser that will handle its response
    ///
    /// `key` is the URL exactly as the caller supplied it and becomes the key
    /// in the result mapping. Registering the same key twice keeps the last
    /// parser.
    pub fn accept(&mut self, key: impl Into<String>, url: Url, parser: Arc<dyn ResponseParser<E>>) {
        self.registrations
            .insert(key.into(), Registration { url, parser });
    }

    /// Scrapes every registered URL concurrently
    ///
    /// Completes once every task has settled. The mapping has one entry per
    /// registered URL.
    pub async fn scrape(self) -> HashMap<String, Outcome<E>> {
        tracing::debug!(
            domain = %self.domain,
            urls = self.registrations.len(),
            max_attempts = self.executor.policy().max_attempts(),
            "Worker starting"
        );

        let (keys, handles): (Vec<_>, Vec<_>) = self
            .registrations
            .into_iter()
            .map(|(key, registration)| {
                let executor = self.executor.clone();
                let handle = tokio::spawn(scrape_one(executor, registration));
                (key, handle)
            })
            .unzip();

        let settled = futures::future::join_all(handles).await;

        let results: HashMap<String, Outcome<E>> = keys
            .into_iter()
            .zip(settled)
            .map(|(key, joined)| {
                let outcome = joined.unwrap_or_else(|e| {
                    tracing::error!(url = %key, "Scrape task failed: {}", e);
                    Err(FetchError::TaskFailed {
                        url: key.clone(),
                        message: e.to_string(),
                    })
                });
                (key, outcome)
            })
            .collect();

        let failures = results.values().filter(|r| r.is_err()).count();
        tracing::debug!(
            domain = %self.domain,
            succeeded = results.len() - failures,
            failed = failures,
            "Worker finished"
        );

        results
    }
}

/// Fetches one URL and runs its parser on a successful response
async fn scrape_one<E>(executor: RetryingExecutor, registration: Registration<E>) -> Outcome<E> {
    let Registration { url, parser } = registration;
    let request = Request::get(url);

    let response = executor.execute(&request).await?;

    let parsed = ParseInput::from_response(request.url(), &response)
        .and_then(|input| parse_guarded(parser.as_ref(), &input))
        .map_err(|source| FetchError::Parse {
            url: request.url().to_string(),
            source,
        });

    if let Err(e) = &parsed {
        tracing::warn!(parser = parser.name(), "{}", e);
    }

    parsed
}

/// Runs the parser, turning a panic into a parse error for this URL only
fn parse_guarded<E>(parser: &dyn ResponseParser<E>, input: &ParseInput) -> Result<E, ParseError> {
    panic::catch_unwind(AssertUnwindSafe(|| parser.parse(input))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());

        Err(ParseError::Panicked {
            parser: parser.name(),
            message,
        })
    })
}
