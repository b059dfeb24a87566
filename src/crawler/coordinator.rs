//! Worker factory - per-domain dispatch and result merging
//!
//! URLs are partitioned by domain. Each domain gets exactly one
//! [`ScrapeWorker`] for the lifetime of a dispatch call, built with the
//! domain's own retry policy when one is configured and the default policy
//! otherwise. This keeps retry tuning and origin-specific failure bursts
//! confined to one worker.

use crate::crawler::executor::RetryingExecutor;
use crate::crawler::fetcher::Transport;
use crate::crawler::worker::ScrapeWorker;
use crate::parser::ParserRegistry;
use crate::retry::{DomainConfig, RetryPolicy};
use crate::url::parse_target;
use crate::{Outcome, ScrapeError};
use std::collections::HashMap;
use std::sync::Arc;

/// Creates workers per domain and fans a batch of URLs out to them
pub struct WorkerFactory<E> {
    transport: Arc<dyn Transport>,
    default_policy: Arc<RetryPolicy>,
    domain_policies: HashMap<String, Arc<RetryPolicy>>,
    workers: HashMap<String, ScrapeWorker<E>>,
}

impl<E: Send + 'static> WorkerFactory<E> {
    /// Creates a factory
    ///
    /// # Arguments
    ///
    /// * `transport` - Shared transport used by every worker
    /// * `default_policy` - Policy for domains without a [`DomainConfig`]
    /// * `domain_configs` - Per-domain policies, matched by exact hostname
    pub fn new(
        transport: Arc<dyn Transport>,
        default_policy: RetryPolicy,
        domain_configs: impl IntoIterator<Item = DomainConfig>,
    ) -> Self {
        let domain_policies = domain_configs
            .into_iter()
            .map(|config| (config.domain.to_lowercase(), Arc::new(config.policy)))
            .collect();

        Self {
            transport,
            default_policy: Arc::new(default_policy),
            domain_policies,
            workers: HashMap::new(),
        }
    }

    /// Returns the worker for `domain`, creating it on first use
    pub fn worker_for(&mut self, domain: &str) -> &mut ScrapeWorker<E> {
        let transport = &self.transport;
        let default_policy = &self.default_policy;
        let domain_policies = &self.domain_policies;

        self.workers.entry(domain.to_string()).or_insert_with(|| {
            let policy = match domain_policies.get(domain) {
                Some(policy) => {
                    tracing::info!(
                        domain,
                        max_attempts = policy.max_attempts(),
                        base_delay = ?policy.backoff().base(),
                        "Creating worker with domain policy"
                    );
                    Arc::clone(policy)
                }
                None => {
                    tracing::debug!(domain, "Creating worker with default policy");
                    Arc::clone(default_policy)
                }
            };
            ScrapeWorker::new(domain, RetryingExecutor::new(Arc::clone(transport), policy))
        })
    }

    /// Number of workers created so far
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Registers every URL, then scrapes all domains concurrently
    ///
    /// Registration happens before any request is sent. A URL that cannot be
    /// parsed or has no matching parser fails the whole call before any
    /// network traffic; per-URL runtime failures are returned in the mapping.
    ///
    /// # Returns
    ///
    /// * `Ok(HashMap)` - One outcome per distinct input URL, keyed by the input string
    /// * `Err(ScrapeError)` - A URL was malformed or no parser handles it
    pub async fn dispatch<S: AsRef<str>>(
        mut self,
        urls: &[S],
        parsers: &ParserRegistry<E>,
    ) -> Result<HashMap<String, Outcome<E>>, ScrapeError> {
        for raw in urls {
            let raw = raw.as_ref();
            let (url, domain) = parse_target(raw)?;
            let parser = parsers.find(&url).ok_or_else(|| ScrapeError::NoParser {
                url: raw.to_string(),
            })?;

            self.worker_for(&domain).accept(raw, url, parser);
        }

        tracing::info!(
            urls = urls.len(),
            domains = self.workers.len(),
            "Dispatching batch"
        );

        Ok(self.scrape_all().await)
    }

    /// Scrapes every worker concurrently and merges their results
    async fn scrape_all(self) -> HashMap<String, Outcome<E>> {
        let runs = self.workers.into_values().map(|worker| worker.scrape());
        let per_domain = futures::future::join_all(runs).await;

        // A URL belongs to exactly one domain, so keys never collide
        per_domain.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::executor::tests::{status, ScriptedTransport};
    use crate::crawler::fetcher::{RawResponse, Request, TransportError};
    use crate::parser::{ParseError, ParseInput, ResponseParser};
    use crate::retry::Backoff;
    use crate::ErrorKind;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use url::Url;

    struct EchoParser;

    impl ResponseParser<String> for EchoParser {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn can_handle(&self, url: &Url) -> bool {
            url.path().starts_with("/page")
        }

        fn parse(&self, input: &ParseInput) -> Result<String, ParseError> {
            Ok(input.body.clone())
        }
    }

    /// Records every requested URL; `down.test` always answers 500
    #[derive(Default)]
    struct RecordingTransport {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
            self.seen.lock().unwrap().push(request.url().to_string());
            if request.url().host_str() == Some("down.test") {
                status(500, "")
            } else {
                status(200, request.url().path())
            }
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Backoff::Fixed(Duration::from_millis(1))).unwrap()
    }

    fn registry() -> ParserRegistry<String> {
        ParserRegistry::new().register(EchoParser)
    }

    #[test]
    fn test_one_worker_per_domain() {
        let transport = Arc::new(ScriptedTransport::new(vec![status(200, "x")]));
        let mut factory: WorkerFactory<String> =
            WorkerFactory::new(transport, fast_policy(5), Vec::new());

        factory.worker_for("a.test");
        factory.worker_for("b.test");
        factory.worker_for("a.test");

        assert_eq!(factory.worker_count(), 2);
    }

    #[test]
    fn test_domain_policy_lookup() {
        let transport = Arc::new(ScriptedTransport::new(vec![status(200, "x")]));
        let configs = vec![DomainConfig::new("Tuned.test", fast_policy(3))];
        let mut factory: WorkerFactory<String> =
            WorkerFactory::new(transport, fast_policy(5), configs);

        assert_eq!(factory.domain_policies["tuned.test"].max_attempts(), 3);
        factory.worker_for("tuned.test");
        factory.worker_for("other.test");
        assert_eq!(factory.worker_count(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_merges_all_domains() {
        let transport = Arc::new(RecordingTransport::default());
        let configs = vec![DomainConfig::new("down.test", fast_policy(2))];
        let factory = WorkerFactory::new(transport.clone(), fast_policy(5), configs);

        let urls = [
            "https://up.test/page1",
            "https://up.test/page2",
            "https://other.test/page3",
            "https://down.test/page4",
        ];
        let results = factory.dispatch(&urls, &registry()).await.unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results["https://up.test/page1"].as_ref().unwrap(), "/page1");
        assert_eq!(results["https://other.test/page3"].as_ref().unwrap(), "/page3");

        let down = results["https://down.test/page4"].as_ref().unwrap_err();
        assert_eq!(down.kind(), ErrorKind::ResponseRejected);

        // Three successes plus two attempts for the down domain
        assert_eq!(transport.seen.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_no_parser_fails_before_any_request() {
        let transport = Arc::new(RecordingTransport::default());
        let factory = WorkerFactory::new(transport.clone(), fast_policy(5), Vec::new());

        let urls = ["https://up.test/page1", "https://up.test/unknown"];
        let result = factory.dispatch(&urls, &registry()).await;

        assert!(matches!(result, Err(ScrapeError::NoParser { ref url }) if url == "https://up.test/unknown"));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_url_fails_whole_dispatch() {
        let transport = Arc::new(RecordingTransport::default());
        let factory = WorkerFactory::new(transport.clone(), fast_policy(5), Vec::new());

        let urls = ["https://up.test/page1", "::not-a-url::"];
        let result = factory.dispatch(&urls, &registry()).await;

        assert!(matches!(result, Err(ScrapeError::UrlError(_))));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let transport = Arc::new(RecordingTransport::default());
        let factory = WorkerFactory::new(transport, fast_policy(5), Vec::new());

        let urls: [&str; 0] = [];
        let results = factory.dispatch(&urls, &registry()).await.unwrap();
        assert!(results.is_empty());
    }
}
