use serde::Deserialize;

/// Main configuration structure for Sumi-Harvest
///
/// Every section is optional; an empty file yields the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,

    /// Default retry policy for domains without their own entry
    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-domain retry overrides
    #[serde(default, rename = "domain")]
    pub domains: Vec<DomainRetryEntry>,
}

/// HTTP client configuration shared by every worker
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for establishing a connection (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Timeout for a single request, including the body (seconds)
    #[serde(rename = "request-timeout-secs", default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: None,
        }
    }
}

/// Delay growth between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
    Jittered,
}

/// Behavior once every attempt returned a retryable response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExceededBehaviorKind {
    #[default]
    Fail,
    ReturnLastResponse,
}

/// The default retry policy
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before a retry (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default)]
    pub backoff: BackoffKind,

    /// Upper bound for exponential and jittered delays (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(rename = "exceeded-behavior", default)]
    pub exceeded_behavior: ExceededBehaviorKind,

    /// Overall time budget for one URL across all attempts (seconds)
    #[serde(rename = "deadline-secs", default)]
    pub deadline_secs: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            backoff: BackoffKind::default(),
            max_delay_ms: default_max_delay_ms(),
            exceeded_behavior: ExceededBehaviorKind::default(),
            deadline_secs: None,
        }
    }
}

/// Retry overrides for a single domain
///
/// Fields left out inherit the value from the `[retry]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainRetryEntry {
    /// Exact hostname (e.g., "api.example.com")
    pub domain: String,

    #[serde(rename = "max-attempts", default)]
    pub max_attempts: Option<u32>,

    #[serde(rename = "retry-delay-ms", default)]
    pub retry_delay_ms: Option<u64>,

    #[serde(default)]
    pub backoff: Option<BackoffKind>,

    #[serde(rename = "max-delay-ms", default)]
    pub max_delay_ms: Option<u64>,

    #[serde(rename = "exceeded-behavior", default)]
    pub exceeded_behavior: Option<ExceededBehaviorKind>,

    #[serde(rename = "deadline-secs", default)]
    pub deadline_secs: Option<u64>,
}

impl DomainRetryEntry {
    /// Fills unspecified fields from the default retry section
    pub fn resolve(&self, defaults: &RetryConfig) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            retry_delay_ms: self.retry_delay_ms.unwrap_or(defaults.retry_delay_ms),
            backoff: self.backoff.unwrap_or(defaults.backoff),
            max_delay_ms: self.max_delay_ms.unwrap_or(defaults.max_delay_ms),
            exceeded_behavior: self.exceeded_behavior.unwrap_or(defaults.exceeded_behavior),
            deadline_secs: self.deadline_secs.or(defaults.deadline_secs),
        }
    }
}

fn default_user_agent() -> String {
    format!("sumi-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    crate::retry::DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    crate::retry::DEFAULT_RETRY_DELAY.as_millis() as u64
}

fn default_max_delay_ms() -> u64 {
    60_000
}
