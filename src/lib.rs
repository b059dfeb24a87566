//! Sumi-Harvest: a concurrent, retrying page scraper
//!
//! This crate fetches a batch of URLs concurrently, retries each request
//! according to a per-domain retry policy, parses every response with a
//! URL-specific parser, and returns one outcome per URL. A failure for one
//! URL never affects the others.

pub mod config;
pub mod crawler;
pub mod output;
pub mod parser;
pub mod retry;
pub mod url;

use crate::crawler::TransportError;
use crate::parser::ParseError;
use std::time::Duration;
use thiserror::Error;

/// Main error type for whole-batch operations
///
/// These errors abort a dispatch call. Per-URL problems are reported as
/// [`FetchError`] inside the result mapping instead.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("No parser found for handling: {url}")]
    NoParser { url: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Classifies the error; caller mistakes are reported as [`ErrorKind::Input`]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UrlError(_) | Self::NoParser { .. } => ErrorKind::Input,
            Self::Reqwest(_) => ErrorKind::Transport,
            Self::Config(_) | Self::Io(_) => ErrorKind::Input,
        }
    }
}

/// Per-URL failure carried in an [`Outcome`]
#[derive(Debug, Error)]
pub enum FetchError {
    /// A transport failure the policy declined to retry
    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: TransportError },

    /// Every attempt returned a retryable response
    #[error("Retries exceeded for {url} after {attempts} attempts: status-code={status}")]
    ResponseRejected {
        url: String,
        attempts: u32,
        status: u16,
    },

    /// Every attempt ended in a retryable transport failure
    #[error("Retries exceeded for {url} after {attempts} attempts: {source}")]
    RetriesExceeded {
        url: String,
        attempts: u32,
        source: TransportError,
    },

    #[error("Deadline of {deadline:?} exceeded for {url}")]
    DeadlineExceeded { url: String, deadline: Duration },

    #[error("Parse error for {url}: {source}")]
    Parse { url: String, source: ParseError },

    /// The task fetching this URL panicked outside its parser or was aborted
    #[error("Task for {url} did not complete: {message}")]
    TaskFailed { url: String, message: String },
}

impl FetchError {
    /// The URL this failure belongs to
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. }
            | Self::ResponseRejected { url, .. }
            | Self::RetriesExceeded { url, .. }
            | Self::DeadlineExceeded { url, .. }
            | Self::Parse { url, .. }
            | Self::TaskFailed { url, .. } => url,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } | Self::TaskFailed { .. } => ErrorKind::Transport,
            Self::ResponseRejected { .. } => ErrorKind::ResponseRejected,
            Self::RetriesExceeded { .. } => ErrorKind::RetriesExceeded,
            Self::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            Self::Parse { .. } => ErrorKind::Parse,
        }
    }
}

/// Coarse error classification used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// Malformed URL or no parser; fails the whole batch
    Input,
    /// Terminal transport failure
    Transport,
    /// Retries exhausted on an unsatisfactory response
    ResponseRejected,
    /// Response received but could not be parsed
    Parse,
    /// Retries exhausted on transport failures
    RetriesExceeded,
    /// Per-URL deadline elapsed
    DeadlineExceeded,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Transport => "transport",
            Self::ResponseRejected => "response-rejected",
            Self::Parse => "parse",
            Self::RetriesExceeded => "retries-exceeded",
            Self::DeadlineExceeded => "deadline-exceeded",
        }
    }
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

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL '{url}': {message}")]
    Parse { url: String, message: String },

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL: {0}")]
    MissingDomain(String),
}

/// Result type alias for batch operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// The per-URL result: a parsed entity or the reason there is none
pub type Outcome<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::crawler::{scrape_urls, RetryingExecutor, ScrapeWorker, WorkerFactory};
pub use crate::parser::{EntityWithTitle, ParserRegistry, ResponseParser};
pub use crate::retry::{Backoff, DomainConfig, ExceededBehavior, RetryPolicy};
pub use crate::url::extract_domain;
