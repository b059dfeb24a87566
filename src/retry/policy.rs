use crate::crawler::{RawResponse, TransportError, TransportErrorKind};
use crate::retry::{Backoff, DEFAULT_MAX_ATTEMPTS};
use crate::ConfigError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Decides whether a completed response should be retried
pub type ResponsePredicate = Arc<dyn Fn(&RawResponse) -> bool + Send + Sync>;

/// Decides whether a transport failure should be retried
pub type FailurePredicate = Arc<dyn Fn(&TransportError) -> bool + Send + Sync>;

/// What to do when every attempt returned a retryable response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExceededBehavior {
    /// Fail with the last status code
    #[default]
    FailWithError,

    /// Hand the last response back as a success
    ReturnLastResponse,
}

/// Immutable retry configuration shared by every request of a domain
///
/// `max_attempts` counts every attempt including the first one, so a policy
/// with `max_attempts == 1` never retries.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
    retry_on_response: ResponsePredicate,
    retry_on_failure: FailurePredicate,
    exceeded_behavior: ExceededBehavior,
    deadline: Option<Duration>,
}

impl RetryPolicy {
    /// Creates a policy with the default predicates
    ///
    /// Responses with a status of 500 or above are retried, as are timeouts,
    /// connection failures and interrupted bodies. Exhaustion fails with an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if `max_attempts` is zero.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Result<Self, ConfigError> {
        if max_attempts < 1 {
            return Err(ConfigError::Validation(format!(
                "max_attempts must be >= 1, got {}",
                max_attempts
            )));
        }

        Ok(Self {
            max_attempts,
            backoff,
            retry_on_response: Arc::new(is_server_error),
            retry_on_failure: Arc::new(is_transient),
            exceeded_behavior: ExceededBehavior::FailWithError,
            deadline: None,
        })
    }

    /// Same policy with a different response predicate
    pub fn with_retry_on_response<F>(self, predicate: F) -> Self
    where
        F: Fn(&RawResponse) -> bool + Send + Sync + 'static,
    {
        Self {
            retry_on_response: Arc::new(predicate),
            ..self
        }
    }

    /// Same policy with a different failure predicate
    pub fn with_retry_on_failure<F>(self, predicate: F) -> Self
    where
        F: Fn(&TransportError) -> bool + Send + Sync + 'static,
    {
        Self {
            retry_on_failure: Arc::new(predicate),
            ..self
        }
    }

    pub fn with_exceeded_behavior(self, exceeded_behavior: ExceededBehavior) -> Self {
        Self {
            exceeded_behavior,
            ..self
        }
    }

    /// Same policy with an overall deadline covering every attempt and delay
    pub fn with_deadline(self, deadline: Option<Duration>) -> Self {
        Self { deadline, ..self }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    pub fn exceeded_behavior(&self) -> ExceededBehavior {
        self.exceeded_behavior
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn should_retry_response(&self, response: &RawResponse) -> bool {
        (self.retry_on_response)(response)
    }

    pub fn should_retry_failure(&self, error: &TransportError) -> bool {
        (self.retry_on_failure)(error)
    }

    /// Delay before retry number `retry` (1 = first retry)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff.delay_for(retry)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
            retry_on_response: Arc::new(is_server_error),
            retry_on_failure: Arc::new(is_transient),
            exceeded_behavior: ExceededBehavior::FailWithError,
            deadline: None,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("exceeded_behavior", &self.exceeded_behavior)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Retry policy bound to one domain
#[derive(Debug, Clone)]
pub struct DomainConfig {
    /// Exact hostname, lowercase
    pub domain: String,
    pub policy: RetryPolicy,
}

impl DomainConfig {
    pub fn new(domain: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            domain: domain.into().to_lowercase(),
            policy,
        }
    }
}

fn is_server_error(response: &RawResponse) -> bool {
    response.status >= 500
}

fn is_transient(error: &TransportError) -> bool {
    matches!(
        error.kind(),
        TransportErrorKind::Timeout | TransportErrorKind::Connect | TransportErrorKind::Body
    )
}
