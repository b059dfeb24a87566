//! Retrying request executor
//!
//! Runs one request under a [`RetryPolicy`]. Every invocation owns its own
//! attempt counter; attempts are strictly sequential and the pause between
//! them is a timer, so no thread is blocked while waiting.
//!
//! # Attempt Flow
//!
//! | Attempt result | Predicate | Attempts left | Outcome |
//! |----------------|-----------|---------------|---------|
//! | Response | no retry | - | `Ok(response)` |
//! | Response | retry | yes | wait, next attempt |
//! | Response | retry | no | `ResponseRejected` or `Ok(last response)` |
//! | Transport failure | no retry | - | `Transport` |
//! | Transport failure | retry | yes | wait, next attempt |
//! | Transport failure | retry | no | `RetriesExceeded` |

use crate::crawler::fetcher::{RawResponse, Request, Transport, TransportError};
use crate::retry::{ExceededBehavior, RetryPolicy};
use crate::FetchError;
use std::sync::Arc;

/// Attempts made by one invocation
#[derive(Debug, Default)]
struct AttemptState {
    made: u32,
}

impl AttemptState {
    /// Counts a new attempt and returns its number (1-based)
    fn begin(&mut self) -> u32 {
        self.made += 1;
        self.made
    }

    fn remaining(&self, max_attempts: u32) -> bool {
        self.made < max_attempts
    }
}

/// What a single attempt decided
enum Step {
    Done(Result<RawResponse, FetchError>),
    Retry,
}

/// Executes requests with retries under one shared policy
#[derive(Clone)]
pub struct RetryingExecutor {
    transport: Arc<dyn Transport>,
    policy: Arc<RetryPolicy>,
}

impl RetryingExecutor {
    pub fn new(transport: Arc<dyn Transport>, policy: Arc<RetryPolicy>) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Executes the request, retrying as the policy allows
    ///
    /// If the policy has a deadline, it bounds the whole invocation; the
    /// in-flight attempt is dropped when it expires.
    pub async fn execute(&self, request: &Request) -> Result<RawResponse, FetchError> {
        match self.policy.deadline() {
            Some(deadline) => tokio::time::timeout(deadline, self.run_attempts(request))
                .await
                .unwrap_or_else(|_| {
                    tracing::debug!(url = %request.url(), ?deadline, "Deadline exceeded");
                    Err(FetchError::DeadlineExceeded {
                        url: request.url().to_string(),
                        deadline,
                    })
                }),
            None => self.run_attempts(request).await,
        }
    }

    async fn run_attempts(&self, request: &Request) -> Result<RawResponse, FetchError> {
        let mut state = AttemptState::default();

        loop {
            let attempt = state.begin();
            tracing::trace!(url = %request.url(), attempt, "Sending request");

            let step = match self.transport.send(request).await {
                Ok(response) => self.on_response(request, &state, response),
                Err(error) => self.on_failure(request, &state, error),
            };

            match step {
                Step::Done(result) => return result,
                Step::Retry => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        url = %request.url(),
                        attempt = attempt + 1,
                        max_attempts = self.policy.max_attempts(),
                        ?delay,
                        "Retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn on_response(&self, request: &Request, state: &AttemptState, response: RawResponse) -> Step {
        if !self.policy.should_retry_response(&response) {
            return Step::Done(Ok(response));
        }

        if state.remaining(self.policy.max_attempts()) {
            return Step::Retry;
        }

        match self.policy.exceeded_behavior() {
            ExceededBehavior::ReturnLastResponse => {
                tracing::debug!(
                    url = %request.url(),
                    status = response.status,
                    "Retries exceeded, returning last response"
                );
                Step::Done(Ok(response))
            }
            ExceededBehavior::FailWithError => {
                tracing::debug!(
                    url = %request.url(),
                    status = response.status,
                    "Retries exceeded"
                );
                Step::Done(Err(FetchError::ResponseRejected {
                    url: request.url().to_string(),
                    attempts: state.made,
                    status: response.status,
                }))
            }
        }
    }

    fn on_failure(&self, request: &Request, state: &AttemptState, error: TransportError) -> Step {
        // A declined failure ends the invocation even with attempts left
        if !self.policy.should_retry_failure(&error) {
            tracing::debug!(url = %request.url(), %error, "Transport failure not retried");
            return Step::Done(Err(FetchError::Transport {
                url: request.url().to_string(),
                source: error,
            }));
        }

        if state.remaining(self.policy.max_attempts()) {
            return Step::Retry;
        }

        tracing::debug!(url = %request.url(), %error, "Retries exceeded on transport failure");
        Step::Done(Err(FetchError::RetriesExceeded {
            url: request.url().to_string(),
            attempts: state.made,
            source: error,
        }))
    }
}
