//! Retry policies
//!
//! A [`RetryPolicy`] decides which responses and transport failures are worth
//! another attempt, how many attempts are made in total, how long to wait
//! between them, and what happens once the attempts run out.

mod backoff;
mod policy;

use std::time::Duration;

pub use backoff::Backoff;
pub use policy::{DomainConfig, ExceededBehavior, FailurePredicate, ResponsePredicate, RetryPolicy};

/// Total attempts made by the default policy, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Fixed pause between attempts of the default policy
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);
